/// Path index over a bidirected graph.
///
/// Exposes, per path, its nucleotide length and step lookups (handle of a
/// step, start offset of a step, step containing an offset), plus the
/// flattened node-path incidence used by the occurrence and node sampling
/// spaces: a bit vector `np_bv` marking node boundaries, the path id
/// `npi_iv` and 1-based step rank `nr_iv` at each non-boundary entry, and
/// 1-based select support over the boundary bits.
use crate::graph::{BidirectedGraph, Handle};

#[derive(Clone, Debug)]
struct PathRecord {
    first_step: usize,
    step_count: usize,
    /// Path length in nucleotides.
    length: usize,
}

#[derive(Clone, Debug)]
pub struct PathIndex {
    /// Handle of each step, flattened across paths.
    step_to_handle: Vec<Handle>,
    /// Start offset (in bp) of each step within its path.
    step_to_position: Vec<usize>,
    paths: Vec<PathRecord>,
    /// One true per node boundary, one false per path occurrence of the
    /// node, nodes in dense-index order.
    np_bv: Vec<bool>,
    /// Path id at each occurrence entry (zero at boundaries).
    npi_iv: Vec<usize>,
    /// 1-based step rank within the path at each occurrence entry.
    nr_iv: Vec<usize>,
    /// np_bv_select[k-1] is the position of the k-th set bit of np_bv.
    np_bv_select: Vec<usize>,
}

impl PathIndex {
    pub fn from_graph(graph: &BidirectedGraph) -> Self {
        let num_nodes = graph.node_count();
        let mut step_to_handle = Vec::new();
        let mut step_to_position = Vec::new();
        let mut paths = Vec::with_capacity(graph.paths.len());
        // occurrences[v] lists (path id, 1-based rank) per visit of node v
        let mut occurrences: Vec<Vec<(usize, usize)>> = vec![Vec::new(); num_nodes];

        for (path_id, path) in graph.paths.iter().enumerate() {
            let first_step = step_to_handle.len();
            let mut position = 0usize;
            for (rank, &handle) in path.steps.iter().enumerate() {
                step_to_handle.push(handle);
                step_to_position.push(position);
                position += graph.get_length(handle);
                occurrences[handle.node_index()].push((path_id, rank + 1));
            }
            paths.push(PathRecord {
                first_step,
                step_count: path.steps.len(),
                length: position,
            });
        }

        let total_entries = num_nodes + step_to_handle.len();
        let mut np_bv = Vec::with_capacity(total_entries);
        let mut npi_iv = Vec::with_capacity(total_entries);
        let mut nr_iv = Vec::with_capacity(total_entries);
        let mut np_bv_select = Vec::with_capacity(num_nodes);
        for node_occurrences in &occurrences {
            np_bv_select.push(np_bv.len());
            np_bv.push(true);
            npi_iv.push(0);
            nr_iv.push(0);
            for &(path_id, rank) in node_occurrences {
                np_bv.push(false);
                npi_iv.push(path_id);
                nr_iv.push(rank);
            }
        }

        log::debug!(
            "path index built: {} paths, {} steps, {} incidence entries",
            paths.len(),
            step_to_handle.len(),
            np_bv.len()
        );

        PathIndex {
            step_to_handle,
            step_to_position,
            paths,
            np_bv,
            npi_iv,
            nr_iv,
            np_bv_select,
        }
    }

    pub fn num_paths(&self) -> usize {
        self.paths.len()
    }

    pub fn path_length(&self, path_id: usize) -> usize {
        self.paths[path_id].length
    }

    pub fn path_step_count(&self, path_id: usize) -> usize {
        self.paths[path_id].step_count
    }

    pub fn handle_of_step(&self, path_id: usize, rank: usize) -> Handle {
        self.step_to_handle[self.paths[path_id].first_step + rank]
    }

    /// Start offset (in bp) of the step `(path_id, rank)` within its path.
    pub fn position_of_step(&self, path_id: usize, rank: usize) -> usize {
        self.step_to_position[self.paths[path_id].first_step + rank]
    }

    /// Rank of the step containing the path-local offset `pos`.
    /// `pos` must be below the path length.
    pub fn step_at_position(&self, path_id: usize, pos: usize) -> usize {
        let record = &self.paths[path_id];
        let positions =
            &self.step_to_position[record.first_step..record.first_step + record.step_count];
        positions.partition_point(|&start| start <= pos) - 1
    }

    pub fn np_bv(&self) -> &[bool] {
        &self.np_bv
    }

    pub fn npi_iv(&self) -> &[usize] {
        &self.npi_iv
    }

    pub fn nr_iv(&self) -> &[usize] {
        &self.nr_iv
    }

    /// Position of the k-th set bit of `np_bv`, k in [1, node count].
    pub fn np_bv_select(&self, k: u64) -> usize {
        self.np_bv_select[(k - 1) as usize]
    }
}
