/// Term sampling for the SGD engine.
///
/// Each draw yields a pair of node indices that co-occur on a path plus
/// their distance along that path, or nothing when the draw is rejected.
/// Rejections (node-boundary hits, zero-span jump directions, zero term
/// distance) are a normal part of the sampling loop and are never counted
/// as updates.
use rand::distr::{Distribution, Uniform};
use rand::Rng;

use crate::error::{SortError, SortResult};
use crate::graph::BidirectedGraph;
use crate::interval::PathIntervalTree;
use crate::xp::PathIndex;
use crate::zipf::ZipfianInt;

/// The space the first endpoint is drawn from. Chosen at engine
/// construction and fixed for the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleSpace {
    /// Uniform over path nucleotides; long paths get more terms.
    Paths,
    /// Uniform over the flattened node-path incidence.
    Occurrences,
    /// Uniform over nodes, then uniform over the node's occurrences.
    Nodes,
}

impl SampleSpace {
    pub fn from_flags(sample_from_paths: bool, sample_from_nodes: bool) -> Self {
        if sample_from_nodes {
            SampleSpace::Nodes
        } else if sample_from_paths {
            SampleSpace::Paths
        } else {
            SampleSpace::Occurrences
        }
    }
}

/// A sampled term: two node indices and their target distance.
#[derive(Clone, Copy, Debug)]
pub struct Term {
    pub i: usize,
    pub j: usize,
    pub d_ij: f64,
}

pub struct TermSampler<'a> {
    graph: &'a BidirectedGraph,
    index: &'a PathIndex,
    tree: PathIntervalTree,
    space: SampleSpace,
    pos_dist: Uniform<u64>,
    zipf: ZipfianInt,
    num_nodes: u64,
}

impl<'a> TermSampler<'a> {
    pub fn new(
        graph: &'a BidirectedGraph,
        index: &'a PathIndex,
        use_paths: &[usize],
        space: SampleSpace,
        zipf_space: u64,
        theta: f64,
    ) -> SortResult<Self> {
        let mut tree = PathIntervalTree::new();
        let mut total_path_len = 0u64;
        for &path_id in use_paths {
            let path_len = index.path_length(path_id) as u64;
            tree.add(total_path_len, total_path_len + path_len, path_id);
            total_path_len += path_len;
        }
        tree.index();

        let pos_dist = match space {
            SampleSpace::Paths => Uniform::new(0, total_path_len),
            SampleSpace::Occurrences => Uniform::new(0, index.np_bv().len() as u64),
            SampleSpace::Nodes => Uniform::new_inclusive(1, graph.node_count() as u64),
        }
        .map_err(|_| SortError::InvalidParameter("sampling space is empty".to_string()))?;

        Ok(TermSampler {
            graph,
            index,
            tree,
            space,
            pos_dist,
            zipf: ZipfianInt::new(1, zipf_space, theta),
            num_nodes: graph.node_count() as u64,
        })
    }

    /// Draw one term. `Ok(None)` is a rejected draw; the caller simply
    /// tries again. `Err` means the path index is corrupt.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> SortResult<Option<Term>> {
        let pos = self.pos_dist.sample(rng);
        let (path_id, pos_in_path_a) = match self.space {
            SampleSpace::Paths => {
                let (path_start, path_id) = self
                    .tree
                    .find_containing(pos)
                    .ok_or(SortError::NoOverlappingIntervals(pos))?;
                (path_id, pos - path_start)
            }
            SampleSpace::Occurrences => {
                // boundary bit: the draw landed on a node, not a visit
                if self.index.np_bv()[pos as usize] {
                    return Ok(None);
                }
                let path_id = self.index.npi_iv()[pos as usize];
                let rank = self.index.nr_iv()[pos as usize] - 1;
                (path_id, self.index.position_of_step(path_id, rank) as u64)
            }
            SampleSpace::Nodes => {
                let node_entry = self.index.np_bv_select(pos);
                // the last node's occurrence run extends to the end of
                // the incidence vector; u == N is the only draw that can
                // refer to it
                let next_entry = if pos == self.num_nodes {
                    self.index.np_bv().len()
                } else {
                    self.index.np_bv_select(pos + 1)
                };
                let hit_num_paths = (next_entry - node_entry - 1) as u64;
                if hit_num_paths == 0 {
                    return Ok(None);
                }
                let occurrence = node_entry + rng.random_range(1..=hit_num_paths) as usize;
                let path_id = self.index.npi_iv()[occurrence];
                let rank = self.index.nr_iv()[occurrence] - 1;
                (path_id, self.index.position_of_step(path_id, rank) as u64)
            }
        };

        let path_len = (self.index.path_length(path_id) as u64).saturating_sub(1);
        let mut zipf_int = self.zipf.sample(rng);
        let pos_in_path_b = if rng.random::<bool>() {
            if zipf_int > pos_in_path_a {
                if pos_in_path_a == 0 {
                    return Ok(None);
                }
                zipf_int %= pos_in_path_a;
            }
            pos_in_path_a - zipf_int
        } else {
            if zipf_int > path_len - pos_in_path_a {
                if path_len - pos_in_path_a == 0 {
                    return Ok(None);
                }
                zipf_int %= path_len - pos_in_path_a;
            }
            pos_in_path_a + zipf_int
        };

        let rank_a = self.index.step_at_position(path_id, pos_in_path_a as usize);
        let rank_b = self.index.step_at_position(path_id, pos_in_path_b as usize);
        let term_i = self.index.handle_of_step(path_id, rank_a);
        let term_j = self.index.handle_of_step(path_id, rank_b);

        // snap both offsets to their step starts, then push a reverse
        // handle's offset to the far end of its node
        let mut pos_a = self.index.position_of_step(path_id, rank_a) as u64;
        let mut pos_b = self.index.position_of_step(path_id, rank_b) as u64;
        if term_i.is_reverse() {
            pos_a += self.graph.get_length(term_i) as u64;
        }
        if term_j.is_reverse() {
            pos_b += self.graph.get_length(term_j) as u64;
        }

        let d_ij = (pos_a as f64 - pos_b as f64).abs();
        if d_ij == 0.0 {
            return Ok(None);
        }
        Ok(Some(Term {
            i: term_i.node_index(),
            j: term_j.node_index(),
            d_ij,
        }))
    }
}
