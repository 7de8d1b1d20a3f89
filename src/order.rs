/// Projection of a 1D layout onto a total node ordering.
///
/// Nodes are grouped by weakly connected component; components are
/// ranked by the average of their external node ids, and nodes within a
/// component follow their layout positions, with the handle integer as
/// the final tie-breaker.
use crate::graph::{BidirectedGraph, Handle};

/// Weakly connected components of the graph, edges taken without
/// orientation. Components are listed in order of their smallest dense
/// node index; isolated nodes form singleton components.
pub fn weakly_connected_components(graph: &BidirectedGraph) -> Vec<Vec<usize>> {
    let n = graph.node_count();
    let mut parent: Vec<usize> = (0..n).collect();

    fn find(parent: &mut Vec<usize>, mut v: usize) -> usize {
        while parent[v] != v {
            parent[v] = parent[parent[v]];
            v = parent[v];
        }
        v
    }

    for edge in &graph.edges {
        let a = find(&mut parent, edge.from.node_index());
        let b = find(&mut parent, edge.to.node_index());
        if a != b {
            parent[b] = a;
        }
    }

    let mut components: Vec<Vec<usize>> = Vec::new();
    let mut root_to_component = vec![usize::MAX; n];
    for v in 0..n {
        let root = find(&mut parent, v);
        if root_to_component[root] == usize::MAX {
            root_to_component[root] = components.len();
            components.push(Vec::new());
        }
        components[root_to_component[root]].push(v);
    }
    components
}

struct HandleLayout {
    component: u64,
    pos: f64,
    handle: Handle,
}

/// Project `layout` to a handle ordering. Components are sorted by
/// ascending average node id; ties within a component break on position,
/// then on the packed handle integer.
pub fn order_by_layout(graph: &BidirectedGraph, layout: &[f64]) -> Vec<Handle> {
    let components = weakly_connected_components(graph);

    let mut component_order: Vec<(f64, usize)> = components
        .iter()
        .enumerate()
        .map(|(i, component)| {
            let id_sum: u64 = component.iter().map(|&v| graph.node_id(v)).sum();
            (id_sum as f64 / component.len() as f64, i)
        })
        .collect();
    component_order.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mut component_rank = vec![0u64; components.len()];
    for (rank, &(_, component)) in component_order.iter().enumerate() {
        component_rank[component] = rank as u64;
    }
    let mut node_to_rank = vec![0u64; graph.node_count()];
    for (i, component) in components.iter().enumerate() {
        for &v in component {
            node_to_rank[v] = component_rank[i];
        }
    }

    let mut handle_layout: Vec<HandleLayout> = graph
        .handles()
        .map(|handle| HandleLayout {
            component: node_to_rank[handle.node_index()],
            pos: layout[handle.node_index()],
            handle,
        })
        .collect();
    handle_layout.sort_by(|a, b| {
        a.component
            .cmp(&b.component)
            .then(a.pos.total_cmp(&b.pos))
            .then(a.handle.as_integer().cmp(&b.handle.as_integer()))
    });
    handle_layout.into_iter().map(|hl| hl.handle).collect()
}
