use petgraph::{
    graph::{NodeIndex, UnGraph},
    visit::{depth_first_search, Control, DfsEvent},
};

/// Every node reachable from `start`, in discovery order.
pub fn reachable_from<N, E>(graph: &UnGraph<N, E>, start: NodeIndex) -> Vec<NodeIndex> {
    let mut discovered = Vec::new();
    depth_first_search(graph, Some(start), |event| {
        if let DfsEvent::Discover(n, _) = event {
            discovered.push(n);
        }

        Control::<()>::Continue
    });

    discovered
}

/// True iff every node can reach every other. The empty graph counts as connected.
pub fn is_connected<N, E>(graph: &UnGraph<N, E>) -> bool {
    match graph.node_indices().next() {
        Some(start) => reachable_from(graph, start).len() == graph.node_count(),
        None => true,
    }
}

/// Assumes `graph` is a tree. The longest chain of nodes ending at `target`, starting from a leaf.
pub fn longest_path_to_point_in_tree<N, E>(
    graph: &UnGraph<N, E>,
    target: NodeIndex,
) -> Vec<NodeIndex> {
    let mut predecessors = vec![NodeIndex::end(); graph.node_count()];
    let mut depth = vec![0usize; graph.node_count()];
    depth_first_search(graph, Some(target), |event| {
        if let DfsEvent::TreeEdge(u, v) = event {
            predecessors[v.index()] = u;
            depth[v.index()] = depth[u.index()] + 1;
        }

        Control::<()>::Continue
    });

    let deepest = match graph
        .node_indices()
        .filter(|i| *i == target || predecessors[i.index()] != NodeIndex::end())
        .max_by_key(|i| (depth[i.index()], std::cmp::Reverse(i.index())))
    {
        Some(d) => d,
        None => return Vec::new(),
    };

    let mut path = vec![deepest];
    let mut next = deepest;
    while next != target {
        next = predecessors[next.index()];
        path.push(next);
    }

    path
}
