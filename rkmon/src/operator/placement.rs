/// Whether monitors must be spread one per node.
///
/// Anti-affinity is only enforced when there are enough distinct nodes for
/// every monitor; otherwise pods are allowed to share nodes so the quorum can
/// still form on small clusters.
pub fn decide(node_count: usize, mon_count: usize) -> bool {
    node_count >= mon_count
}
