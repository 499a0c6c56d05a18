use crate::error::{DiagError, Result};
use crate::topology::Graph;
use std::collections::{HashSet, VecDeque};
use tracing::debug;

/// Fewest-hops path from `source` to `destination`, both included.
///
/// Breadth-first, so the first time the goal is dequeued its path is minimal.
/// Returns `Ok(None)` when the two nodes are disconnected and an error when
/// either name is not part of the graph.
pub fn shortest_path(graph: &Graph, source: &str, destination: &str) -> Result<Option<Vec<String>>> {
    for name in [source, destination] {
        if !graph.contains(name) {
            return Err(DiagError::UnknownNode(name.to_string()));
        }
    }

    let mut visited: HashSet<&str> = HashSet::from([source]);
    let mut queue: VecDeque<(&str, Vec<String>)> = VecDeque::from([(source, vec![source.to_string()])]);

    while let Some((node, path)) = queue.pop_front() {
        if node == destination {
            debug!("path {} -> {} found with {} hops", source, destination, path.len());
            return Ok(Some(path));
        }

        for neighbor in graph.neighbors(node).unwrap_or_default() {
            if visited.insert(neighbor.as_str()) {
                let mut next = path.clone();
                next.push(neighbor.clone());
                queue.push_back((neighbor.as_str(), next));
            }
        }
    }

    debug!("no path between {} and {} ({} nodes explored)", source, destination, visited.len());
    Ok(None)
}
