/**
 * TOPOLOGY - Graphe d'adjacence construit depuis l'inventaire du projet
 *
 * ROLE : Transforme la liste des nodes et des links en graphe non orienté,
 * simple (liens parallèles fusionnés) et symétrique.
 *
 * Un link avec un nombre d'extrémités différent de 2 est ignoré ;
 * un node_id introuvable est une incohérence d'inventaire et arrête tout.
 */

use crate::error::{DiagError, Result};
use crate::models::Inventory;
use std::collections::HashMap;
use tracing::{debug, info};

/// Adjacency keyed by node name. Neighbor lists keep link insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    adjacency: HashMap<String, Vec<String>>,
}

impl Graph {
    pub fn contains(&self, name: &str) -> bool {
        self.adjacency.contains_key(name)
    }

    pub fn neighbors(&self, name: &str) -> Option<&[String]> {
        self.adjacency.get(name).map(Vec::as_slice)
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum::<usize>() / 2
    }

    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.adjacency.keys().map(String::as_str)
    }

    fn add_node(&mut self, name: &str) {
        self.adjacency.entry(name.to_string()).or_default();
    }

    fn add_edge(&mut self, a: &str, b: &str) {
        if a == b {
            return;
        }
        for (from, to) in [(a, b), (b, a)] {
            let list = self.adjacency.entry(from.to_string()).or_default();
            if !list.iter().any(|n| n == to) {
                list.push(to.to_string());
            }
        }
    }
}

pub fn build_graph(inventory: &Inventory) -> Result<Graph> {
    let mut graph = Graph::default();
    for name in inventory.nodes.keys() {
        graph.add_node(name);
    }

    let by_id: HashMap<&str, &str> = inventory
        .nodes
        .values()
        .map(|n| (n.id.as_str(), n.name.as_str()))
        .collect();

    let mut skipped = 0usize;
    for link in &inventory.links {
        let [a, b] = link.endpoints.as_slice() else {
            debug!("skipping link {} with {} endpoints", link.id, link.endpoints.len());
            skipped += 1;
            continue;
        };
        let n1 = resolve(&by_id, &link.id, a)?;
        let n2 = resolve(&by_id, &link.id, b)?;
        graph.add_edge(n1, n2);
    }

    info!(
        "topology graph built: {} nodes, {} edges ({} malformed links skipped)",
        graph.node_count(),
        graph.edge_count(),
        skipped
    );
    Ok(graph)
}

fn resolve<'a>(by_id: &HashMap<&str, &'a str>, link: &str, node_id: &str) -> Result<&'a str> {
    by_id.get(node_id).copied().ok_or_else(|| DiagError::UnknownEndpoint {
        link: link.to_string(),
        node_id: node_id.to_string(),
    })
}
