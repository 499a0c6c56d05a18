use crate::error::Result;
use crate::models::Inventory;
use crate::path::shortest_path;
use crate::topology::build_graph;
use crate::transport::ConsoleTransport;
use crate::walker::{CancelSignal, PathVerdict, PathWalker};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Result of one diagnostic run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Diagnosis {
    /// Source and destination live in disconnected parts of the topology.
    NoPath { source: String, destination: String },
    Walked { verdict: PathVerdict },
}

impl Diagnosis {
    pub fn path(&self) -> Option<&[String]> {
        match self {
            Diagnosis::NoPath { .. } => None,
            Diagnosis::Walked { verdict } => Some(&verdict.path),
        }
    }
}

/// Graph build, path search and fail-fast walk, in that order.
pub struct Diagnostician<T> {
    walker: PathWalker<T>,
}

impl<T: ConsoleTransport> Diagnostician<T> {
    pub fn new(walker: PathWalker<T>) -> Self {
        Self { walker }
    }

    pub fn walker(&self) -> &PathWalker<T> {
        &self.walker
    }

    pub async fn diagnose(
        &self,
        inventory: &Inventory,
        source: &str,
        destination: &str,
        cancel: &CancelSignal,
    ) -> Result<Diagnosis> {
        let graph = build_graph(inventory)?;

        let Some(path) = shortest_path(&graph, source, destination)? else {
            warn!("no path found between {} and {}", source, destination);
            return Ok(Diagnosis::NoPath {
                source: source.to_string(),
                destination: destination.to_string(),
            });
        };
        info!("path found: {}", path.join(" -> "));

        let verdict = self.walker.walk(&path, &inventory.nodes, cancel).await?;
        Ok(Diagnosis::Walked { verdict })
    }
}
