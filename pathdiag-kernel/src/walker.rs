/**
 * PATH WALKER - Parcours du chemin saut par saut, arrêt au premier échec
 *
 * ROLE : Vérifie les nodes dans l'ordre du chemin. Un échec au saut N rend
 * les sauts suivants inconnus : ils ne sont jamais sondés.
 *
 * ANNULATION : un `CancelSignal` externe interrompt la sonde en cours
 * (la session TCP est fermée avec le future abandonné) et le verdict
 * partiel est renvoyé.
 */

use crate::error::{DiagError, Result};
use crate::health::{NodeHealthChecker, NodeVerdict};
use crate::models::{Node, NodesMap};
use crate::transport::ConsoleTransport;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};

/// Triggers cancellation of a running walk.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Observed by the walker. A signal whose handle was dropped never fires.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    pub fn never() -> Self {
        let (_, signal) = cancel_pair();
        signal
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelSignal { rx })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HopReport {
    pub node: String,
    pub verdict: NodeVerdict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PathOutcome {
    Healthy,
    Failed { node: String, reason: String },
    /// `pending` is the hop whose check was interrupted, if any.
    Cancelled { pending: Option<String> },
}

/// Final output of a walk: every verdict computed, in path order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathVerdict {
    pub path: Vec<String>,
    pub hops: Vec<HopReport>,
    pub outcome: PathOutcome,
}

impl PathVerdict {
    pub fn is_healthy(&self) -> bool {
        self.outcome == PathOutcome::Healthy
    }

    pub fn failing_hop(&self) -> Option<&HopReport> {
        match &self.outcome {
            PathOutcome::Failed { .. } => self.hops.last(),
            _ => None,
        }
    }
}

pub struct PathWalker<T> {
    checker: NodeHealthChecker<T>,
}

impl<T: ConsoleTransport> PathWalker<T> {
    pub fn new(checker: NodeHealthChecker<T>) -> Self {
        Self { checker }
    }

    pub fn checker(&self) -> &NodeHealthChecker<T> {
        &self.checker
    }

    pub async fn walk(&self, path: &[String], nodes: &NodesMap, cancel: &CancelSignal) -> Result<PathVerdict> {
        let resolved = path
            .iter()
            .map(|name| nodes.get(name).ok_or_else(|| DiagError::UnknownNode(name.clone())))
            .collect::<Result<Vec<&Node>>>()?;

        info!("checking path: {}", path.join(" -> "));
        let mut hops = Vec::with_capacity(path.len());

        for node in resolved {
            if cancel.is_cancelled() {
                return Ok(cancelled(path, hops, &node.name));
            }

            let verdict = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(cancelled(path, hops, &node.name)),
                verdict = self.checker.check(node) => verdict,
            };

            let failed = !verdict.is_healthy();
            let reason = verdict.reason().to_string();
            hops.push(HopReport { node: node.name.clone(), verdict });

            if failed {
                warn!("failure at {}: {}", node.name, reason);
                return Ok(PathVerdict {
                    path: path.to_vec(),
                    hops,
                    outcome: PathOutcome::Failed { node: node.name.clone(), reason },
                });
            }
        }

        info!("path healthy end-to-end ({} hops)", hops.len());
        Ok(PathVerdict {
            path: path.to_vec(),
            hops,
            outcome: PathOutcome::Healthy,
        })
    }
}

fn cancelled(path: &[String], hops: Vec<HopReport>, pending: &str) -> PathVerdict {
    warn!("walk cancelled before {} finished", pending);
    PathVerdict {
        path: path.to_vec(),
        hops,
        outcome: PathOutcome::Cancelled { pending: Some(pending.to_string()) },
    }
}
