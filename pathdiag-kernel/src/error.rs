/// Errors that abort a diagnostic run.
///
/// Device-level problems (unreachable console, missing IP...) are never errors:
/// they end up in a `NodeVerdict`.
#[derive(Debug, thiserror::Error)]
pub enum DiagError {
    #[error("link {link} references unknown node id {node_id}")]
    UnknownEndpoint { link: String, node_id: String },
    #[error("node not found in topology: {0}")]
    UnknownNode(String),
}

pub type Result<T> = std::result::Result<T, DiagError>;
