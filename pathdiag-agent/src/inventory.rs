//! GNS3 inventory client
//!
//! Fetches the project, its nodes and its links from the GNS3 REST API (v2)
//! and converts them into a kernel `Inventory`.

use pathdiag_kernel::{ConsoleEndpoint, Inventory, Link, Node, NodeKind, PowerState};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Project \"{project}\" not found on server {server}")]
    ProjectNotFound { project: String, server: String },
    #[error("Invalid GNS3 server url: {0}")]
    Url(#[from] url::ParseError),
    #[error("GNS3 request failed: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, InventoryError>;

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectRecord {
    pub name: String,
    pub project_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeRecord {
    pub name: String,
    pub node_id: String,
    pub node_type: String,
    pub status: String,
    pub console: Option<u16>,
    pub console_host: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkRecord {
    pub link_id: String,
    #[serde(default)]
    pub nodes: Vec<LinkEndpoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkEndpoint {
    pub node_id: String,
}

pub struct Gns3Client {
    http: reqwest::Client,
    base: Url,
}

impl Gns3Client {
    /// Every request, body included, must complete within `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base_url)?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base.join(path)?;
        debug!("GET {}", url);
        let body = self
            .http
            .get(url)
            .header("User-Agent", "pathdiag")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(body)
    }

    pub async fn projects(&self) -> Result<Vec<ProjectRecord>> {
        self.get_json("/v2/projects").await
    }

    /// Match on project name first, then on project id.
    pub async fn find_project(&self, name_or_id: &str) -> Result<ProjectRecord> {
        self.projects()
            .await?
            .into_iter()
            .find(|p| p.name == name_or_id || p.project_id == name_or_id)
            .ok_or_else(|| InventoryError::ProjectNotFound {
                project: name_or_id.to_string(),
                server: self.base.to_string(),
            })
    }

    pub async fn fetch_inventory(&self, project_id: &str) -> Result<Inventory> {
        let nodes: Vec<NodeRecord> = self.get_json(&format!("/v2/projects/{project_id}/nodes")).await?;
        let links: Vec<LinkRecord> = self.get_json(&format!("/v2/projects/{project_id}/links")).await?;
        info!("project {}: {} nodes, {} links", project_id, nodes.len(), links.len());

        let server_host = self.base.host_str().unwrap_or("127.0.0.1");
        Ok(Inventory::new(
            nodes.into_iter().map(|n| into_node(n, server_host)),
            links.into_iter().map(into_link).collect(),
        ))
    }
}

/// A console bound on all interfaces is reached through the GNS3 server host.
fn console_host(raw: Option<&str>, server_host: &str) -> String {
    match raw {
        None | Some("") | Some("0.0.0.0") | Some("::") | Some("0:0:0:0:0:0:0:0") => server_host.to_string(),
        Some(host) => host.to_string(),
    }
}

pub fn into_node(record: NodeRecord, server_host: &str) -> Node {
    let console = record.console.map(|port| ConsoleEndpoint {
        host: console_host(record.console_host.as_deref(), server_host),
        port,
    });
    Node {
        kind: NodeKind::from_node_type(&record.node_type),
        power: PowerState::from_status(&record.status),
        name: record.name,
        id: record.node_id,
        console,
    }
}

pub fn into_link(record: LinkRecord) -> Link {
    Link {
        id: record.link_id,
        endpoints: record.nodes.into_iter().map(|n| n.node_id).collect(),
    }
}
