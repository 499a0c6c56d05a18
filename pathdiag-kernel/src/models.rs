use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Telnet console of a node, as published by the GNS3 server.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ConsoleEndpoint {
    pub host: String,
    pub port: u16,
}

/// Device family, as far as IP checks are concerned.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// IOS-like device answering `show ip interface brief`
    Router,
    /// VPCS-like host answering `show ip`
    EndHost,
    /// Switches, clouds, NATs... carries the raw GNS3 node_type
    Other(String),
}

impl NodeKind {
    pub fn from_node_type(node_type: &str) -> Self {
        match node_type {
            "vpcs" => NodeKind::EndHost,
            "dynamips" | "iou" => NodeKind::Router,
            other => NodeKind::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    Started,
    Stopped,
    Suspended,
}

impl PowerState {
    /// Unknown status strings are treated as stopped.
    pub fn from_status(status: &str) -> Self {
        match status {
            "started" => PowerState::Started,
            "suspended" => PowerState::Suspended,
            _ => PowerState::Stopped,
        }
    }

    pub fn is_started(self) -> bool {
        matches!(self, PowerState::Started)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    pub id: String,
    pub kind: NodeKind,
    pub power: PowerState,
    pub console: Option<ConsoleEndpoint>,
}

/// Undirected link between node ids. Well-formed links have exactly two endpoints.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Link {
    pub id: String,
    pub endpoints: Vec<String>,
}

pub type NodesMap = HashMap<String, Node>;

/// Snapshot of one project: nodes keyed by name plus the raw link list.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Inventory {
    pub nodes: NodesMap,
    pub links: Vec<Link>,
}

impl Inventory {
    pub fn new(nodes: impl IntoIterator<Item = Node>, links: Vec<Link>) -> Self {
        let nodes = nodes.into_iter().map(|n| (n.name.clone(), n)).collect();
        Self { nodes, links }
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }
}
