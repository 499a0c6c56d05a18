/**
 * NODE HEALTH - Verdict de santé d'un node du chemin
 *
 * ROLE : Choisit la vérification selon le type de node (router, hôte VPCS,
 * autre), sonde la console et classe la réponse.
 *
 * Aucun état conservé entre deux appels : vérifier deux fois le même node
 * dans le même état donne le même verdict.
 */

use crate::models::{ConsoleEndpoint, Node, NodeKind};
use crate::parsers::{extract_host_ip_and_gateway, extract_router_ips};
use crate::transport::{ConsoleTransport, DEFAULT_SETTLE_DELAY};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::time::Duration;
use tracing::{debug, info};

pub const REASON_POWERED_OFF: &str = "node is powered off";
pub const REASON_UNREACHABLE: &str = "console unreachable";
pub const REASON_NO_IP: &str = "no IP configured";
pub const REASON_NO_GATEWAY: &str = "no gateway configured";
pub const NOTE_NOT_CHECKED: &str = "not checked: no IP semantics defined for this kind";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NodeVerdict {
    Healthy { note: Option<String> },
    ConfigurationError { reason: String },
    PoweredOff,
    Unreachable,
}

impl NodeVerdict {
    pub fn healthy() -> Self {
        NodeVerdict::Healthy { note: None }
    }

    pub fn misconfigured(reason: impl Into<String>) -> Self {
        NodeVerdict::ConfigurationError { reason: reason.into() }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, NodeVerdict::Healthy { .. })
    }

    /// Human-readable explanation, empty for a plain healthy node.
    pub fn reason(&self) -> &str {
        match self {
            NodeVerdict::Healthy { note } => note.as_deref().unwrap_or(""),
            NodeVerdict::ConfigurationError { reason } => reason,
            NodeVerdict::PoweredOff => REASON_POWERED_OFF,
            NodeVerdict::Unreachable => REASON_UNREACHABLE,
        }
    }
}

/// Console commands sent per node kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeCommands {
    pub end_host: String,
    pub router: String,
}

impl Default for ProbeCommands {
    fn default() -> Self {
        Self {
            end_host: "show ip".into(),
            router: "show ip interface brief".into(),
        }
    }
}

pub struct NodeHealthChecker<T> {
    transport: T,
    settle_delay: Duration,
    commands: ProbeCommands,
}

impl<T: ConsoleTransport> NodeHealthChecker<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            settle_delay: DEFAULT_SETTLE_DELAY,
            commands: ProbeCommands::default(),
        }
    }

    /// Wait after each line sent to a console. The connect timeout belongs to the transport.
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn with_commands(mut self, commands: ProbeCommands) -> Self {
        self.commands = commands;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn check(&self, node: &Node) -> NodeVerdict {
        let verdict = if !node.power.is_started() {
            NodeVerdict::PoweredOff
        } else {
            match &node.kind {
                NodeKind::EndHost => self.check_end_host(node).await,
                NodeKind::Router => self.check_router(node).await,
                NodeKind::Other(kind) => {
                    debug!("{}: kind {} has no IP checks", node.name, kind);
                    NodeVerdict::Healthy { note: Some(NOTE_NOT_CHECKED.into()) }
                }
            }
        };
        info!("{}: {:?}", node.name, verdict);
        verdict
    }

    async fn check_end_host(&self, node: &Node) -> NodeVerdict {
        let Some(text) = self.probe(node, &self.commands.end_host).await else {
            return NodeVerdict::Unreachable;
        };
        match extract_host_ip_and_gateway(&text) {
            (ip, _) if !is_assigned(ip) => NodeVerdict::misconfigured(REASON_NO_IP),
            (_, gateway) if !is_assigned(gateway) => NodeVerdict::misconfigured(REASON_NO_GATEWAY),
            _ => NodeVerdict::healthy(),
        }
    }

    async fn check_router(&self, node: &Node) -> NodeVerdict {
        let Some(text) = self.probe(node, &self.commands.router).await else {
            return NodeVerdict::Unreachable;
        };
        let ips = extract_router_ips(&text);
        if ips.is_empty() {
            return NodeVerdict::misconfigured(REASON_NO_IP);
        }
        debug!("{}: interfaces {:?}", node.name, ips);
        NodeVerdict::healthy()
    }

    /// Captured text, or `None` when the console could not be reached.
    async fn probe(&self, node: &Node, command: &str) -> Option<String> {
        let Some(ConsoleEndpoint { host, port }) = &node.console else {
            debug!("{}: no console endpoint published", node.name);
            return None;
        };
        let result = self
            .transport
            .probe(host, *port, command, self.settle_delay)
            .await;
        result.success.then_some(result.text)
    }
}

fn is_assigned(addr: Option<Ipv4Addr>) -> bool {
    matches!(addr, Some(ip) if !ip.is_unspecified())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PowerState;
    use crate::transport::ProbeResult;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Answers every probe with the same canned result, counts calls and keeps the last settle.
    struct Canned {
        result: ProbeResult,
        calls: AtomicUsize,
        last_settle: Mutex<Option<Duration>>,
    }

    impl Canned {
        fn new(result: ProbeResult) -> Self {
            Self { result, calls: AtomicUsize::new(0), last_settle: Mutex::new(None) }
        }
    }

    #[async_trait]
    impl ConsoleTransport for Canned {
        async fn probe(&self, _host: &str, _port: u16, _command: &str, settle: Duration) -> ProbeResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_settle.lock().unwrap() = Some(settle);
            self.result.clone()
        }
    }

    fn node(kind: NodeKind, power: PowerState) -> Node {
        Node {
            name: "N1".into(),
            id: "n1".into(),
            kind,
            power,
            console: Some(ConsoleEndpoint { host: "127.0.0.1".into(), port: 5000 }),
        }
    }

    async fn verdict(kind: NodeKind, answer: ProbeResult) -> NodeVerdict {
        NodeHealthChecker::new(Canned::new(answer))
            .check(&node(kind, PowerState::Started))
            .await
    }

    #[tokio::test]
    async fn test_powered_off_never_probes() {
        for kind in [NodeKind::Router, NodeKind::EndHost, NodeKind::Other("cloud".into())] {
            for power in [PowerState::Stopped, PowerState::Suspended] {
                let checker = NodeHealthChecker::new(Canned::new(ProbeResult::ok("10.0.0.1")));
                assert_eq!(checker.check(&node(kind.clone(), power)).await, NodeVerdict::PoweredOff);
                assert_eq!(checker.transport().calls.load(Ordering::SeqCst), 0);
            }
        }
    }

    #[tokio::test]
    async fn test_end_host_classification() {
        let ok = "IP/MASK : 10.0.0.5/24\nGATEWAY : 10.0.0.1\n";
        let no_ip = "IP/MASK : 0.0.0.0/0\nGATEWAY : 0.0.0.0\n";
        let no_gw = "IP/MASK : 10.0.0.5/24\nGATEWAY : 0.0.0.0\n";
        let missing_gw = "IP/MASK : 10.0.0.5/24\n";

        assert_eq!(verdict(NodeKind::EndHost, ProbeResult::ok(ok)).await, NodeVerdict::healthy());
        assert_eq!(verdict(NodeKind::EndHost, ProbeResult::ok(no_ip)).await, NodeVerdict::misconfigured(REASON_NO_IP));
        assert_eq!(verdict(NodeKind::EndHost, ProbeResult::ok(no_gw)).await, NodeVerdict::misconfigured(REASON_NO_GATEWAY));
        assert_eq!(verdict(NodeKind::EndHost, ProbeResult::ok(missing_gw)).await, NodeVerdict::misconfigured(REASON_NO_GATEWAY));
        assert_eq!(verdict(NodeKind::EndHost, ProbeResult::ok("")).await, NodeVerdict::misconfigured(REASON_NO_IP));
        assert_eq!(verdict(NodeKind::EndHost, ProbeResult::failed()).await, NodeVerdict::Unreachable);
    }

    #[tokio::test]
    async fn test_router_classification() {
        let brief = "FastEthernet0/0  192.168.1.1  YES NVRAM  up  up";
        let bare = "FastEthernet0/0  unassigned  YES NVRAM  administratively down  down";

        assert_eq!(verdict(NodeKind::Router, ProbeResult::ok(brief)).await, NodeVerdict::healthy());
        assert_eq!(verdict(NodeKind::Router, ProbeResult::ok(bare)).await, NodeVerdict::misconfigured(REASON_NO_IP));
        assert_eq!(verdict(NodeKind::Router, ProbeResult::failed()).await, NodeVerdict::Unreachable);
    }

    #[tokio::test]
    async fn test_other_kind_passes_without_probe() {
        let checker = NodeHealthChecker::new(Canned::new(ProbeResult::failed()));
        let v = checker
            .check(&node(NodeKind::Other("ethernet_switch".into()), PowerState::Started))
            .await;
        assert!(v.is_healthy());
        assert_eq!(v.reason(), NOTE_NOT_CHECKED);
        assert_eq!(checker.transport().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_console_is_unreachable() {
        let checker = NodeHealthChecker::new(Canned::new(ProbeResult::ok("10.0.0.1")));
        let mut n = node(NodeKind::Router, PowerState::Started);
        n.console = None;
        assert_eq!(checker.check(&n).await, NodeVerdict::Unreachable);
        assert_eq!(checker.transport().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_check_is_idempotent() {
        let checker = NodeHealthChecker::new(Canned::new(ProbeResult::ok("IP/MASK : 10.0.0.5/24")));
        let n = node(NodeKind::EndHost, PowerState::Started);
        let first = checker.check(&n).await;
        let second = checker.check(&n).await;
        assert_eq!(first, second);
        assert_eq!(checker.transport().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_settle_delay_reaches_transport() {
        let brief = "FastEthernet0/0  192.168.1.1  YES NVRAM  up  up";
        let checker = NodeHealthChecker::new(Canned::new(ProbeResult::ok(brief)));
        checker.check(&node(NodeKind::Router, PowerState::Started)).await;
        assert_eq!(*checker.transport().last_settle.lock().unwrap(), Some(DEFAULT_SETTLE_DELAY));

        let checker = NodeHealthChecker::new(Canned::new(ProbeResult::ok(brief)))
            .with_settle_delay(Duration::from_millis(40));
        checker.check(&node(NodeKind::Router, PowerState::Started)).await;
        assert_eq!(*checker.transport().last_settle.lock().unwrap(), Some(Duration::from_millis(40)));
    }

    #[test]
    fn test_verdict_serializes_with_status_tag() {
        let json = serde_json::to_value(NodeVerdict::misconfigured(REASON_NO_IP)).unwrap();
        assert_eq!(json["status"], "configuration_error");
        assert_eq!(json["reason"], REASON_NO_IP);
    }
}
