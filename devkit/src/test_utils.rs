/*!
Harness de test pour le diagnostic de chemins

- `TopologyBuilder` : inventaires en mémoire, sans console réelle
- `LabHarness` : un `MockConsoleServer` par node, inventaire pointant dessus
*/

use crate::console_stub::{ConsoleScript, MockConsoleServer};
use crate::fixtures::{ios_interface_brief, vpcs_show_ip};
use anyhow::Result;
use pathdiag_kernel::{ConsoleEndpoint, Inventory, Link, Node, NodeKind, PowerState};
use std::collections::HashMap;
use tokio::net::TcpListener;

/// Identifiant de node déterministe dérivé du nom
pub fn node_id(name: &str) -> String {
    format!("node-{name}")
}

/// Construction fluide d'un `Inventory`
#[derive(Debug, Default, Clone)]
pub struct TopologyBuilder {
    nodes: Vec<Node>,
    links: Vec<Link>,
}

impl TopologyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(mut self, name: &str, kind: NodeKind, console: Option<ConsoleEndpoint>) -> Self {
        self.nodes.push(Node {
            name: name.to_string(),
            id: node_id(name),
            kind,
            power: PowerState::Started,
            console,
        });
        self
    }

    pub fn end_host(self, name: &str, port: u16) -> Self {
        self.node(name, NodeKind::EndHost, Some(local(port)))
    }

    pub fn router(self, name: &str, port: u16) -> Self {
        self.node(name, NodeKind::Router, Some(local(port)))
    }

    /// Switch, cloud... : pas de console, pas de vérification IP
    pub fn other(self, name: &str, node_type: &str) -> Self {
        self.node(name, NodeKind::Other(node_type.to_string()), None)
    }

    pub fn power(mut self, name: &str, power: PowerState) -> Self {
        if let Some(node) = self.nodes.iter_mut().find(|n| n.name == name) {
            node.power = power;
        }
        self
    }

    pub fn link(mut self, a: &str, b: &str) -> Self {
        let id = format!("link-{}", self.links.len());
        self.links.push(Link { id, endpoints: vec![node_id(a), node_id(b)] });
        self
    }

    /// Link brut, endpoints donnés en node ids (permet les links malformés)
    pub fn raw_link(mut self, id: &str, endpoint_ids: &[&str]) -> Self {
        self.links.push(Link {
            id: id.to_string(),
            endpoints: endpoint_ids.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    pub fn build(self) -> Inventory {
        Inventory::new(self.nodes, self.links)
    }
}

fn local(port: u16) -> ConsoleEndpoint {
    ConsoleEndpoint { host: "127.0.0.1".into(), port }
}

/// Lab complet : chaque node sondable a sa console simulée
pub struct LabHarness {
    topology: TopologyBuilder,
    servers: HashMap<String, MockConsoleServer>,
}

impl LabHarness {
    pub fn new() -> Self {
        env_logger::try_init().ok(); // Init logging pour tests

        Self {
            topology: TopologyBuilder::new(),
            servers: HashMap::new(),
        }
    }

    /// Node avec console scriptée
    pub async fn console(&mut self, name: &str, kind: NodeKind, script: ConsoleScript) -> Result<&MockConsoleServer> {
        let server = MockConsoleServer::start(script).await?;
        self.topology = std::mem::take(&mut self.topology).node(name, kind, Some(server.endpoint()));
        self.servers.insert(name.to_string(), server);
        log::info!("🧪 lab node {} ready", name);
        Ok(&self.servers[name])
    }

    /// VPCS répondant à `show ip`
    pub async fn vpcs(&mut self, name: &str, ip_mask: &str, gateway: &str) -> Result<&MockConsoleServer> {
        let script = ConsoleScript::new(format!("{name}> "))
            .with_negotiation()
            .reply("show ip", vpcs_show_ip(name, ip_mask, gateway));
        self.console(name, NodeKind::EndHost, script).await
    }

    /// Routeur IOS répondant à `show ip interface brief`
    pub async fn router(&mut self, name: &str, interfaces: &[(&str, Option<&str>)]) -> Result<&MockConsoleServer> {
        let script = ConsoleScript::new(format!("{name}#"))
            .reply("show ip interface brief", ios_interface_brief(interfaces));
        self.console(name, NodeKind::Router, script).await
    }

    /// Node dont la console pointe sur un port fermé
    pub async fn unreachable(&mut self, name: &str, kind: NodeKind) -> Result<()> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();
        drop(listener);
        self.topology = std::mem::take(&mut self.topology).node(name, kind, Some(local(port)));
        Ok(())
    }

    pub fn other(&mut self, name: &str, node_type: &str) {
        self.topology = std::mem::take(&mut self.topology).other(name, node_type);
    }

    pub fn power(&mut self, name: &str, power: PowerState) {
        self.topology = std::mem::take(&mut self.topology).power(name, power);
    }

    pub fn link(&mut self, a: &str, b: &str) {
        self.topology = std::mem::take(&mut self.topology).link(a, b);
    }

    pub fn server(&self, name: &str) -> Option<&MockConsoleServer> {
        self.servers.get(name)
    }

    /// Nombre total de connexions reçues par toutes les consoles
    pub fn total_connections(&self) -> usize {
        self.servers.values().map(MockConsoleServer::connection_count).sum()
    }

    pub fn inventory(&self) -> Inventory {
        self.topology.clone().build()
    }
}

impl Default for LabHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topology_builder() {
        let inv = TopologyBuilder::new()
            .end_host("PC1", 5000)
            .router("R1", 5001)
            .other("SW1", "ethernet_switch")
            .power("R1", PowerState::Stopped)
            .link("PC1", "SW1")
            .link("SW1", "R1")
            .raw_link("broken", &["node-PC1"])
            .build();

        assert_eq!(inv.nodes.len(), 3);
        assert_eq!(inv.links.len(), 3);
        assert_eq!(inv.node("R1").unwrap().power, PowerState::Stopped);
        assert_eq!(inv.node("PC1").unwrap().id, "node-PC1");
        assert!(inv.node("SW1").unwrap().console.is_none());
    }

    #[tokio::test]
    async fn test_lab_harness_wires_consoles() {
        let mut lab = LabHarness::new();
        let port = lab.vpcs("PC1", "10.0.0.2/24", "10.0.0.1").await.unwrap().port();
        lab.unreachable("R1", NodeKind::Router).await.unwrap();
        lab.link("PC1", "R1");

        let inv = lab.inventory();
        assert_eq!(inv.node("PC1").unwrap().console.as_ref().unwrap().port, port);
        assert!(lab.server("R1").is_none());
        assert_eq!(lab.total_connections(), 0);
    }
}
