/*!
Fixtures : sorties console réalistes et payloads de l'API GNS3 v2

Les sorties reproduisent le format de VPCS (`show ip`) et d'IOS
(`show ip interface brief`) tel qu'on le capture sur une console.
*/

use serde_json::{json, Value};

/// Sortie `show ip` d'un VPCS
pub fn vpcs_show_ip(name: &str, ip_mask: &str, gateway: &str) -> String {
    format!(
        "\nNAME        : {name}[1]\n\
         IP/MASK     : {ip_mask}\n\
         GATEWAY     : {gateway}\n\
         DNS         : \n\
         MAC         : 00:50:79:66:68:00\n\
         LPORT       : 20042\n\
         RHOST:PORT  : 127.0.0.1:20043\n\
         MTU         : 1500\n"
    )
}

/// VPCS fraîchement démarré, sans configuration
pub fn vpcs_unconfigured(name: &str) -> String {
    vpcs_show_ip(name, "0.0.0.0/0", "0.0.0.0")
}

/// Sortie `show ip interface brief` d'un routeur IOS.
/// `None` comme adresse donne une interface `unassigned`.
pub fn ios_interface_brief(interfaces: &[(&str, Option<&str>)]) -> String {
    let mut out = format!(
        "{:<27}{:<16}OK? Method Status                Protocol\n",
        "Interface", "IP-Address"
    );
    for (name, ip) in interfaces {
        let (addr, method, status) = match ip {
            Some(ip) => (*ip, "NVRAM ", "up                    up"),
            None => ("unassigned", "unset ", "administratively down down"),
        };
        out.push_str(&format!("{name:<27}{addr:<16}YES {method}{status}\n"));
    }
    out
}

/// Construction des réponses JSON de l'API GNS3 (`/v2/projects`, `/nodes`, `/links`)
pub struct Gns3PayloadBuilder;

impl Gns3PayloadBuilder {
    pub fn project(name: &str, project_id: &str) -> Value {
        json!({
            "name": name,
            "project_id": project_id,
            "status": "opened",
            "path": format!("/opt/gns3/projects/{project_id}"),
        })
    }

    pub fn node(name: &str, node_id: &str, node_type: &str, status: &str, console_host: &str, console: Option<u16>) -> Value {
        json!({
            "name": name,
            "node_id": node_id,
            "node_type": node_type,
            "status": status,
            "console_host": console_host,
            "console": console,
            "console_type": "telnet",
            "compute_id": "local",
        })
    }

    pub fn link(link_id: &str, node_ids: &[&str]) -> Value {
        let nodes: Vec<Value> = node_ids
            .iter()
            .enumerate()
            .map(|(i, id)| json!({ "node_id": id, "adapter_number": 0, "port_number": i }))
            .collect();
        json!({
            "link_id": link_id,
            "link_type": "ethernet",
            "nodes": nodes,
            "suspend": false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathdiag_kernel::parsers::{extract_host_ip_and_gateway, extract_router_ips};
    use std::net::Ipv4Addr;

    #[test]
    fn test_vpcs_fixture_parses() {
        let (ip, gw) = extract_host_ip_and_gateway(&vpcs_show_ip("PC1", "10.0.0.2/24", "10.0.0.1"));
        assert_eq!(ip, Some(Ipv4Addr::new(10, 0, 0, 2)));
        assert_eq!(gw, Some(Ipv4Addr::new(10, 0, 0, 1)));
    }

    #[test]
    fn test_ios_fixture_parses() {
        let text = ios_interface_brief(&[("FastEthernet0/0", Some("10.0.0.1")), ("FastEthernet0/1", None)]);
        assert_eq!(extract_router_ips(&text), vec![Ipv4Addr::new(10, 0, 0, 1)]);
        assert!(text.contains("unassigned"));
    }

    #[test]
    fn test_payload_builders() {
        let node = Gns3PayloadBuilder::node("PC1", "n1", "vpcs", "started", "127.0.0.1", Some(5000));
        assert_eq!(node["console"], 5000);
        let link = Gns3PayloadBuilder::link("l1", &["n1", "n2"]);
        assert_eq!(link["nodes"][1]["node_id"], "n2");
    }
}
