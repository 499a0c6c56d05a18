//! Best-effort extraction of addresses from console output.
//!
//! Device output is free-form text, so these are plain pattern scans with
//! "absent" as the answer when nothing matches.

use once_cell::sync::Lazy;
use regex::Regex;
use std::net::Ipv4Addr;

static DOTTED_QUAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+\.\d+\.\d+\.\d+").expect("valid dotted quad regex"));

static HOST_IP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"IP/MASK\s*:\s*(\d+\.\d+\.\d+\.\d+)").expect("valid IP/MASK regex"));

static HOST_GATEWAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"GATEWAY\s*:\s*(\d+\.\d+\.\d+\.\d+)").expect("valid GATEWAY regex"));

/// Every IPv4 address in a `show ip interface brief` style listing,
/// in order of appearance, duplicates kept.
pub fn extract_router_ips(text: &str) -> Vec<Ipv4Addr> {
    DOTTED_QUAD
        .find_iter(text)
        .filter_map(|m| m.as_str().parse().ok())
        .collect()
}

/// `(ip, gateway)` from VPCS `show ip` output. Labels are case-sensitive.
pub fn extract_host_ip_and_gateway(text: &str) -> (Option<Ipv4Addr>, Option<Ipv4Addr>) {
    (labelled(&HOST_IP, text), labelled(&HOST_GATEWAY, text))
}

fn labelled(pattern: &Regex, text: &str) -> Option<Ipv4Addr> {
    pattern
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
