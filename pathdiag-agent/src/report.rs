//! Console rendering of a diagnosis

use pathdiag_kernel::{Diagnosis, PathOutcome, PathVerdict};
use std::fmt::Write;

pub const EXIT_HEALTHY: u8 = 0;
pub const EXIT_FAILED_HOP: u8 = 1;
pub const EXIT_NO_PATH: u8 = 2;
pub const EXIT_CANCELLED: u8 = 3;

pub const CANCELLED_BEFORE_WALK: &str = "⏹ Cancelled while loading the GNS3 inventory";

pub fn exit_code(diagnosis: &Diagnosis) -> u8 {
    match diagnosis {
        Diagnosis::NoPath { .. } => EXIT_NO_PATH,
        Diagnosis::Walked { verdict } => match verdict.outcome {
            PathOutcome::Healthy => EXIT_HEALTHY,
            PathOutcome::Failed { .. } => EXIT_FAILED_HOP,
            PathOutcome::Cancelled { .. } => EXIT_CANCELLED,
        },
    }
}

pub fn render(diagnosis: &Diagnosis) -> String {
    match diagnosis {
        Diagnosis::NoPath { source, destination } => {
            format!("No path found between {source} and {destination}!\n")
        }
        Diagnosis::Walked { verdict } => render_walk(verdict),
    }
}

fn render_walk(verdict: &PathVerdict) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Path found: {}", verdict.path.join(" → "));
    let _ = writeln!(out);

    for hop in &verdict.hops {
        let status = if hop.verdict.is_healthy() { "✔ OK" } else { "❌ ERROR" };
        match hop.verdict.reason() {
            "" => {
                let _ = writeln!(out, "{}: {}", hop.node, status);
            }
            reason => {
                let _ = writeln!(out, "{}: {} - {}", hop.node, status, reason);
            }
        }
    }
    for name in verdict.path.iter().skip(verdict.hops.len()) {
        let _ = writeln!(out, "{name}: … not checked");
    }

    let _ = writeln!(out);
    match &verdict.outcome {
        PathOutcome::Healthy => {
            let _ = writeln!(out, "🟢 Path healthy end-to-end!");
        }
        PathOutcome::Failed { node, reason } => {
            let _ = writeln!(out, "🔴 FAILURE at: {node} ({reason})");
        }
        PathOutcome::Cancelled { pending } => {
            let at = pending.as_deref().unwrap_or("start");
            let _ = writeln!(out, "⏹ Cancelled while checking {at}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathdiag_kernel::{HopReport, NodeVerdict};

    fn walked(hops: Vec<(&str, NodeVerdict)>, outcome: PathOutcome) -> Diagnosis {
        Diagnosis::Walked {
            verdict: PathVerdict {
                path: vec!["PC1".into(), "R1".into(), "PC2".into()],
                hops: hops
                    .into_iter()
                    .map(|(n, v)| HopReport { node: n.into(), verdict: v })
                    .collect(),
                outcome,
            },
        }
    }

    #[test]
    fn test_failure_report_lists_unchecked_hops() {
        let d = walked(
            vec![("PC1", NodeVerdict::healthy()), ("R1", NodeVerdict::Unreachable)],
            PathOutcome::Failed { node: "R1".into(), reason: "console unreachable".into() },
        );
        let text = render(&d);

        assert!(text.starts_with("Path found: PC1 → R1 → PC2\n"));
        assert!(text.contains("PC1: ✔ OK\n"));
        assert!(text.contains("R1: ❌ ERROR - console unreachable\n"));
        assert!(text.contains("PC2: … not checked\n"));
        assert!(text.contains("🔴 FAILURE at: R1 (console unreachable)"));
        assert_eq!(exit_code(&d), EXIT_FAILED_HOP);
    }

    #[test]
    fn test_healthy_report() {
        let d = walked(
            vec![
                ("PC1", NodeVerdict::healthy()),
                ("R1", NodeVerdict::Healthy { note: Some("not checked: no IP semantics defined for this kind".into()) }),
                ("PC2", NodeVerdict::healthy()),
            ],
            PathOutcome::Healthy,
        );
        let text = render(&d);
        assert!(text.contains("R1: ✔ OK - not checked"));
        assert!(text.ends_with("🟢 Path healthy end-to-end!\n"));
        assert_eq!(exit_code(&d), EXIT_HEALTHY);
    }

    #[test]
    fn test_no_path_and_cancelled() {
        let d = Diagnosis::NoPath { source: "PC1".into(), destination: "PC9".into() };
        assert_eq!(render(&d), "No path found between PC1 and PC9!\n");
        assert_eq!(exit_code(&d), EXIT_NO_PATH);

        let d = walked(vec![], PathOutcome::Cancelled { pending: Some("PC1".into()) });
        assert!(render(&d).contains("⏹ Cancelled while checking PC1"));
        assert_eq!(exit_code(&d), EXIT_CANCELLED);
    }
}
