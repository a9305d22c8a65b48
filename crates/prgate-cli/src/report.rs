//! Console presentation of a gate run.

use colored::*;
use prgate_core::{Notarization, TrustStatus};
use prgate_runner::GateRun;

pub fn colorize_status(status: TrustStatus) -> ColoredString {
    let s = status.as_str();
    match status {
        TrustStatus::Trusted => s.green(),
        TrustStatus::Untrusted | TrustStatus::Unknown | TrustStatus::Unsupported => s.red(),
        TrustStatus::ApikeyRevoked => s.yellow(),
    }
}

/// Human-readable report. The caller decides the exit code from `outcome.success`.
pub fn render(run: &GateRun) -> String {
    let outcome = &run.outcome;
    let report = &outcome.report;
    let mut out = String::new();

    out.push_str(&format!("Artifact: {} ({})\n", run.artifact.name, run.artifact.hash));
    match &outcome.notarization {
        Notarization::Recorded { approver, .. } => {
            out.push_str(&format!("{}\n", format!("Successfully notarized PR for current approver {approver}").green()));
        }
        Notarization::Skipped { approver } => {
            out.push_str(&format!("{}\n", format!("SKIPPING notarization: PR approver {approver} is not required").green()));
        }
    }

    out.push_str(&format!(
        "\nVerifying if the PR has been notarized for all {} required PR approvers ...\n",
        report.len()
    ));
    for (approver, verification) in report.entries() {
        match verification {
            None => {
                out.push_str(&format!("{}\n", format!("   PR is NOT notarized for required approver {approver}").yellow()));
            }
            Some(v) => {
                out.push_str(&format!("   Verification details for approver {approver}:\n"));
                out.push_str(&format!("      Status:     {}\n", colorize_status(v.status)));
                out.push_str(&format!("      PR commit:  {}\n", v.artifact_name));
                out.push_str(&format!("      Signer ID:  {}\n", v.signer));
            }
        }
    }
    out.push('\n');

    let required = join(report.approvers().map(|a| a.as_str()));
    if outcome.success {
        let line = format!("PR is notarized for all {} required approvers ({required}).", report.len());
        out.push_str(&format!("{}\n", line.green()));
    } else {
        let notarized = report.notarized();
        let line = format!(
            "PR is notarized for {} of {} required approvers:\n   - notarized: {}\n   - required : {required}",
            notarized.len(),
            report.len(),
            join(notarized.iter().map(|a| a.as_str())),
        );
        out.push_str(&format!("{}\n", line.yellow()));
    }
    out
}

fn join<'a>(items: impl Iterator<Item = &'a str>) -> String {
    items.collect::<Vec<_>>().join(",")
}
