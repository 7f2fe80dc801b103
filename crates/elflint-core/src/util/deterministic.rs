//! Deterministic ordering helpers.
//!
//! Files are analysed in parallel, so every collection that reaches a
//! report is re-sorted here. Sorts are stable: ties keep the order in
//! which the rule engine produced them.

use crate::report::model::FileReport;
use crate::rules::eval::{Finding, RuleFault};

/// Sort file entries by logical path.
pub fn sort_files(files: &mut [FileReport]) {
    files.sort_by(|a, b| a.path.cmp(&b.path));
}

/// Sort findings by `(subject_path, rule evaluation order)`.
pub fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(|a, b| {
        (a.subject_path.as_str(), a.rule).cmp(&(b.subject_path.as_str(), b.rule))
    });
}

pub fn sort_faults(faults: &mut [RuleFault]) {
    faults.sort_by(|a, b| {
        (a.subject_path.as_str(), a.rule).cmp(&(b.subject_path.as_str(), b.rule))
    });
}
