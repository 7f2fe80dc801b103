use crate::report::model::Report;
use crate::rules::eval::Finding;

/// One line per finding in the classic lint format, then a summary line:
///
/// ```text
/// libfake: E: no-ldconfig-symlink /lib64/libutil-2.29.so
/// 1 files checked; 1 errors, 0 warnings, 0 info
/// ```
pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    for finding in &report.findings {
        out.push_str(&render_finding(&report.package, finding));
        out.push('\n');
    }
    for fault in &report.faults {
        out.push_str(&format!(
            "{}: internal error in {} for {}: {}\n",
            report.package, fault.rule, fault.subject_path, fault.message
        ));
    }

    let verdict = &report.verdict;
    out.push_str(&format!(
        "{} files checked; {} errors, {} warnings, {} info\n",
        report.files.len(),
        verdict.errors,
        verdict.warnings,
        verdict.info
    ));
    out
}

pub fn render_json(report: &Report) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

pub fn render_finding(package: &str, finding: &Finding) -> String {
    format!(
        "{}: {}: {}",
        package,
        finding.severity.letter(),
        finding.message()
    )
}
