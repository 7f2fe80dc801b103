//! Verdict over the merged findings of a package.
//!
//! Policy:
//!
//!   - Default    → fails on any error
//!   - Strict     → fails on any error or warning
//!   - Permissive → never fails
//!
//! Rule faults are counted but never change the verdict.

use serde::{Deserialize, Serialize};

use crate::report::model::VerdictInfo;
use crate::rules::catalog::Severity;
use crate::rules::eval::{Finding, RuleFault};

/// Exit status when the verdict fails.
pub const EXIT_BADNESS: i32 = 64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Default,
    Strict,
    Permissive,
}

pub fn classify(findings: &[Finding], faults: &[RuleFault], mode: Mode) -> VerdictInfo {
    let count = |severity: Severity| findings.iter().filter(|f| f.severity == severity).count();
    let errors = count(Severity::Error);
    let warnings = count(Severity::Warning);
    let info = count(Severity::Info);

    let failing = match mode {
        Mode::Default => errors,
        Mode::Strict => errors + warnings,
        Mode::Permissive => 0,
    };
    let passed = failing == 0;

    VerdictInfo {
        mode,
        errors,
        warnings,
        info,
        faults: faults.len(),
        passed,
        exit_code: if passed { 0 } else { EXIT_BADNESS },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::catalog::RuleId;

    fn finding(rule: RuleId) -> Finding {
        Finding {
            rule,
            severity: rule.severity(),
            subject_path: "/usr/lib64/libx.so.1".into(),
            detail: String::new(),
        }
    }

    #[test]
    fn no_findings_pass() {
        let v = classify(&[], &[], Mode::Default);
        assert!(v.passed);
        assert_eq!(v.exit_code, 0);
    }

    #[test]
    fn errors_fail_unless_permissive() {
        let findings = [finding(RuleId::CallToMktemp), finding(RuleId::NoSoname)];

        let v = classify(&findings, &[], Mode::Default);
        assert_eq!((v.errors, v.warnings, v.info), (1, 1, 0));
        assert_eq!(v.exit_code, EXIT_BADNESS);

        let v = classify(&findings, &[], Mode::Permissive);
        assert!(v.passed);
        assert_eq!(v.exit_code, 0);
    }

    #[test]
    fn strict_fails_on_warnings() {
        let findings = [finding(RuleId::BinaryOrShlibCallsGethostbyname)];
        assert!(classify(&findings, &[], Mode::Default).passed);
        assert_eq!(classify(&findings, &[], Mode::Strict).exit_code, EXIT_BADNESS);
    }

    #[test]
    fn info_never_fails() {
        let findings = [finding(RuleId::LtoBytecode)];
        let v = classify(&findings, &[], Mode::Strict);
        assert_eq!(v.info, 1);
        assert!(v.passed);
    }

    #[test]
    fn faults_are_counted_but_do_not_fail() {
        let faults = [RuleFault {
            rule: RuleId::ExecutableStack,
            subject_path: "/bin/x".into(),
            message: "boom".into(),
        }];
        let v = classify(&[], &faults, Mode::Strict);
        assert_eq!(v.faults, 1);
        assert!(v.passed);
    }
}
