use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::elf::model::ParseResult;
use crate::error::RuleError;
use crate::rules::catalog::{RuleId, Scope, Severity};
use crate::rules::checks;
use crate::rules::context::FileContext;

/// One policy violation raised by a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub rule: RuleId,
    pub severity: Severity,
    pub subject_path: String,
    pub detail: String,
}

impl Finding {
    pub fn new(rule: RuleId, ctx: &FileContext<'_>) -> Self {
        Self {
            rule,
            severity: rule.severity(),
            subject_path: ctx.logical_path.to_string(),
            detail: String::new(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    /// Message text after the severity tag, e.g.
    /// `no-soname /lib64/no-soname.so` or
    /// `shlib-policy-name-error SONAME: libutil.so.1, expected package suffix: 1`.
    pub fn message(&self) -> String {
        let mut parts = vec![self.rule.as_str()];
        if self.rule.info().scope == Scope::File {
            parts.push(&self.subject_path);
        }
        if !self.detail.is_empty() {
            parts.push(&self.detail);
        }
        parts.join(" ")
    }
}

/// A rule that could not complete. Reported apart from findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleFault {
    pub rule: RuleId,
    pub subject_path: String,
    pub message: String,
}

pub type Evaluator = fn(&ParseResult, &FileContext<'_>) -> Result<Vec<Finding>, RuleError>;

/// The closed rule set, in evaluation order.
pub const RULES: &[(RuleId, Evaluator)] = &[
    (RuleId::ReadelfFailed, checks::failure::readelf_failed),
    (RuleId::NotAnElfFile, checks::failure::not_an_elf_file),
    (RuleId::LtoBytecode, checks::archive::lto_bytecode),
    (RuleId::LtoNoTextInArchive, checks::archive::lto_no_text_in_archive),
    (
        RuleId::StaticLibraryWithoutSymtab,
        checks::archive::static_library_without_symtab,
    ),
    (
        RuleId::StaticLibraryWithoutDebuginfo,
        checks::archive::static_library_without_debuginfo,
    ),
    (RuleId::ExecutableStack, checks::stack::executable_stack),
    (RuleId::NoSoname, checks::shlib::no_soname),
    (RuleId::InvalidSoname, checks::shlib::invalid_soname),
    (RuleId::ShlibWithNonPicCode, checks::shlib::non_pic_code),
    (RuleId::NoLdconfigSymlink, checks::shlib::no_ldconfig_symlink),
    (RuleId::ShlibPolicyNameError, checks::shlib::policy_name),
    (
        RuleId::SharedLibraryWithoutDependencyInformation,
        checks::shlib::without_dependency_information,
    ),
    (RuleId::CallToMktemp, checks::calls::mktemp),
    (
        RuleId::MissingCallToSetgroupsBeforeSetuid,
        checks::calls::setgroups_before_setuid,
    ),
    (
        RuleId::BinaryOrShlibCallsGethostbyname,
        checks::calls::gethostbyname,
    ),
];

/// Findings and faults of one file, both in evaluation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    pub findings: Vec<Finding>,
    pub faults: Vec<RuleFault>,
}

/// Fixed table of rule evaluators.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    rules: Vec<(RuleId, Evaluator)>,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self {
            rules: RULES.to_vec(),
        }
    }
}

impl RuleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The full rule set minus `config.disabled_rules`. Unknown names are
    /// ignored.
    pub fn from_config(config: &Config) -> Self {
        let mut engine = Self::new();
        engine
            .rules
            .retain(|(id, _)| !config.is_rule_disabled(id.as_str()));
        engine
    }

    pub fn rule_ids(&self) -> impl Iterator<Item = RuleId> + '_ {
        self.rules.iter().map(|(id, _)| *id)
    }

    /// Runs every rule against `parse`.
    ///
    /// A parse failure short-circuits to the failure rule alone. Each other
    /// rule runs in isolation: an error or panic becomes a `RuleFault` and
    /// the remaining rules still run.
    pub fn evaluate(&self, parse: &ParseResult, ctx: &FileContext<'_>) -> Evaluation {
        let mut evaluation = Evaluation::default();

        for &(id, evaluator) in &self.rules {
            if parse.parse_failure.is_some() && id != RuleId::ReadelfFailed {
                continue;
            }

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| evaluator(parse, ctx)));
            match outcome {
                Ok(Ok(findings)) => evaluation.findings.extend(findings),
                Ok(Err(e)) => evaluation.faults.push(fault(id, ctx, e.0)),
                Err(payload) => {
                    evaluation
                        .faults
                        .push(fault(id, ctx, panic_message(&*payload)));
                }
            }
        }

        debug!(
            path = ctx.logical_path,
            findings = evaluation.findings.len(),
            faults = evaluation.faults.len(),
            "rules evaluated"
        );
        evaluation
    }
}

fn fault(rule: RuleId, ctx: &FileContext<'_>, message: String) -> RuleFault {
    warn!(rule = %rule, path = ctx.logical_path, %message, "rule evaluation fault");
    RuleFault {
        rule,
        subject_path: ctx.logical_path.to_string(),
        message,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "rule panicked".to_string()
    }
}
