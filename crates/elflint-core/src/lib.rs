pub mod config;
pub mod elf;
pub mod error;
pub mod package;
pub mod report;
pub mod rules;
pub mod util;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::elf::classify::{Classification, ContentSniff, Kind, classify};
use crate::elf::{parse, read, sniff};
use crate::error::Result;
use crate::package::{Package, PackageFile};
use crate::report::model::{AnalysisInfo, FileReport, Report, RulesCatalogInfo, ToolInfo};
use crate::rules::classify::Mode;
use crate::rules::context::FileContext;
use crate::rules::eval::{RuleEngine, RuleFault};
use crate::rules::patterns::PATTERN_TABLE_VERSION;

pub const TOOL_NAME: &str = "elflint";

/// JSON schema version of elflint reports.
/// This must be bumped only when the report layout changes semantically.
pub const SCHEMA_VERSION: &str = "0.1.0";

pub const RULE_CATALOG_VERSION: &str = "0.1.0";

/// Analyse every regular file of `package` and assemble the report.
///
/// Files are analysed in parallel; the report is ordered independently of
/// scheduling. Only a missing introspection utility or an unreadable
/// package tree is an error, every per-file problem becomes a finding.
pub fn inspect_package(
    package: &Package,
    tool: ToolInfo,
    config: &Config,
    mode: Mode,
) -> Result<Report> {
    let engine = RuleEngine::from_config(config);
    let siblings = package.siblings();
    let files: Vec<&PackageFile> = package.regular_files().collect();

    info!(package = %package.name, files = files.len(), "inspecting package");

    let results = files
        .par_iter()
        .map(|file| {
            let ctx = FileContext {
                logical_path: &file.logical_path,
                package_name: &package.name,
                siblings: &siblings,
                policy: &config.policy,
            };
            inspect_file(file, &ctx, &engine, config)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut reports = Vec::with_capacity(results.len());
    let mut faults = Vec::new();
    for (report, file_faults) in results {
        reports.push(report);
        faults.extend(file_faults);
    }

    let rules = RulesCatalogInfo {
        catalog_version: RULE_CATALOG_VERSION.to_string(),
        pattern_table_version: PATTERN_TABLE_VERSION.to_string(),
        disabled: config.disabled_rules.clone(),
    };
    Ok(Report::new(tool, &package.name, rules, reports, faults, mode))
}

/// Sniff, classify, parse and evaluate a single file.
pub fn inspect_file(
    file: &PackageFile,
    ctx: &FileContext<'_>,
    engine: &RuleEngine,
    config: &Config,
) -> Result<(FileReport, Vec<RuleFault>)> {
    let (content_type, artifact, classification) = match read::read_artifact(&file.content_path) {
        Ok(artifact) => {
            let content_type = sniff::describe(&artifact.bytes);
            let classification = classify(&ContentSniff {
                magic: &content_type,
                path: &file.logical_path,
            });
            (content_type, Some(artifact.into_artifact()), classification)
        }
        Err(e) => {
            // Let the parser's own pre-check turn this into a failure finding.
            warn!(path = %file.logical_path, error = %e, "cannot read file content");
            let (is_archive, _) = parse::file_class(&file.logical_path);
            let kind = if is_archive { Kind::Archive } else { Kind::Object };
            ("unreadable".to_string(), None, Classification::Analyze(kind))
        }
    };

    let Classification::Analyze(kind) = classification else {
        debug!(path = %file.logical_path, %content_type, "skipped");
        return Ok((
            FileReport {
                path: file.logical_path.clone(),
                content_type,
                analyzed_as: None,
                artifact,
                analysis: AnalysisInfo::skipped(),
                findings: Vec::new(),
            },
            Vec::new(),
        ));
    };

    let parsed = parse::parse(&file.content_path, &file.logical_path, config)?;
    let evaluation = engine.evaluate(&parsed, ctx);

    Ok((
        FileReport {
            path: file.logical_path.clone(),
            content_type,
            analyzed_as: Some(kind),
            artifact,
            analysis: AnalysisInfo::from_parse(&parsed),
            findings: evaluation.findings,
        },
        evaluation.faults,
    ))
}
