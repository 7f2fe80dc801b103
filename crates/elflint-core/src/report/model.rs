use serde::{Deserialize, Serialize};

use crate::SCHEMA_VERSION;
use crate::elf::classify::Kind;
use crate::elf::model::ParseResult;
use crate::rules::classify::{Mode, classify};
use crate::rules::eval::{Finding, RuleFault};
use crate::util::deterministic::{sort_faults, sort_files, sort_findings};

/// Top-level elflint report for one package.
///
/// Deterministic for identical inputs: files are ordered by logical path
/// and findings by path, then rule evaluation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub schema_version: String,
    pub tool: ToolInfo,
    pub package: String,
    pub rules: RulesCatalogInfo,
    pub files: Vec<FileReport>,
    pub findings: Vec<Finding>,
    pub faults: Vec<RuleFault>,
    pub verdict: VerdictInfo,
}

impl Report {
    /// Assemble a report from per-file results in any order.
    pub fn new(
        tool: ToolInfo,
        package: impl Into<String>,
        rules: RulesCatalogInfo,
        mut files: Vec<FileReport>,
        mut faults: Vec<RuleFault>,
        mode: Mode,
    ) -> Self {
        sort_files(&mut files);
        for file in &mut files {
            sort_findings(&mut file.findings);
        }
        sort_faults(&mut faults);

        let findings: Vec<Finding> = files
            .iter()
            .flat_map(|f| f.findings.iter().cloned())
            .collect();
        let verdict = classify(&findings, &faults, mode);

        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            tool,
            package: package.into(),
            rules,
            files,
            findings,
            faults,
            verdict,
        }
    }
}

/// Tool metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
    pub readelf: String,
}

/// Versions of the rule set that produced the findings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RulesCatalogInfo {
    pub catalog_version: String,
    pub pattern_table_version: String,
    pub disabled: Vec<String>,
}

/// One package entry that was looked at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    pub path: String,
    pub content_type: String,
    /// `None` when the classifier skipped the file.
    pub analyzed_as: Option<Kind>,
    pub artifact: Option<ArtifactInfo>,
    pub analysis: AnalysisInfo,
    pub findings: Vec<Finding>,
}

/// Artifact metadata bound to one file entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactInfo {
    pub size_bytes: u64,
    pub hash: ArtifactHash,
}

/// Cryptographic artifact fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactHash {
    pub algorithm: String,
    pub value: String,
}

/// Parsing/analysis status.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AnalysisInfo {
    pub status: String,
    pub warnings: Vec<String>,
    pub summary: Option<ParseSummary>,
}

impl AnalysisInfo {
    pub fn skipped() -> Self {
        Self {
            status: "skipped".into(),
            ..Default::default()
        }
    }

    pub fn from_parse(parse: &ParseResult) -> Self {
        let summary = Some(ParseSummary::of(parse));
        match parse.parsing_failed_reason() {
            Some(reason) => Self {
                status: "parse_error".into(),
                warnings: vec![reason.trim().to_string()],
                summary,
            },
            None => Self {
                status: "ok".into(),
                warnings: parse
                    .non_elf_members
                    .iter()
                    .map(|m| m.message.clone())
                    .collect(),
                summary,
            },
        }
    }
}

/// Counts of the structures readelf reported.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ParseSummary {
    pub is_archive: bool,
    pub is_shared_library: bool,
    pub elf_files: usize,
    pub non_elf_members: usize,
    pub sections: usize,
    pub symbols: usize,
    pub program_headers: usize,
    pub dynamic_entries: usize,
}

impl ParseSummary {
    pub fn of(parse: &ParseResult) -> Self {
        Self {
            is_archive: parse.is_archive,
            is_shared_library: parse.is_shared_library,
            elf_files: parse.elf_files().len(),
            non_elf_members: parse.non_elf_members.len(),
            sections: parse.section_info.sections().count(),
            symbols: parse.symbol_table_info.symbols.len(),
            program_headers: parse.program_header_info.headers.len(),
            dynamic_entries: parse.dynamic_section_info.sections.len(),
        }
    }
}

/// Final verdict block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerdictInfo {
    pub mode: Mode,
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
    pub faults: usize,
    pub passed: bool,
    pub exit_code: i32,
}
