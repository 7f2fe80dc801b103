//! Shared-library packaging rules.
//!
//! All of them look only at files installed as shared libraries (see
//! `elf::parse::file_class`) that produced ELF content.

use std::sync::LazyLock;

use regex::Regex;

use crate::elf::model::ParseResult;
use crate::error::RuleError;
use crate::rules::catalog::RuleId;
use crate::rules::context::FileContext;
use crate::rules::eval::Finding;
use crate::rules::patterns::PATTERNS;

/// `<pre>.so[.<post>]`, splitting at the first `.so` that ends the name or
/// is followed by a dot.
static SONAME_PARTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<pre>.*?)\.so(?:\.(?P<post>.*))?$").expect("static soname split pattern")
});

static PRE_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-(?P<v>[0-9][0-9.]*)$").expect("static pre-version pattern"));

fn shared_library(parse: &ParseResult) -> bool {
    parse.is_shared_library && parse.has_elf_content()
}

pub fn no_soname(parse: &ParseResult, ctx: &FileContext<'_>) -> Result<Vec<Finding>, RuleError> {
    if shared_library(parse) && parse.dynamic_section_info.soname.is_none() {
        return Ok(vec![Finding::new(RuleId::NoSoname, ctx)]);
    }
    Ok(Vec::new())
}

pub fn invalid_soname(
    parse: &ParseResult,
    ctx: &FileContext<'_>,
) -> Result<Vec<Finding>, RuleError> {
    if !shared_library(parse) {
        return Ok(Vec::new());
    }
    match &parse.dynamic_section_info.soname {
        Some(soname) if !PATTERNS.valid_soname.is_match(soname) => {
            Ok(vec![Finding::new(RuleId::InvalidSoname, ctx).with_detail(soname)])
        }
        _ => Ok(Vec::new()),
    }
}

pub fn non_pic_code(parse: &ParseResult, ctx: &FileContext<'_>) -> Result<Vec<Finding>, RuleError> {
    if !shared_library(parse) {
        return Ok(Vec::new());
    }
    let dynamic = &parse.dynamic_section_info;
    let tagged = PATTERNS.textrel_tags.iter().any(|t| dynamic.contains_key(t));
    let flagged = PATTERNS.textrel_flag_tags.iter().any(|t| {
        dynamic
            .get(t)
            .iter()
            .any(|v| v.split_whitespace().any(|f| f == "TEXTREL"))
    });

    if tagged || flagged {
        return Ok(vec![Finding::new(RuleId::ShlibWithNonPicCode, ctx)]);
    }
    Ok(Vec::new())
}

/// The runtime symlink named after the SONAME must ship next to the library.
pub fn no_ldconfig_symlink(
    parse: &ParseResult,
    ctx: &FileContext<'_>,
) -> Result<Vec<Finding>, RuleError> {
    if !shared_library(parse) {
        return Ok(Vec::new());
    }
    let Some(soname) = &parse.dynamic_section_info.soname else {
        return Ok(Vec::new());
    };

    let beside = format!("{}/{}", ctx.directory(), soname);
    if ctx.siblings.contains(&beside) || ctx.siblings.contains(soname.as_str()) {
        return Ok(Vec::new());
    }
    Ok(vec![Finding::new(RuleId::NoLdconfigSymlink, ctx)])
}

pub fn policy_name(parse: &ParseResult, ctx: &FileContext<'_>) -> Result<Vec<Finding>, RuleError> {
    if !shared_library(parse) {
        return Ok(Vec::new());
    }
    let subject = ctx
        .policy
        .shlib_name_prefixes
        .iter()
        .any(|p| ctx.package_name.starts_with(p.as_str()));
    if !subject {
        return Ok(Vec::new());
    }
    let Some(soname) = &parse.dynamic_section_info.soname else {
        return Ok(Vec::new());
    };
    let Some(suffix) = expected_package_suffix(soname) else {
        return Ok(Vec::new());
    };

    if has_version_suffix(ctx.package_name, &suffix) {
        return Ok(Vec::new());
    }
    Ok(vec![Finding::new(RuleId::ShlibPolicyNameError, ctx).with_detail(format!(
        "SONAME: {soname}, expected package suffix: {suffix}"
    ))])
}

/// Version suffix a library package must carry for `soname`:
/// `libutil.so.1` gives `1`, `libgame2-1.9.so.10.0.0` gives `1_9-10_0_0`.
pub fn expected_package_suffix(soname: &str) -> Option<String> {
    let caps = SONAME_PARTS.captures(soname)?;

    let pre = caps
        .name("pre")
        .and_then(|m| PRE_VERSION.captures(m.as_str()))
        .and_then(|c| c.name("v"))
        .map(|v| v.as_str().replace('.', "_"));
    let post = caps
        .name("post")
        .map(|m| m.as_str())
        .filter(|p| !p.is_empty())
        .map(|p| p.replace('.', "_"));

    match (pre, post) {
        (Some(pre), Some(post)) => Some(format!("{pre}-{post}")),
        (Some(only), None) | (None, Some(only)) => Some(only),
        (None, None) => None,
    }
}

/// `libfoo1` carries `1`, `libfoo11` does not.
fn has_version_suffix(package: &str, suffix: &str) -> bool {
    package
        .strip_suffix(suffix)
        .is_some_and(|head| !head.ends_with(|c: char| c.is_ascii_digit()))
}

pub fn without_dependency_information(
    parse: &ParseResult,
    ctx: &FileContext<'_>,
) -> Result<Vec<Finding>, RuleError> {
    if !shared_library(parse) || !parse.dynamic_section_info.needed.is_empty() {
        return Ok(Vec::new());
    }
    if parse.symbol_table_info.imports().next().is_some() {
        return Ok(vec![Finding::new(
            RuleId::SharedLibraryWithoutDependencyInformation,
            ctx,
        )]);
    }
    Ok(Vec::new())
}
