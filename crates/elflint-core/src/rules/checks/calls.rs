//! Rules about library functions a binary references.

use crate::elf::model::ParseResult;
use crate::error::RuleError;
use crate::rules::catalog::RuleId;
use crate::rules::context::FileContext;
use crate::rules::eval::Finding;
use crate::rules::patterns::PATTERNS;

pub fn mktemp(parse: &ParseResult, ctx: &FileContext<'_>) -> Result<Vec<Finding>, RuleError> {
    let symbols = &parse.symbol_table_info;
    Ok(if symbols.calls(&PATTERNS.mktemp_call) {
        vec![Finding::new(RuleId::CallToMktemp, ctx)]
    } else {
        Vec::new()
    })
}

pub fn setgroups_before_setuid(
    parse: &ParseResult,
    ctx: &FileContext<'_>,
) -> Result<Vec<Finding>, RuleError> {
    let symbols = &parse.symbol_table_info;
    let drops_user = symbols.calls(&PATTERNS.setuid_call);
    let drops_groups = symbols.calls(&PATTERNS.setgroups_call);

    Ok(if drops_user && !drops_groups {
        vec![Finding::new(RuleId::MissingCallToSetgroupsBeforeSetuid, ctx)]
    } else {
        Vec::new()
    })
}

pub fn gethostbyname(
    parse: &ParseResult,
    ctx: &FileContext<'_>,
) -> Result<Vec<Finding>, RuleError> {
    let symbols = &parse.symbol_table_info;
    Ok(if symbols.calls(&PATTERNS.gethostbyname_call) {
        vec![Finding::new(RuleId::BinaryOrShlibCallsGethostbyname, ctx)]
    } else {
        Vec::new()
    })
}
