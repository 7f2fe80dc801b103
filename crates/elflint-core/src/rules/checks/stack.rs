use crate::elf::model::ParseResult;
use crate::error::RuleError;
use crate::rules::catalog::RuleId;
use crate::rules::context::FileContext;
use crate::rules::eval::Finding;

const GNU_STACK: &str = "GNU_STACK";

pub fn executable_stack(
    parse: &ParseResult,
    ctx: &FileContext<'_>,
) -> Result<Vec<Finding>, RuleError> {
    let headers = &parse.program_header_info;
    let finding = match headers.find(GNU_STACK) {
        Some(stack) if stack.flags.contains('E') => {
            Some(Finding::new(RuleId::ExecutableStack, ctx))
        }
        Some(_) => None,
        None if ctx.policy.missing_gnu_stack_is_executable
            && !parse.is_archive
            && !headers.headers.is_empty() =>
        {
            Some(Finding::new(RuleId::ExecutableStack, ctx).with_detail("missing PT_GNU_STACK"))
        }
        None => None,
    };
    Ok(finding.into_iter().collect())
}
