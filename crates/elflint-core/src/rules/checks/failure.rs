use crate::elf::model::ParseResult;
use crate::error::RuleError;
use crate::rules::catalog::RuleId;
use crate::rules::context::FileContext;
use crate::rules::eval::Finding;
use crate::rules::patterns::PATTERNS;

pub fn readelf_failed(
    parse: &ParseResult,
    ctx: &FileContext<'_>,
) -> Result<Vec<Finding>, RuleError> {
    let Some(reason) = parse.parsing_failed_reason() else {
        return Ok(Vec::new());
    };
    let detail = reason
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("; ");
    Ok(vec![Finding::new(RuleId::ReadelfFailed, ctx).with_detail(detail)])
}

/// One finding per file, however many members readelf rejected.
pub fn not_an_elf_file(
    parse: &ParseResult,
    ctx: &FileContext<'_>,
) -> Result<Vec<Finding>, RuleError> {
    let first = parse
        .non_elf_members
        .iter()
        .find(|m| !m.name.as_deref().is_some_and(|n| PATTERNS.is_foreign_member(n)));

    Ok(first
        .map(|m| Finding::new(RuleId::NotAnElfFile, ctx).with_detail(m.message.trim()))
        .into_iter()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elf::model::NonElfMember;
    use crate::rules::checks::testing::Scenario;

    fn non_elf(name: Option<&str>, message: &str) -> NonElfMember {
        NonElfMember {
            name: name.map(str::to_string),
            message: message.into(),
        }
    }

    #[test]
    fn failure_reason_becomes_detail() {
        let parse = ParseResult::failed(
            false,
            true,
            "readelf: Error: 'not-existing.so': No such file\n",
        );
        let messages = Scenario::new("/lib64/not-existing.so").messages(readelf_failed, &parse);
        assert_eq!(
            messages,
            vec!["readelf-failed /lib64/not-existing.so readelf: Error: 'not-existing.so': No such file"]
        );
    }

    #[test]
    fn healthy_parse_has_no_failure() {
        let scenario = Scenario::new("/bin/x");
        assert!(scenario.run(readelf_failed, &ParseResult::default()).is_empty());
        assert!(scenario.run(not_an_elf_file, &ParseResult::default()).is_empty());
    }

    #[test]
    fn non_elf_members_are_reported_once() {
        let parse = ParseResult {
            is_archive: true,
            non_elf_members: vec![
                non_elf(
                    Some("README"),
                    "readelf: Error: Not an ELF file - it has the wrong magic bytes at the start",
                ),
                non_elf(
                    Some("LICENSE"),
                    "readelf: Error: Not an ELF file - it has the wrong magic bytes at the start",
                ),
            ],
            ..Default::default()
        };
        let findings = Scenario::new("/usr/lib64/small_archive.a").run(not_an_elf_file, &parse);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].detail.contains("Not an ELF file"));
    }

    #[test]
    fn foreign_members_are_excluded() {
        let parse = ParseResult {
            is_archive: true,
            non_elf_members: vec![non_elf(Some("module.bc"), "Not an ELF file")],
            ..Default::default()
        };
        assert!(Scenario::new("/usr/lib64/m.a")
            .run(not_an_elf_file, &parse)
            .is_empty());
    }
}
