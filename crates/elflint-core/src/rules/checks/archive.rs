//! Rules about static archives and compiler-intermediate content.

use crate::elf::model::ParseResult;
use crate::error::RuleError;
use crate::rules::catalog::RuleId;
use crate::rules::context::FileContext;
use crate::rules::eval::Finding;
use crate::rules::patterns::PATTERNS;

fn has_lto_sections(parse: &ParseResult) -> bool {
    parse
        .section_info
        .sections()
        .any(|s| PATTERNS.is_lto_section(&s.name))
}

fn single(rule: RuleId, ctx: &FileContext<'_>, fires: bool) -> Vec<Finding> {
    if fires {
        vec![Finding::new(rule, ctx)]
    } else {
        Vec::new()
    }
}

pub fn lto_bytecode(parse: &ParseResult, ctx: &FileContext<'_>) -> Result<Vec<Finding>, RuleError> {
    Ok(single(RuleId::LtoBytecode, ctx, has_lto_sections(parse)))
}

/// An archive built from thin LTO objects only: no member carries code,
/// data or initialisers a non-LTO link could use.
pub fn lto_no_text_in_archive(
    parse: &ParseResult,
    ctx: &FileContext<'_>,
) -> Result<Vec<Finding>, RuleError> {
    let fires = parse.is_archive
        && has_lto_sections(parse)
        && !parse
            .section_info
            .sections()
            .any(|s| PATTERNS.is_native_content(&s.name, s.size));
    Ok(single(RuleId::LtoNoTextInArchive, ctx, fires))
}

pub fn static_library_without_symtab(
    parse: &ParseResult,
    ctx: &FileContext<'_>,
) -> Result<Vec<Finding>, RuleError> {
    let fires =
        parse.is_archive && parse.has_elf_content() && parse.symbol_table_info.is_empty();
    Ok(single(RuleId::StaticLibraryWithoutSymtab, ctx, fires))
}

pub fn static_library_without_debuginfo(
    parse: &ParseResult,
    ctx: &FileContext<'_>,
) -> Result<Vec<Finding>, RuleError> {
    if !parse.is_archive || !parse.has_elf_content() {
        return Ok(Vec::new());
    }

    let exempt_path = ctx
        .policy
        .debug_exempt_prefixes
        .iter()
        .any(|p| ctx.logical_path.starts_with(p.as_str()));
    let has_debug = parse
        .section_info
        .sections()
        .any(|s| PATTERNS.is_debug_section(&s.name) || PATTERNS.is_debug_companion(&s.name));

    Ok(single(
        RuleId::StaticLibraryWithoutDebuginfo,
        ctx,
        !exempt_path && !has_debug,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elf::model::{SectionInfo, SymbolTableInfo};
    use crate::rules::checks::testing::*;

    fn archive(members: Vec<crate::elf::model::ElfFile>, symbols: usize) -> ParseResult {
        ParseResult {
            is_archive: true,
            section_info: SectionInfo { elf_files: members },
            symbol_table_info: SymbolTableInfo::new(
                (0..symbols).map(|i| func(&format!("f{i}"), false)).collect(),
            ),
            ..Default::default()
        }
    }

    #[test]
    fn thin_lto_archive_has_no_text() {
        let parse = archive(
            vec![member(
                "a.o",
                vec![
                    section(".text", 0),
                    section(".gnu.lto_.symtab.0", 0x20),
                    section(".gnu.lto_main.1", 0x100),
                ],
            )],
            1,
        );
        let scenario = Scenario::new("/usr/lib64/lto.a");
        assert_eq!(
            scenario.messages(lto_no_text_in_archive, &parse),
            vec!["lto-no-text-in-archive /usr/lib64/lto.a"]
        );
        assert_eq!(
            scenario.messages(lto_bytecode, &parse),
            vec!["lto-bytecode /usr/lib64/lto.a"]
        );
    }

    #[test]
    fn fat_lto_archive_is_fine() {
        let parse = archive(
            vec![member(
                "a.o",
                vec![section(".text", 0x40), section(".gnu.lto_main.1", 0x100)],
            )],
            1,
        );
        assert!(Scenario::new("/usr/lib64/fat.a")
            .run(lto_no_text_in_archive, &parse)
            .is_empty());
    }

    #[test]
    fn init_array_counts_as_native_content() {
        let parse = archive(
            vec![member(
                "ctor.o",
                vec![
                    section(".init_array.00099", 8),
                    section(".gnu.lto_.decls", 0x10),
                ],
            )],
            1,
        );
        assert!(Scenario::new("/usr/lib64/ctor.a")
            .run(lto_no_text_in_archive, &parse)
            .is_empty());
    }

    #[test]
    fn lto_in_plain_object_is_not_an_archive_error() {
        let parse = ParseResult {
            section_info: SectionInfo {
                elf_files: vec![image(vec![section(".gnu.lto_main.1", 0x100)])],
            },
            ..Default::default()
        };
        let scenario = Scenario::new("/usr/lib64/x.o");
        assert!(scenario.run(lto_no_text_in_archive, &parse).is_empty());
        assert_eq!(scenario.run(lto_bytecode, &parse).len(), 1);
    }

    #[test]
    fn stripped_archive() {
        let parse = archive(vec![member("a.o", vec![section(".text", 0x40)])], 0);
        let scenario = Scenario::new("/usr/lib64/stripped.a");
        assert_eq!(
            scenario.messages(static_library_without_symtab, &parse),
            vec!["static-library-without-symtab /usr/lib64/stripped.a"]
        );
        assert_eq!(
            scenario.messages(static_library_without_debuginfo, &parse),
            vec!["static-library-without-debuginfo /usr/lib64/stripped.a"]
        );
    }

    #[test]
    fn archive_without_elf_members_is_silent() {
        let parse = archive(Vec::new(), 0);
        let scenario = Scenario::new("/usr/lib64/empty.a");
        assert!(scenario.run(static_library_without_symtab, &parse).is_empty());
        assert!(scenario.run(static_library_without_debuginfo, &parse).is_empty());
    }

    #[test]
    fn debuginfo_exemptions() {
        let with_debug = archive(
            vec![member("a.o", vec![section(".text", 4), section(".debug_info", 9)])],
            1,
        );
        let with_link = archive(
            vec![member("a.o", vec![section(".text", 4), section(".gnu_debuglink", 9)])],
            1,
        );
        let lto_with_debug = archive(
            vec![member(
                "g.o",
                vec![section(".gnu.lto_.opts", 9), section(".gnu.debuglto_.debug_info", 63)],
            )],
            1,
        );
        let plain = archive(vec![member("a.o", vec![section(".text", 4)])], 1);

        assert!(Scenario::new("/usr/lib64/a.a")
            .run(static_library_without_debuginfo, &with_debug)
            .is_empty());
        assert!(Scenario::new("/usr/lib64/a.a")
            .run(static_library_without_debuginfo, &with_link)
            .is_empty());
        assert!(Scenario::new("/usr/lib64/g.a")
            .run(static_library_without_debuginfo, &lto_with_debug)
            .is_empty());
        assert!(Scenario::new("/usr/lib/debug/usr/lib64/a.a")
            .run(static_library_without_debuginfo, &plain)
            .is_empty());
    }
}
