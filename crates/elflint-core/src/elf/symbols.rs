//! Symbol table grammar (`readelf -W -s`).

use crate::elf::model::{
    SectionRef, Symbol, SymbolBind, SymbolTableKind, SymbolType, SymbolVisibility,
};

/// Parses one symbol row:
///
/// ```text
///      1: 0000000000000000     0 FUNC    GLOBAL DEFAULT  UND mktemp@GLIBC_2.2.5 (2)
/// ```
///
/// Unnamed symbols (entry 0, section symbols on older binutils) yield
/// `None`, as do banner rows.
pub fn parse_line(line: &str, table: SymbolTableKind) -> Option<Symbol> {
    let mut fields = line.split_whitespace();

    let num = fields.next()?.strip_suffix(':')?;
    num.parse::<u64>().ok()?;
    let _value = fields.next()?;
    let _size = fields.next()?;
    let sym_type = SymbolType::parse(fields.next()?);
    let bind = SymbolBind::parse(fields.next()?);
    let visibility = SymbolVisibility::parse(fields.next()?);

    // Some targets append annotations to the visibility column, e.g.
    // `DEFAULT [VARIANT_PCS]` or `DEFAULT [<other>: 88]`.
    let mut ndx = fields.next()?;
    if ndx.starts_with('[') {
        while !ndx.ends_with(']') {
            ndx = fields.next()?;
        }
        ndx = fields.next()?;
    }
    let section = SectionRef::parse(ndx);

    let raw_name = fields.next()?;
    let (name, version) = split_version(raw_name);
    if name.is_empty() {
        return None;
    }

    Some(Symbol {
        name: name.to_string(),
        version: version.map(str::to_string),
        sym_type,
        bind,
        visibility,
        section: Some(section),
        table,
    })
}

/// Splits `name@VERSION` / `name@@VERSION`.
fn split_version(raw: &str) -> (&str, Option<&str>) {
    match raw.split_once('@') {
        Some((name, version)) => (name, Some(version.trim_start_matches('@'))),
        None => (raw, None),
    }
}

/// Table name from a `Symbol table '.dynsym' contains 7 entries:` banner.
pub fn table_name(banner: &str) -> Option<&str> {
    let rest = banner.strip_prefix("Symbol table '")?;
    rest.split_once('\'').map(|(name, _)| name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_versioned_undefined_function() {
        let s = parse_line(
            "     1: 0000000000000000     0 FUNC    GLOBAL DEFAULT  UND mktemp@GLIBC_2.2.5 (2)",
            SymbolTableKind::Dynamic,
        )
        .unwrap();
        assert_eq!(s.name, "mktemp");
        assert_eq!(s.version.as_deref(), Some("GLIBC_2.2.5"));
        assert_eq!(s.sym_type, SymbolType::Func);
        assert_eq!(s.bind, SymbolBind::Global);
        assert!(s.is_undefined());
    }

    #[test]
    fn parses_file_symbol() {
        let s = parse_line(
            "     1: 0000000000000000     0 FILE    LOCAL  DEFAULT  ABS main.c",
            SymbolTableKind::Static,
        )
        .unwrap();
        assert_eq!(s.name, "main.c");
        assert_eq!(s.sym_type, SymbolType::File);
        assert_eq!(s.section, Some(SectionRef::Absolute));
    }

    #[test]
    fn default_version_marker() {
        let s = parse_line(
            "    12: 0000000000001139    22 FUNC    GLOBAL DEFAULT   14 foo@@VERS_1.0",
            SymbolTableKind::Dynamic,
        )
        .unwrap();
        assert_eq!(s.name, "foo");
        assert_eq!(s.version.as_deref(), Some("VERS_1.0"));
        assert_eq!(s.section, Some(SectionRef::Index(14)));
    }

    #[test]
    fn annotated_visibility() {
        let s = parse_line(
            "     5: 0000000000000000     0 FUNC    GLOBAL DEFAULT [VARIANT_PCS]  UND vfunc",
            SymbolTableKind::Dynamic,
        )
        .unwrap();
        assert_eq!(s.name, "vfunc");
        assert!(s.is_undefined());
    }

    #[test]
    fn skips_unnamed_and_banner() {
        assert!(
            parse_line(
                "     0: 0000000000000000     0 NOTYPE  LOCAL  DEFAULT  UND ",
                SymbolTableKind::Static
            )
            .is_none()
        );
        assert!(
            parse_line(
                "   Num:    Value          Size Type    Bind   Vis      Ndx Name",
                SymbolTableKind::Static
            )
            .is_none()
        );
    }

    #[test]
    fn banner_table_name() {
        assert_eq!(
            table_name("Symbol table '.dynsym' contains 7 entries:"),
            Some(".dynsym")
        );
        assert_eq!(table_name("Section Headers:"), None);
    }
}
