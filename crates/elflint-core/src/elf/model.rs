//! Structural model of one analysed file.
//!
//! Everything here is plain data produced by `elf::parse` and read by the
//! rule engine. Identity is positional: collections keep the exact order in
//! which readelf emitted the records.

use std::collections::BTreeMap;
use std::ops::Index;

use regex::Regex;

/// Set of single-character flags (`AX`, `RWE`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flags(String);

impl Flags {
    /// Builds a flag set from readelf text, dropping the padding spaces
    /// readelf uses inside columns such as `R E`.
    pub fn new(raw: &str) -> Self {
        Self(raw.chars().filter(|c| !c.is_whitespace()).collect())
    }

    pub fn contains(&self, flag: char) -> bool {
        self.0.contains(flag)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq<&str> for Flags {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub size: u64,
    pub flags: Flags,
}

/// One ELF image: a plain object, executable or shared library, or one
/// ELF member of a static archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElfFile {
    /// Archive member name, `None` for non-archive inputs.
    pub member: Option<String>,
    pub sections: Vec<Section>,
}

impl ElfFile {
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Section> {
        self.sections.iter()
    }
}

impl Index<usize> for ElfFile {
    type Output = Section;

    fn index(&self, index: usize) -> &Section {
        &self.sections[index]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionInfo {
    pub elf_files: Vec<ElfFile>,
}

impl SectionInfo {
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.elf_files.iter().flat_map(|f| f.sections.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolType {
    NoType,
    Object,
    Func,
    Section,
    File,
    Common,
    Tls,
    IFunc,
    Other(String),
}

impl SymbolType {
    /// Accepts both the short readelf vocabulary (`FUNC`) and the
    /// `STT_`-prefixed long form.
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix("STT_").unwrap_or(raw) {
            "NOTYPE" => Self::NoType,
            "OBJECT" => Self::Object,
            "FUNC" => Self::Func,
            "SECTION" => Self::Section,
            "FILE" => Self::File,
            "COMMON" => Self::Common,
            "TLS" => Self::Tls,
            "IFUNC" | "GNU_IFUNC" => Self::IFunc,
            other => Self::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolBind {
    Local,
    Global,
    Weak,
    Unique,
    Other(String),
}

impl SymbolBind {
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix("STB_").unwrap_or(raw) {
            "LOCAL" => Self::Local,
            "GLOBAL" => Self::Global,
            "WEAK" => Self::Weak,
            "UNIQUE" | "GNU_UNIQUE" => Self::Unique,
            other => Self::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolVisibility {
    Default,
    Internal,
    Hidden,
    Protected,
    Other(String),
}

impl SymbolVisibility {
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix("STV_").unwrap_or(raw) {
            "DEFAULT" => Self::Default,
            "INTERNAL" => Self::Internal,
            "HIDDEN" => Self::Hidden,
            "PROTECTED" => Self::Protected,
            other => Self::Other(other.to_string()),
        }
    }
}

/// The `Ndx` column of a symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionRef {
    Undefined,
    Absolute,
    Common,
    Index(u32),
    Other(String),
}

impl SectionRef {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "UND" => Self::Undefined,
            "ABS" => Self::Absolute,
            "COM" => Self::Common,
            other => other
                .parse()
                .map(Self::Index)
                .unwrap_or_else(|_| Self::Other(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolTableKind {
    Dynamic,
    Static,
    Other,
}

impl SymbolTableKind {
    pub fn from_table_name(name: &str) -> Self {
        match name {
            ".dynsym" => Self::Dynamic,
            ".symtab" => Self::Static,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    /// Symbol version (`GLIBC_2.2.5`), stripped from the readelf name.
    pub version: Option<String>,
    pub sym_type: SymbolType,
    pub bind: SymbolBind,
    pub visibility: SymbolVisibility,
    pub section: Option<SectionRef>,
    pub table: SymbolTableKind,
}

impl Symbol {
    pub fn is_undefined(&self) -> bool {
        matches!(self.section, Some(SectionRef::Undefined))
    }
}

/// All symbols of a file, in emission order, plus an index of the
/// function-typed entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTableInfo {
    pub symbols: Vec<Symbol>,
    functions: Vec<usize>,
}

impl SymbolTableInfo {
    pub fn new(symbols: Vec<Symbol>) -> Self {
        let functions = symbols
            .iter()
            .enumerate()
            .filter(|(_, s)| matches!(s.sym_type, SymbolType::Func | SymbolType::IFunc))
            .map(|(i, _)| i)
            .collect();
        Self { symbols, functions }
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn functions(&self) -> impl Iterator<Item = &Symbol> {
        self.functions.iter().map(|&i| &self.symbols[i])
    }

    /// Function symbols whose name contains a match for `pattern`.
    pub fn functions_matching<'a>(
        &'a self,
        pattern: &'a Regex,
    ) -> impl Iterator<Item = &'a Symbol> + 'a {
        self.functions().filter(move |s| pattern.is_match(&s.name))
    }

    pub fn calls(&self, pattern: &Regex) -> bool {
        self.functions_matching(pattern).next().is_some()
    }

    /// Undefined entries of `.dynsym`, the references the dynamic linker
    /// has to resolve at load time.
    pub fn imports(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols
            .iter()
            .filter(|s| s.table == SymbolTableKind::Dynamic && s.is_undefined())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramHeader {
    pub name: String,
    pub flags: Flags,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramHeaderInfo {
    pub headers: Vec<ProgramHeader>,
}

impl ProgramHeaderInfo {
    pub fn find(&self, name: &str) -> Option<&ProgramHeader> {
        self.headers.iter().find(|h| h.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicEntry {
    pub key: String,
    pub value: String,
}

/// Dynamic section as a multi-valued tag map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DynamicSectionInfo {
    pub sections: Vec<DynamicEntry>,
    by_key: BTreeMap<String, Vec<String>>,
    pub soname: Option<String>,
    pub needed: Vec<String>,
    pub rpath: Vec<String>,
    pub runpath: Vec<String>,
}

impl DynamicSectionInfo {
    pub fn new(sections: Vec<DynamicEntry>) -> Self {
        let mut info = Self::default();
        for entry in &sections {
            info.by_key
                .entry(entry.key.clone())
                .or_default()
                .push(entry.value.clone());

            let bracketed = bracketed(&entry.value);
            match (entry.key.as_str(), bracketed) {
                ("NEEDED", Some(v)) => info.needed.push(v.to_string()),
                ("SONAME", Some(v)) if info.soname.is_none() => info.soname = Some(v.to_string()),
                ("RPATH", Some(v)) => info.rpath.extend(split_search_path(v)),
                ("RUNPATH", Some(v)) => info.runpath.extend(split_search_path(v)),
                _ => {}
            }
        }
        info.sections = sections;
        info
    }

    /// Values recorded for `key`, in emission order. Unknown keys yield an
    /// empty slice.
    pub fn get(&self, key: &str) -> &[String] {
        self.by_key.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

impl Index<&str> for DynamicSectionInfo {
    type Output = [String];

    fn index(&self, key: &str) -> &[String] {
        self.get(key)
    }
}

/// Text between the first `[` and the following `]`.
fn bracketed(value: &str) -> Option<&str> {
    let start = value.find('[')? + 1;
    let end = start + value[start..].find(']')?;
    Some(&value[start..end])
}

fn split_search_path(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(':')
        .filter(|p| !p.is_empty())
        .map(str::to_string)
}

/// Archive member readelf refused to treat as ELF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonElfMember {
    pub name: Option<String>,
    pub message: String,
}

/// Root aggregate for one analysed file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseResult {
    pub is_archive: bool,
    pub is_shared_library: bool,
    pub parse_failure: Option<String>,
    pub non_elf_members: Vec<NonElfMember>,
    pub section_info: SectionInfo,
    pub symbol_table_info: SymbolTableInfo,
    pub program_header_info: ProgramHeaderInfo,
    pub dynamic_section_info: DynamicSectionInfo,
}

impl ParseResult {
    /// A result carrying only a failure reason; all collections are empty.
    pub fn failed(is_archive: bool, is_shared_library: bool, reason: impl Into<String>) -> Self {
        Self {
            is_archive,
            is_shared_library,
            parse_failure: Some(reason.into()),
            ..Default::default()
        }
    }

    pub fn parsing_failed_reason(&self) -> Option<&str> {
        self.parse_failure.as_deref()
    }

    pub fn elf_files(&self) -> &[ElfFile] {
        &self.section_info.elf_files
    }

    pub fn has_elf_content(&self) -> bool {
        !self.section_info.elf_files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, value: &str) -> DynamicEntry {
        DynamicEntry {
            key: key.into(),
            value: value.into(),
        }
    }

    fn symbol(name: &str, sym_type: SymbolType) -> Symbol {
        Symbol {
            name: name.into(),
            version: None,
            sym_type,
            bind: SymbolBind::Global,
            visibility: SymbolVisibility::Default,
            section: Some(SectionRef::Index(1)),
            table: SymbolTableKind::Static,
        }
    }

    #[test]
    fn flags_drop_column_padding() {
        let flags = Flags::new("R E");
        assert_eq!(flags, "RE");
        assert!(flags.contains('E'));
        assert!(!flags.contains('W'));
    }

    #[test]
    fn vocabularies_normalize_to_one_enum() {
        assert_eq!(SymbolType::parse("STT_FUNC"), SymbolType::Func);
        assert_eq!(SymbolType::parse("GNU_IFUNC"), SymbolType::IFunc);
        assert_eq!(SymbolBind::parse("STB_WEAK"), SymbolBind::Weak);
        assert_eq!(SymbolBind::parse("GNU_UNIQUE"), SymbolBind::Unique);
        assert_eq!(
            SymbolVisibility::parse("STV_HIDDEN"),
            SymbolVisibility::Hidden
        );
        assert_eq!(
            SymbolType::parse("LOOS+0"),
            SymbolType::Other("LOOS+0".into())
        );
    }

    #[test]
    fn section_refs() {
        assert_eq!(SectionRef::parse("UND"), SectionRef::Undefined);
        assert_eq!(SectionRef::parse("12"), SectionRef::Index(12));
        assert_eq!(SectionRef::parse("COM"), SectionRef::Common);
        assert_eq!(
            SectionRef::parse("PRC[0xff00]"),
            SectionRef::Other("PRC[0xff00]".into())
        );
    }

    #[test]
    fn function_lookup_skips_non_function_symbols() {
        let info = SymbolTableInfo::new(vec![
            symbol("main.c", SymbolType::File),
            symbol("main", SymbolType::Func),
        ]);
        let pattern = Regex::new("mai.").unwrap();
        let found: Vec<_> = info.functions_matching(&pattern).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "main");
    }

    #[test]
    fn dynamic_section_is_multi_valued() {
        let info = DynamicSectionInfo::new(vec![
            entry("NEEDED", "Shared library: [libc.so.6]"),
            entry("NEEDED", "Shared library: [libm.so.6]"),
            entry("SONAME", "Library soname: [libfoo.so.1]"),
            entry("RPATH", "Library rpath: [/opt/a]"),
            entry("RUNPATH", "Library runpath: [/opt/b:/opt/c]"),
            entry("NULL", "0x0"),
        ]);

        assert_eq!(info["NEEDED"].len(), 2);
        assert_eq!(info.needed, vec!["libc.so.6", "libm.so.6"]);
        assert_eq!(info.soname.as_deref(), Some("libfoo.so.1"));
        assert_eq!(info.rpath, vec!["/opt/a"]);
        assert_eq!(info.runpath, vec!["/opt/b", "/opt/c"]);
        assert_eq!(info.get("NULL"), ["0x0".to_string()]);
        assert!(info.get("TEXTREL").is_empty());
    }

    #[test]
    fn imports_come_from_the_dynamic_table() {
        let mut dynamic_ref = symbol("puts", SymbolType::Func);
        dynamic_ref.table = SymbolTableKind::Dynamic;
        dynamic_ref.section = Some(SectionRef::Undefined);
        let mut static_ref = symbol("puts", SymbolType::Func);
        static_ref.section = Some(SectionRef::Undefined);
        let mut dynamic_def = symbol("exported", SymbolType::Func);
        dynamic_def.table = SymbolTableKind::Dynamic;

        let info = SymbolTableInfo::new(vec![static_ref, dynamic_def, dynamic_ref]);
        let imports: Vec<_> = info.imports().map(|s| s.table).collect();
        assert_eq!(imports, vec![SymbolTableKind::Dynamic]);
    }

    #[test]
    fn failed_result_has_no_structure() {
        let result = ParseResult::failed(false, true, "boom");
        assert_eq!(result.parsing_failed_reason(), Some("boom"));
        assert!(!result.has_elf_content());
        assert!(result.symbol_table_info.is_empty());
        assert!(result.dynamic_section_info.is_empty());
    }
}
