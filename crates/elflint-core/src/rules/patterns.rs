//! Toolchain-dependent name patterns used by the rules.
//!
//! Section names and dynamic tags drift between toolchain releases, so they
//! live in one versioned table instead of inside individual rules. When a
//! name is ambiguous the rules stay silent.

use std::sync::LazyLock;

use regex::Regex;

/// Bump when any table below changes meaning.
pub const PATTERN_TABLE_VERSION: &str = "2024.2";

pub struct PatternTable {
    /// Section name prefixes that mark compiler-intermediate (LTO) content.
    pub lto_section_prefixes: &'static [&'static str],
    /// Section name prefixes that carry native code or initialised data.
    pub native_section_prefixes: &'static [&'static str],
    /// Constructor / initialiser arrays, including priority-suffixed names.
    pub init_array_sections: &'static [&'static str],
    /// Section name prefixes of DWARF debug info, including the copies GCC
    /// keeps beside LTO bytecode.
    pub debug_section_prefixes: &'static [&'static str],
    /// Sections pointing at, or embedding, separate debug info.
    pub debug_companion_sections: &'static [&'static str],
    /// Dynamic tags that alone mark text relocations.
    pub textrel_tags: &'static [&'static str],
    /// Dynamic tags whose value lists flags, one of which may be `TEXTREL`.
    pub textrel_flag_tags: &'static [&'static str],
    /// Archive member suffixes of non-ELF formats that are expected there.
    pub foreign_member_suffixes: &'static [&'static str],

    pub valid_soname: Regex,
    pub mktemp_call: Regex,
    pub setuid_call: Regex,
    pub setgroups_call: Regex,
    pub gethostbyname_call: Regex,
}

fn call(name: &str) -> Regex {
    Regex::new(&format!("^(?:{name})$")).expect("static call pattern")
}

pub static PATTERNS: LazyLock<PatternTable> = LazyLock::new(|| PatternTable {
    lto_section_prefixes: &[".gnu.lto_", ".gnu.debuglto_", ".llvm.lto", ".llvmbc"],
    native_section_prefixes: &[".text", ".data"],
    init_array_sections: &[
        ".preinit_array",
        ".init_array",
        ".fini_array",
        ".ctors",
        ".dtors",
    ],
    debug_section_prefixes: &[".debug_", ".zdebug_", ".gnu.debuglto_.debug_"],
    debug_companion_sections: &[".gnu_debuglink", ".gnu_debugdata"],
    textrel_tags: &["TEXTREL"],
    textrel_flag_tags: &["FLAGS"],
    foreign_member_suffixes: &[".bc", ".bca"],

    valid_soname: Regex::new(r"(\.so\.\d+(\.\d+)*|\d\.so)$").expect("static soname pattern"),
    mktemp_call: call("mktemp"),
    setuid_call: call(r"set(?:res|e)?uid"),
    setgroups_call: call(r"(?:ini|se)tgroups"),
    gethostbyname_call: call(
        r"gethostbyname|gethostbyname2|gethostbyaddr|gethostbyname_r|gethostbyname2_r|gethostbyaddr_r",
    ),
});

impl PatternTable {
    pub fn is_lto_section(&self, name: &str) -> bool {
        has_prefix(name, self.lto_section_prefixes)
    }

    /// A section that makes an archive usable without LTO: code, data or
    /// an initialiser array. Empty sections do not count.
    pub fn is_native_content(&self, name: &str, size: u64) -> bool {
        size > 0
            && (has_prefix(name, self.native_section_prefixes)
                || has_prefix(name, self.init_array_sections))
    }

    pub fn is_debug_section(&self, name: &str) -> bool {
        has_prefix(name, self.debug_section_prefixes)
    }

    pub fn is_debug_companion(&self, name: &str) -> bool {
        self.debug_companion_sections.iter().any(|s| *s == name)
    }

    pub fn is_foreign_member(&self, name: &str) -> bool {
        self.foreign_member_suffixes.iter().any(|s| name.ends_with(s))
    }
}

fn has_prefix(name: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|p| name.starts_with(p))
}
