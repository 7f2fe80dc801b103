use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    /// Single-letter tag used in text output.
    pub fn letter(self) -> char {
        match self {
            Severity::Info => 'I',
            Severity::Warning => 'W',
            Severity::Error => 'E',
        }
    }
}

/// Whether a finding names the file it was raised for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    File,
    Package,
}

/// Identifiers of every rule, in evaluation order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(into = "String", try_from = "String")]
pub enum RuleId {
    ReadelfFailed,
    NotAnElfFile,
    LtoBytecode,
    LtoNoTextInArchive,
    StaticLibraryWithoutSymtab,
    StaticLibraryWithoutDebuginfo,
    ExecutableStack,
    NoSoname,
    InvalidSoname,
    ShlibWithNonPicCode,
    NoLdconfigSymlink,
    ShlibPolicyNameError,
    SharedLibraryWithoutDependencyInformation,
    CallToMktemp,
    MissingCallToSetgroupsBeforeSetuid,
    BinaryOrShlibCallsGethostbyname,
}

/// Static description of one rule.
#[derive(Debug, Clone, Copy)]
pub struct RuleInfo {
    pub id: RuleId,
    pub name: &'static str,
    pub severity: Severity,
    pub scope: Scope,
    pub description: &'static str,
}

const fn rule(
    id: RuleId,
    name: &'static str,
    severity: Severity,
    description: &'static str,
) -> RuleInfo {
    RuleInfo {
        id,
        name,
        severity,
        scope: Scope::File,
        description,
    }
}

pub const CATALOG: &[RuleInfo] = &[
    rule(
        RuleId::ReadelfFailed,
        "readelf-failed",
        Severity::Error,
        "Executing readelf on this file failed, all checks could not be run.",
    ),
    rule(
        RuleId::NotAnElfFile,
        "not-an-elf-file",
        Severity::Error,
        "The file, or a member of this archive, looks like a binary but is not \
         an ELF object. Only the ELF members were checked.",
    ),
    rule(
        RuleId::LtoBytecode,
        "lto-bytecode",
        Severity::Info,
        "This executable contains a LTO section. LTO bytecode is not portable \
         and should not be distributed in static libraries or object files.",
    ),
    rule(
        RuleId::LtoNoTextInArchive,
        "lto-no-text-in-archive",
        Severity::Error,
        "This archive does not contain a non-empty .text section. The archive \
         was not created with -ffat-lto-objects option.",
    ),
    rule(
        RuleId::StaticLibraryWithoutSymtab,
        "static-library-without-symtab",
        Severity::Error,
        "The static library doesn't contain any symbols and thus can't be \
         linked against. This may indicate that it was stripped.",
    ),
    rule(
        RuleId::StaticLibraryWithoutDebuginfo,
        "static-library-without-debuginfo",
        Severity::Error,
        "The static library doesn't contain any debuginfo. Binaries linking \
         against this static library can't be properly debugged.",
    ),
    rule(
        RuleId::ExecutableStack,
        "executable-stack",
        Severity::Error,
        "The binary declares the stack as executable. Executable stack is \
         usually an error as it is only needed if the code contains GCC \
         trampolines or similar constructs which uses code on the stack.",
    ),
    rule(
        RuleId::NoSoname,
        "no-soname",
        Severity::Warning,
        "The library has no soname. You can add one by passing -Wl,-soname \
         to the linker.",
    ),
    rule(
        RuleId::InvalidSoname,
        "invalid-soname",
        Severity::Error,
        "The soname of the library is neither of the form lib<libname>.so.<major> \
         nor lib<libname>-<major>.so.",
    ),
    rule(
        RuleId::ShlibWithNonPicCode,
        "shlib-with-non-pic-code",
        Severity::Error,
        "The listed shared libraries contain object code that was compiled \
         without -fPIC. All object code in shared libraries should be \
         recompiled separately from the static libraries with the -fPIC option.",
    ),
    rule(
        RuleId::NoLdconfigSymlink,
        "no-ldconfig-symlink",
        Severity::Error,
        "The package should not only include the shared library itself, but \
         also the symbolic link which ldconfig would produce.",
    ),
    RuleInfo {
        id: RuleId::ShlibPolicyNameError,
        name: "shlib-policy-name-error",
        severity: Severity::Error,
        scope: Scope::Package,
        description: "Your package contains a single shared library but is not \
         named after its SONAME.",
    },
    rule(
        RuleId::SharedLibraryWithoutDependencyInformation,
        "shared-library-without-dependency-information",
        Severity::Error,
        "The listed shared library doesn't include information about which \
         other libraries it depends on. Make sure you use gcc -shared to link \
         the library.",
    ),
    rule(
        RuleId::CallToMktemp,
        "call-to-mktemp",
        Severity::Error,
        "This executable calls mktemp. As advised by the manpage (mktemp(3)), \
         this function should be avoided. Some implementations are deeply \
         insecure, and there is a race condition between the time of check \
         and time of use (TOCTOU). See the mkstemp(3) function instead.",
    ),
    rule(
        RuleId::MissingCallToSetgroupsBeforeSetuid,
        "missing-call-to-setgroups-before-setuid",
        Severity::Error,
        "This executable is calling setuid and setgid without setgroups or \
         initgroups. There is a high probability this means it didn't relinquish \
         all groups, and this would be a potential security issue to be fixed.",
    ),
    rule(
        RuleId::BinaryOrShlibCallsGethostbyname,
        "binary-or-shlib-calls-gethostbyname",
        Severity::Warning,
        "The binary calls gethostbyname. Please port your code to use getaddrinfo().",
    ),
];

impl RuleId {
    pub fn info(self) -> &'static RuleInfo {
        // CATALOG is declared in enum order.
        &CATALOG[self as usize]
    }

    pub fn as_str(self) -> &'static str {
        self.info().name
    }

    pub fn severity(self) -> Severity {
        self.info().severity
    }

    pub fn from_name(name: &str) -> Option<Self> {
        CATALOG.iter().find(|r| r.name == name).map(|r| r.id)
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RuleId> for String {
    fn from(id: RuleId) -> Self {
        id.as_str().to_string()
    }
}

impl TryFrom<String> for RuleId {
    type Error = String;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        RuleId::from_name(&name).ok_or_else(|| format!("unknown rule: {name}"))
    }
}

/// Explanation text for `name`, if it names a rule.
pub fn explain(name: &str) -> Option<&'static str> {
    RuleId::from_name(name).map(|id| id.info().description)
}
