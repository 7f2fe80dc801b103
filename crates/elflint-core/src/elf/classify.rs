//! Decides whether a file is worth handing to the introspection utility.

/// Input of the classifier: the content type reported by the sniffing
/// collaborator and the logical install path.
#[derive(Debug, Clone, Copy)]
pub struct ContentSniff<'a> {
    pub magic: &'a str,
    pub path: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Object,
    Archive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Skip,
    Analyze(Kind),
}

/// Archive-like formats that share `ar` framing but never hold ELF code.
const FOREIGN_EXTENSIONS: &[&str] = &[".bca"];

/// Content markers of foreign formats, matched case-insensitively.
const FOREIGN_MARKERS: &[&str] = &["bitcode"];

pub fn classify(sniff: &ContentSniff<'_>) -> Classification {
    let magic = sniff.magic.to_ascii_lowercase();

    if FOREIGN_MARKERS.iter().any(|m| magic.contains(m))
        || FOREIGN_EXTENSIONS.iter().any(|e| sniff.path.ends_with(e))
    {
        return Classification::Skip;
    }

    if magic.starts_with("elf") {
        Classification::Analyze(Kind::Object)
    } else if magic.contains("current ar archive") {
        Classification::Analyze(Kind::Archive)
    } else {
        Classification::Skip
    }
}
