use std::collections::BTreeSet;

use crate::config::Policy;

/// Package-level facts a rule may consult besides the parse result.
#[derive(Debug, Clone, Copy)]
pub struct FileContext<'a> {
    /// Installed path of the file, used in finding messages.
    pub logical_path: &'a str,
    pub package_name: &'a str,
    /// Logical paths of every entry in the package, the file itself included.
    pub siblings: &'a BTreeSet<String>,
    pub policy: &'a Policy,
}

impl<'a> FileContext<'a> {
    /// Directory part of the logical path, without the trailing slash.
    pub fn directory(&self) -> &'a str {
        self.logical_path
            .rsplit_once('/')
            .map(|(dir, _)| dir)
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_of_logical_path() {
        let siblings = BTreeSet::new();
        let policy = Policy::default();
        let ctx = FileContext {
            logical_path: "/lib64/libutil-2.29.so",
            package_name: "libfake",
            siblings: &siblings,
            policy: &policy,
        };
        assert_eq!(ctx.directory(), "/lib64");

        let ctx = FileContext {
            logical_path: "bare.so",
            ..ctx
        };
        assert_eq!(ctx.directory(), "");
    }
}
