//! Dynamic section grammar (`readelf -W -d`).

use crate::elf::model::DynamicEntry;

/// Parses one dynamic entry row:
///
/// ```text
///  0x0000000000000001 (NEEDED)             Shared library: [libc.so.6]
/// ```
pub fn parse_line(line: &str) -> Option<DynamicEntry> {
    let rest = line.trim_start();
    let (tag, rest) = rest.split_once(char::is_whitespace)?;
    if !tag.starts_with("0x") {
        return None;
    }
    let rest = rest.trim_start().strip_prefix('(')?;
    let (key, value) = rest.split_once(')')?;

    Some(DynamicEntry {
        key: key.to_string(),
        value: value.trim().to_string(),
    })
}
