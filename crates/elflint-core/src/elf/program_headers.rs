//! `Program Headers:` table grammar (`readelf -W -l`).

use crate::elf::model::{Flags, ProgramHeader};

/// Parses one program header row:
///
/// ```text
///   GNU_STACK  0x000000 0x0000000000000000 0x0000000000000000 0x000000 0x000000 RWE 0x10
/// ```
///
/// The flag column is padded (`R E`), so everything between the sixth
/// field and the trailing alignment is folded into the flag set.
pub fn parse_line(line: &str) -> Option<ProgramHeader> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 8 {
        return None;
    }
    if !fields[1..6].iter().all(|f| f.starts_with("0x")) {
        return None;
    }
    let align = fields.len() - 1;
    if !fields[align].starts_with("0x") {
        return None;
    }

    Some(ProgramHeader {
        name: fields[0].to_string(),
        flags: Flags::new(&fields[6..align].concat()),
    })
}
