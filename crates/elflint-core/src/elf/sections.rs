//! `Section Headers:` table grammar (`readelf -W -S`).

use crate::elf::model::{Flags, Section};

/// Parses one section header row:
///
/// ```text
///   [ 1] .text  PROGBITS  0000000000000000 000040 000015 00  AX  0   0  1
/// ```
///
/// Returns `None` for the column banner, for rows with an empty name (the
/// `NULL` entry) and for anything that does not fit the layout.
pub fn parse_line(line: &str) -> Option<Section> {
    let rest = line.trim_start().strip_prefix('[')?;
    let (nr, rest) = rest.split_once(']')?;
    nr.trim().parse::<u32>().ok()?;

    // The name column directly follows "] "; an unnamed section leaves the
    // column blank and the row continues with padding.
    let rest = rest.strip_prefix(' ')?;
    if rest.starts_with(char::is_whitespace) {
        return None;
    }

    let fields: Vec<&str> = rest.split_whitespace().collect();
    // name type addr off size es [flg] lk inf al
    let flags = match fields.len() {
        9 => "",
        10 => fields[6],
        _ => return None,
    };

    Some(Section {
        name: fields[0].to_string(),
        size: u64::from_str_radix(fields[4], 16).ok()?,
        flags: Flags::new(flags),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_row_with_flags() {
        let s = parse_line(
            "  [ 1] .text             PROGBITS        0000000000000000 000040 000015 00  AX  0   0  1",
        )
        .unwrap();
        assert_eq!(s.name, ".text");
        assert_eq!(s.size, 21);
        assert_eq!(s.flags, "AX");
    }

    #[test]
    fn parses_rows_with_and_without_flags() {
        let s = parse_line(
            "  [ 9] .comment          PROGBITS        0000000000000000 000055 00002c 01  MS  0   0  1",
        )
        .unwrap();
        assert_eq!(s.flags, "MS");

        let s = parse_line(
            "  [12] .gnu.lto_.symtab.0 PROGBITS       0000000000000000 0001a0 000010 00      0   0  1",
        )
        .unwrap();
        assert_eq!(s.name, ".gnu.lto_.symtab.0");
        assert_eq!(s.size, 16);
        assert_eq!(s.flags, "");
    }

    #[test]
    fn skips_null_entry_and_banner() {
        assert!(
            parse_line(
                "  [ 0]                   NULL            0000000000000000 000000 000000 00      0   0  0"
            )
            .is_none()
        );
        assert!(
            parse_line(
                "  [Nr] Name              Type            Address          Off    Size   ES Flg Lk Inf Al"
            )
            .is_none()
        );
    }

    #[test]
    fn three_digit_index_keeps_name() {
        let s = parse_line(
            "  [100] .text.hot        PROGBITS        0000000000000000 000040 000001 00  AX  0   0  1",
        )
        .unwrap();
        assert_eq!(s.name, ".text.hot");
    }
}
