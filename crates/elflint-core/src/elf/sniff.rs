//! Minimal content sniffing.
//!
//! Produces libmagic-style type strings for the classifier. Only the
//! distinctions the classifier needs are made: ELF images, `ar` archives,
//! and bitcode content that merely looks like either.

use std::io::{Cursor, Read};

use goblin::elf::header::{
    EI_CLASS, EI_DATA, ELFCLASS32, ELFCLASS64, ELFDATA2LSB, ET_CORE, ET_DYN, ET_EXEC, ET_REL,
};
use goblin::elf::{Elf, Header};

const AR_MAGIC: &[u8] = b"!<arch>\n";
const BITCODE_MAGIC: &[u8] = b"BC\xc0\xde";
const BITCODE_WRAPPER_MAGIC: &[u8] = b"\xde\xc0\x17\x0b";

/// Index members some `ar` flavours keep beside the real ones.
const INDEX_MEMBERS: &[&[u8]] = &[b"/", b"//", b"/SYM64/", b"__.SYMDEF", b"__.SYMDEF SORTED"];

/// Describes `bytes` in the vocabulary of `file(1)`.
pub fn describe(bytes: &[u8]) -> String {
    if is_bitcode(bytes) {
        return "LLVM IR bitcode".to_string();
    }

    match infer::get(bytes) {
        Some(kind) if kind.extension() == "elf" => describe_elf(bytes),
        Some(kind) if kind.extension() == "ar" || bytes.starts_with(AR_MAGIC) => {
            describe_archive(bytes)
        }
        Some(kind) => kind.mime_type().to_string(),
        None if bytes.starts_with(AR_MAGIC) => describe_archive(bytes),
        None => "data".to_string(),
    }
}

fn is_bitcode(bytes: &[u8]) -> bool {
    bytes.starts_with(BITCODE_MAGIC) || bytes.starts_with(BITCODE_WRAPPER_MAGIC)
}

fn describe_elf(bytes: &[u8]) -> String {
    match Elf::parse_header(bytes) {
        Ok(header) => elf_summary(&header),
        Err(_) => "ELF invalid header".to_string(),
    }
}

fn elf_summary(header: &Header) -> String {
    let class = match header.e_ident[EI_CLASS] {
        ELFCLASS32 => "32-bit",
        ELFCLASS64 => "64-bit",
        _ => "invalid class",
    };
    let order = if header.e_ident[EI_DATA] == ELFDATA2LSB {
        "LSB"
    } else {
        "MSB"
    };
    let kind = match header.e_type {
        ET_REL => "relocatable",
        ET_EXEC => "executable",
        ET_DYN => "shared object",
        ET_CORE => "core file",
        _ => "unknown type",
    };
    format!("ELF {class} {order} {kind}")
}

fn describe_archive(bytes: &[u8]) -> String {
    let magics = member_magics(bytes);
    if !magics.is_empty() && magics.iter().all(|m| is_bitcode(m)) {
        "current ar archive, LLVM IR bitcode".to_string()
    } else {
        "current ar archive".to_string()
    }
}

/// Leading bytes of each regular member. Reading stops at the first
/// malformed header.
fn member_magics(bytes: &[u8]) -> Vec<Vec<u8>> {
    let mut archive = ar::Archive::new(Cursor::new(bytes));
    let mut magics = Vec::new();

    while let Some(Ok(mut entry)) = archive.next_entry() {
        let identifier = entry.header().identifier();
        if INDEX_MEMBERS.iter().any(|m| *m == identifier) {
            continue;
        }
        let mut magic = Vec::with_capacity(BITCODE_MAGIC.len());
        if entry
            .by_ref()
            .take(BITCODE_MAGIC.len() as u64)
            .read_to_end(&mut magic)
            .is_err()
        {
            break;
        }
        magics.push(magic);
    }

    magics
}
