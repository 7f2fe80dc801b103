use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace, warn};

use crate::config::Config;
use crate::elf::invoke::{self, ToolOutput};
use crate::elf::model::{
    DynamicEntry, DynamicSectionInfo, ElfFile, NonElfMember, ParseResult, ProgramHeader,
    ProgramHeaderInfo, SectionInfo, Symbol, SymbolTableInfo, SymbolTableKind,
};
use crate::elf::{dynamic, program_headers, sections, symbols};
use crate::error::Result;

/// Install paths that name a shared library.
static SHLIB_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/lib(64)?/[^/]+\.so(\.[0-9]+)*$").expect("static shared library regex")
});

const NOT_ELF_MARKER: &str = "Not an ELF file";
const HEADER_FAILURE_MARKER: &str = "Failed to read file header";

/// Derives the file-class flags from the logical install path.
///
/// Returns `(is_archive, is_shared_library)`; the two are never both set.
pub fn file_class(logical_path: &str) -> (bool, bool) {
    let is_archive = logical_path.ends_with(".a");
    let is_shared_library = !is_archive && SHLIB_PATH.is_match(logical_path);
    (is_archive, is_shared_library)
}

/// Invokes the introspection utility on `content_path` and builds the
/// structural model.
///
/// `logical_path` is the installed name of the file; it decides the file
/// class and may differ from `content_path` for extracted packages.
///
/// Returns `Err` only when the utility cannot be started at all.
pub fn parse(content_path: &Path, logical_path: &str, config: &Config) -> Result<ParseResult> {
    let (is_archive, is_shared_library) = file_class(logical_path);

    if let Err(e) = std::fs::metadata(content_path) {
        let reason = format!("'{}': {e}", content_path.display());
        warn!(path = logical_path, %reason, "input is not readable");
        return Ok(ParseResult::failed(is_archive, is_shared_library, reason));
    }

    let output = invoke::run_readelf(config, content_path)?;
    Ok(parse_output(logical_path, &output))
}

/// Builds the structural model from captured utility output.
pub fn parse_output(logical_path: &str, output: &ToolOutput) -> ParseResult {
    let (is_archive, is_shared_library) = file_class(logical_path);

    if output.timed_out {
        return ParseResult::failed(is_archive, is_shared_library, output.stderr.trim());
    }
    if let Some(error) = &output.capture_error {
        warn!(path = logical_path, %error, "introspection output is incomplete");
        return ParseResult::failed(is_archive, is_shared_library, error.as_str());
    }

    let (non_elf_members, errors) = split_stderr(&output.stderr);

    let mut parser = DumpParser::default();
    for line in output.stdout.lines() {
        parser.feed(line);
    }
    let dump = parser.finish();
    let (elf_files, non_elf_members) = reconcile(dump.members, non_elf_members);

    // A failing exit is only fatal when the tool complained about something
    // other than foreign archive members and produced no usable structure.
    if !output.success && !errors.is_empty() && elf_files.is_empty() {
        return ParseResult::failed(is_archive, is_shared_library, errors.join("\n"));
    }
    if !output.success
        && errors.is_empty()
        && non_elf_members.is_empty()
        && elf_files.is_empty()
    {
        return ParseResult::failed(
            is_archive,
            is_shared_library,
            "introspection utility failed without a diagnostic",
        );
    }
    if !errors.is_empty() {
        warn!(path = logical_path, errors = ?errors, "introspection utility reported errors");
    }

    debug!(
        path = logical_path,
        elf_files = elf_files.len(),
        non_elf = non_elf_members.len(),
        symbols = dump.symbols.len(),
        "parsed introspection output"
    );

    ParseResult {
        is_archive,
        is_shared_library,
        parse_failure: None,
        non_elf_members,
        section_info: SectionInfo { elf_files },
        symbol_table_info: SymbolTableInfo::new(dump.symbols),
        program_header_info: ProgramHeaderInfo {
            headers: dump.headers,
        },
        dynamic_section_info: DynamicSectionInfo::new(dump.dynamic),
    }
}

/// Separates complaints about non-ELF content from other diagnostics.
///
/// readelf words these two ways. A member too short to hold an ELF
/// identity yields `lib.a(member): Failed to read file header`; anything
/// longer yields a nameless `Not an ELF file` line, and its name is only
/// known from the `File:` banner on stdout. Other diagnostics are
/// deduplicated, keeping first-seen order.
fn split_stderr(stderr: &str) -> (Vec<NonElfMember>, Vec<String>) {
    let mut non_elf = Vec::new();
    let mut errors: Vec<String> = Vec::new();

    for line in stderr.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(pos) = line.find(NOT_ELF_MARKER) {
            non_elf.push(NonElfMember {
                name: member_name(&line[..pos]),
                message: line[pos..].to_string(),
            });
        } else if let Some(pos) = line.find(HEADER_FAILURE_MARKER) {
            let name = member_name(&line[..pos]);
            let message = match &name {
                Some(name) => format!("{name}: {}", &line[pos..]),
                None => line[pos..].to_string(),
            };
            non_elf.push(NonElfMember { name, message });
        } else if !errors.iter().any(|e| e == line) {
            errors.push(line.to_string());
        }
    }

    (non_elf, errors)
}

/// Drops banner-only members that readelf rejected and names the nameless
/// rejections after them, in order.
///
/// A member whose banner is followed by structure is ELF and is kept.
fn reconcile(
    members: Vec<Member>,
    mut non_elf: Vec<NonElfMember>,
) -> (Vec<ElfFile>, Vec<NonElfMember>) {
    let mut elf_files = Vec::with_capacity(members.len());

    for member in members {
        if member.has_structure {
            elf_files.push(member.file);
            continue;
        }
        let name = member.file.member.as_deref();
        if name.is_some() && non_elf.iter().any(|m| m.name.as_deref() == name) {
            trace!(member = ?name, "dropping rejected member");
            continue;
        }
        if let Some(record) = non_elf.iter_mut().find(|m| m.name.is_none()) {
            trace!(member = ?name, "naming rejected member");
            record.name = member.file.member;
            continue;
        }
        elf_files.push(member.file);
    }

    (elf_files, non_elf)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// No member has started yet.
    OutsideMember,
    /// Inside a member, between tables.
    InMember,
    InSectionHeaders,
    InProgramHeaders,
    InDynamicSection,
    InSymbolTable(SymbolTableKind),
}

/// A member as seen on stdout, before stderr is taken into account.
#[derive(Debug)]
struct Member {
    file: ElfFile,
    /// A table or a "There are no ..." notice followed the banner.
    has_structure: bool,
}

#[derive(Debug, Default)]
struct Dump {
    members: Vec<Member>,
    symbols: Vec<Symbol>,
    headers: Vec<ProgramHeader>,
    dynamic: Vec<DynamicEntry>,
}

/// Line-oriented state machine over the combined readelf dump.
///
/// Transitions are driven by readelf's banner lines; each table state
/// delegates rows to its own grammar module.
#[derive(Debug)]
struct DumpParser {
    state: State,
    current: Option<Member>,
    dump: Dump,
}

impl Default for DumpParser {
    fn default() -> Self {
        Self {
            state: State::OutsideMember,
            current: None,
            dump: Dump::default(),
        }
    }
}

impl DumpParser {
    fn feed(&mut self, line: &str) {
        let trimmed = line.trim();

        if let Some(file) = trimmed.strip_prefix("File: ") {
            self.start_member(member_name(file));
            return;
        }
        if trimmed == "Section Headers:" {
            self.enter(State::InSectionHeaders);
            return;
        }
        if trimmed == "Program Headers:" {
            self.enter(State::InProgramHeaders);
            return;
        }
        if trimmed.starts_with("Dynamic section at offset") {
            self.enter(State::InDynamicSection);
            return;
        }
        if let Some(name) = symbols::table_name(trimmed) {
            self.enter(State::InSymbolTable(SymbolTableKind::from_table_name(name)));
            return;
        }
        if trimmed.starts_with("There are ") || trimmed.starts_with("There is no ") {
            self.mark_structure();
            self.leave_table();
            return;
        }
        if trimmed.is_empty()
            || trimmed.starts_with("Key to Flags:")
            || trimmed.starts_with("Section to Segment mapping:")
        {
            self.leave_table();
            return;
        }

        match self.state {
            State::OutsideMember | State::InMember => {}
            State::InSectionHeaders => {
                if let Some(section) = sections::parse_line(line) {
                    self.member().file.sections.push(section);
                }
            }
            State::InProgramHeaders => {
                if let Some(header) = program_headers::parse_line(line) {
                    self.dump.headers.push(header);
                }
            }
            State::InDynamicSection => {
                if let Some(entry) = dynamic::parse_line(line) {
                    self.dump.dynamic.push(entry);
                }
            }
            State::InSymbolTable(kind) => {
                if let Some(symbol) = symbols::parse_line(line, kind) {
                    self.dump.symbols.push(symbol);
                }
            }
        }
    }

    fn enter(&mut self, state: State) {
        trace!(from = ?self.state, to = ?state, "readelf dump transition");
        // Non-archive dumps carry no `File:` banner; the first table opens
        // the implicit member.
        if self.state == State::OutsideMember {
            self.start_member(None);
        }
        self.mark_structure();
        self.state = state;
    }

    fn leave_table(&mut self) {
        if self.state != State::OutsideMember {
            self.state = State::InMember;
        }
    }

    fn start_member(&mut self, name: Option<String>) {
        self.flush();
        trace!(member = ?name, "readelf dump member");
        self.current = Some(Member {
            file: ElfFile {
                member: name,
                sections: Vec::new(),
            },
            has_structure: false,
        });
        self.state = State::InMember;
    }

    fn member(&mut self) -> &mut Member {
        self.current.get_or_insert_with(|| Member {
            file: ElfFile::default(),
            has_structure: true,
        })
    }

    fn mark_structure(&mut self) {
        if let Some(member) = self.current.as_mut() {
            member.has_structure = true;
        }
    }

    fn flush(&mut self) {
        if let Some(member) = self.current.take() {
            self.dump.members.push(member);
        }
    }

    fn finish(mut self) -> Dump {
        self.flush();
        self.dump
    }
}
