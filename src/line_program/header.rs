use crate::cursor::Cursor;

/// Per-unit parameters that govern how the VM (`super::vm`) interprets the
/// opcode stream that follows. Read-only once parsed.
#[derive(Debug, Clone)]
pub struct LineProgramHeader {
    pub version: u16,
    pub min_insn_len: u8,
    pub default_is_stmt: bool,
    pub line_base: i8,
    pub line_range: u8,
    pub opcode_base: u8,
    pub standard_opcode_lengths: Vec<u8>,
    pub include_dirs: Vec<String>,
    pub file_list: Vec<String>,
}

/// Result of attempting to parse one compilation unit's header from the
/// current cursor position, which must sit at the unit's `unit_length`
/// field.
pub enum UnitHeader {
    /// `unit_length == 0`, or the declared length runs past the end of the
    /// section: nothing further in the section can be trusted, so the scan
    /// stops here rather than attempting a truncated unit.
    EndOfSection,
    /// The header or its declared length is malformed (over-length header,
    /// `line_range == 0`, truncated buffer). The unit is abandoned; the
    /// caller should resume parsing at `unit_end`.
    Malformed { unit_end: usize },
    /// A usable header. `unit_end` is the absolute offset one past this
    /// unit's last byte, where the VM must stop (and where the section
    /// cursor resumes for the next unit).
    Parsed {
        header: LineProgramHeader,
        unit_end: usize,
    },
}

/// Returns the basename of a path: the portion after the last `/` or `\`.
fn basename(path: &str) -> String {
    path.rsplit(['/', '\\']).next().unwrap_or(path).to_string()
}

pub fn parse_unit_header(cur: &mut Cursor) -> UnitHeader {
    let unit_start = cur.pos();
    let unit_length = cur.read_u32();
    if unit_length == 0 {
        return UnitHeader::EndOfSection;
    }
    let unit_end = unit_start + 4 + unit_length as usize;
    if unit_end > cur.len() {
        return UnitHeader::EndOfSection;
    }

    let version = cur.read_u16();
    let header_length = cur.read_u32();
    let header_start = cur.pos();
    let header_end = header_start + header_length as usize;
    if header_end > unit_end || header_end > cur.len() {
        return UnitHeader::Malformed { unit_end };
    }

    let min_insn_len = cur.read_u8();
    let default_is_stmt = cur.read_u8() != 0;
    let line_base = cur.read_i8();
    let line_range = cur.read_u8();
    let opcode_base = cur.read_u8();

    if line_range == 0 {
        return UnitHeader::Malformed { unit_end };
    }

    let mut standard_opcode_lengths = Vec::with_capacity(opcode_base.saturating_sub(1) as usize);
    for _ in 0..opcode_base.saturating_sub(1) {
        if cur.pos() >= header_end {
            break;
        }
        standard_opcode_lengths.push(cur.read_u8());
    }

    let mut include_dirs = Vec::new();
    while cur.pos() < header_end {
        let dir = cur.read_cstr();
        if dir.is_empty() {
            break;
        }
        include_dirs.push(String::from_utf8_lossy(dir).into_owned());
    }

    let mut file_list = Vec::new();
    while cur.pos() < header_end {
        let name = cur.read_cstr();
        if name.is_empty() {
            break;
        }
        let name = String::from_utf8_lossy(name).into_owned();
        let dir_index = cur.read_uleb128();
        let _mtime = cur.read_uleb128();
        let _len = cur.read_uleb128();

        let full_path = if dir_index > 0 {
            match include_dirs.get((dir_index - 1) as usize) {
                Some(dir) if !dir.is_empty() => format!("{dir}/{name}"),
                _ => name,
            }
        } else {
            name
        };
        file_list.push(basename(&full_path));
    }

    // The header length is authoritative regardless of what we actually
    // consumed — a producer may pad or a parse bug may under/over-read.
    cur.seek(header_end);

    UnitHeader::Parsed {
        header: LineProgramHeader {
            version,
            min_insn_len,
            default_is_stmt,
            line_base,
            line_range,
            opcode_base,
            standard_opcode_lengths,
            include_dirs,
            file_list,
        },
        unit_end,
    }
}
