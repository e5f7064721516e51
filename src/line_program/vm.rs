// The line-program virtual machine (§4.5): executes the opcode stream
// between a unit's header and `unit_end`, emitting rows through
// `LineHistory` and `RowFilter`.

use crate::cursor::Cursor;
use crate::data::LineEntry;
use crate::line_program::header::LineProgramHeader;
use crate::line_program::history::{make_entry, LineHistory, RowFilter};

const DW_LNE_END_SEQUENCE: u8 = 1;
const DW_LNE_SET_ADDRESS: u8 = 2;

const DW_LNS_COPY: u8 = 1;
const DW_LNS_ADVANCE_PC: u8 = 2;
const DW_LNS_ADVANCE_LINE: u8 = 3;
const DW_LNS_SET_FILE: u8 = 4;
const DW_LNS_SET_COLUMN: u8 = 5;
const DW_LNS_NEGATE_STMT: u8 = 6;
const DW_LNS_SET_BASIC_BLOCK: u8 = 7;

const NO_ADDRESS: u64 = u64::MAX;

struct Registers {
    address: u64,
    line: u32,
    is_stmt: bool,
    basic_block: bool,
    file_index: usize,
    sequence_base: u64,
}

impl Registers {
    fn initial(header: &LineProgramHeader) -> Self {
        Registers {
            address: 0,
            line: 1,
            is_stmt: header.default_is_stmt,
            basic_block: false,
            file_index: 0,
            sequence_base: NO_ADDRESS,
        }
    }
}

fn advance_line(line: u32, delta: i64) -> u32 {
    let new_line = line as i64 + delta;
    if new_line < 1 {
        1
    } else {
        new_line as u32
    }
}

/// Runs one unit's opcode stream to completion, appending accepted rows to
/// `out`. `history` is shared across the whole section, per §3's
/// "threaded across the entire section" rule.
pub fn run_unit(
    cur: &mut Cursor,
    header: &LineProgramHeader,
    unit_end: usize,
    history: &mut LineHistory,
    filter: &RowFilter,
    out: &mut Vec<LineEntry>,
) {
    let mut regs = Registers::initial(header);

    while cur.pos() < unit_end {
        let opcode = cur.read_u8();

        if opcode == 0 {
            run_extended(cur, header, &mut regs, history);
        } else if opcode < header.opcode_base {
            run_standard(cur, header, opcode, &mut regs, history, filter, out);
        } else {
            run_special(header, opcode, &mut regs, history, filter, out);
        }
    }

    cur.seek(unit_end);
}

fn run_extended(
    cur: &mut Cursor,
    header: &LineProgramHeader,
    regs: &mut Registers,
    history: &mut LineHistory,
) {
    let ex_len = cur.read_uleb128();
    if ex_len == 0 {
        return;
    }
    let ex_start = cur.pos();
    let ex_opcode = cur.read_u8();

    match ex_opcode {
        DW_LNE_END_SEQUENCE => {
            *regs = Registers::initial(header);
            history.reset();
        }
        DW_LNE_SET_ADDRESS => {
            let addr_bytes = (ex_len - 1) as usize;
            let address = if addr_bytes == 0 {
                read_set_address_fallback(cur)
            } else {
                cur.read_addr_bytes(addr_bytes)
            };
            regs.address = address;
            if regs.sequence_base == NO_ADDRESS {
                regs.sequence_base = address;
            }
        }
        _ => {
            let to_skip = ex_len - 1;
            cur.seek(ex_start + 1 + to_skip as usize);
        }
    }
    // The extended-opcode length is authoritative, same reasoning as the
    // unit header: force the cursor past the declared length regardless
    // of how much the handler actually consumed.
    cur.seek(ex_start + ex_len as usize);
}

#[cfg(feature = "set_address_quirk")]
fn read_set_address_fallback(cur: &mut Cursor) -> u64 {
    cur.read_u32() as u64
}

#[cfg(not(feature = "set_address_quirk"))]
fn read_set_address_fallback(cur: &mut Cursor) -> u64 {
    cur.read_addr_bytes(0)
}

#[allow(clippy::too_many_arguments)]
fn run_standard(
    cur: &mut Cursor,
    header: &LineProgramHeader,
    opcode: u8,
    regs: &mut Registers,
    history: &mut LineHistory,
    filter: &RowFilter,
    out: &mut Vec<LineEntry>,
) {
    match opcode {
        DW_LNS_COPY => {
            emit(header, regs, history, filter, out);
            regs.basic_block = false;
        }
        DW_LNS_ADVANCE_PC => {
            let adv = cur.read_uleb128();
            regs.address += adv * header.min_insn_len as u64;
        }
        DW_LNS_ADVANCE_LINE => {
            let delta = cur.read_sleb128();
            regs.line = advance_line(regs.line, delta);
        }
        DW_LNS_SET_FILE => {
            let f = cur.read_uleb128();
            let mut idx = if f == 0 { 0 } else { (f - 1) as usize };
            if idx >= header.file_list.len() {
                idx = header.file_list.len().saturating_sub(1);
            }
            regs.file_index = idx;
        }
        DW_LNS_SET_COLUMN => {
            cur.read_uleb128();
        }
        DW_LNS_NEGATE_STMT => {
            regs.is_stmt = !regs.is_stmt;
        }
        DW_LNS_SET_BASIC_BLOCK => {
            regs.basic_block = true;
        }
        other => {
            let idx = (other - 1) as usize;
            let arity = header
                .standard_opcode_lengths
                .get(idx)
                .copied()
                .unwrap_or(0);
            for _ in 0..arity {
                cur.read_uleb128();
            }
        }
    }
}

fn run_special(
    header: &LineProgramHeader,
    opcode: u8,
    regs: &mut Registers,
    history: &mut LineHistory,
    filter: &RowFilter,
    out: &mut Vec<LineEntry>,
) {
    let adj = (opcode - header.opcode_base) as i64;
    let line_range = header.line_range as i64;

    let line_delta = header.line_base as i64 + (adj % line_range);
    let addr_delta = (adj / line_range) * header.min_insn_len as i64;

    regs.line = advance_line(regs.line, line_delta);
    regs.address = regs.address.wrapping_add(addr_delta as u64);

    emit(header, regs, history, filter, out);
    regs.basic_block = false;
}

fn emit(
    header: &LineProgramHeader,
    regs: &Registers,
    history: &mut LineHistory,
    filter: &RowFilter,
    out: &mut Vec<LineEntry>,
) {
    let Some(file) = header.file_list.get(regs.file_index) else {
        return;
    };
    let view = history.view_for(file, regs.address);
    if filter.accepts(file) {
        out.push(make_entry(
            file.clone(),
            regs.address,
            regs.line,
            regs.is_stmt,
            regs.basic_block,
            view,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_program::header::LineProgramHeader;

    fn header(files: &[&str]) -> LineProgramHeader {
        LineProgramHeader {
            version: 2,
            min_insn_len: 1,
            default_is_stmt: true,
            line_base: -1,
            line_range: 4,
            opcode_base: 13,
            standard_opcode_lengths: vec![0, 1, 1, 1, 1, 0, 0, 0, 1, 0, 0, 1],
            include_dirs: vec![],
            file_list: files.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn set_address(addr: u32) -> Vec<u8> {
        // extended opcode: 0x00, ex_len=5, DW_LNE_set_address(2), addr u32 LE
        let mut v = vec![0u8, 5, 2];
        v.extend_from_slice(&addr.to_le_bytes());
        v
    }

    fn end_sequence() -> Vec<u8> {
        vec![0u8, 1, 1]
    }

    fn run(body: Vec<u8>, header: &LineProgramHeader) -> Vec<LineEntry> {
        let mut cur = Cursor::new(&body);
        let mut history = LineHistory::new();
        let filter = RowFilter::new(Vec::<String>::new());
        let mut out = vec![];
        run_unit(&mut cur, header, body.len(), &mut history, &filter, &mut out);
        out
    }

    #[test]
    fn scenario_1_single_special_opcode() {
        let h = header(&["main.c"]);
        let mut body = set_address(0x1000);
        body.push(15); // special opcode: adj = 15 - 13 = 2 -> line += -1 + 2%4 = +1, addr += (2/4)*1 = 0
        let rows = run(body, &h);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].file, "main.c");
        assert_eq!(rows[0].address, "0x1000");
        assert_eq!(rows[0].line, 2);
        assert!(rows[0].is_stmt);
        assert!(!rows[0].basic_block);
        assert_eq!(rows[0].view, 0);
    }

    #[test]
    fn scenario_2_repeated_address_view_increments() {
        let h = header(&["main.c"]);
        let mut body = set_address(0x1000);
        body.push(15);
        body.push(DW_LNS_COPY);
        body.push(DW_LNS_COPY);
        let rows = run(body, &h);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows.iter().map(|r| r.view).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert!(rows.iter().all(|r| r.address == "0x1000" && r.line == 2));
    }

    #[test]
    fn scenario_3_advance_pc_then_copy_resets_view() {
        let h = header(&["main.c"]);
        let mut body = set_address(0x1000);
        body.push(15); // emit at 0x1000, view 0
        body.push(DW_LNS_ADVANCE_PC);
        body.push(4); // ULEB 4
        body.push(DW_LNS_COPY);
        let rows = run(body, &h);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].address, "0x1004");
        assert_eq!(rows[1].view, 0);
    }

    #[test]
    fn scenario_4_advance_line_negative_clamps_to_one() {
        let h = header(&["main.c"]);
        let mut body = set_address(0x1000);
        body.push(15); // line becomes 2
        body.push(DW_LNS_ADVANCE_LINE);
        body.push(0x7b); // SLEB128 -5 (0x7b = 0b1111011 -> sign bit set, value -5)
        body.push(DW_LNS_ADVANCE_PC);
        body.push(4);
        body.push(DW_LNS_COPY);
        let rows = run(body, &h);
        assert_eq!(rows.last().unwrap().line, 1);
    }

    #[test]
    fn scenario_5_case_insensitive_filter_passes() {
        let h = header(&["POUS.c"]);
        let body = {
            let mut b = set_address(0x2000);
            b.push(DW_LNS_COPY);
            b
        };
        let mut cur = Cursor::new(&body);
        let mut history = LineHistory::new();
        let filter = RowFilter::new(["pous.c"]);
        let mut out = vec![];
        run_unit(&mut cur, &h, body.len(), &mut history, &filter, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].file, "POUS.c");
    }

    #[test]
    fn scenario_6_end_sequence_resets_view() {
        let h = header(&["a.c"]);
        let mut body = set_address(0x2000);
        body.push(DW_LNS_COPY);
        body.push(DW_LNS_COPY);
        body.extend(end_sequence());
        body.extend(set_address(0x2000));
        body.push(DW_LNS_COPY);
        let rows = run(body, &h);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].view, 0);
        assert_eq!(rows[1].view, 1);
        assert_eq!(rows[2].view, 0);
    }

    #[test]
    fn file_index_out_of_range_is_skipped_silently() {
        let mut h = header(&["main.c"]);
        h.file_list.clear(); // no files at all
        let mut body = set_address(0x1000);
        body.push(DW_LNS_COPY);
        let rows = run(body, &h);
        assert!(rows.is_empty());
    }

    #[test]
    fn set_file_out_of_range_clamps_to_last_file() {
        let h = header(&["a.c", "b.c"]);
        let mut body = set_address(0x1000);
        body.push(DW_LNS_SET_FILE);
        body.push(99); // ULEB 99, way out of range -> clamp to last (b.c)
        body.push(DW_LNS_COPY);
        let rows = run(body, &h);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].file, "b.c");
    }
}
