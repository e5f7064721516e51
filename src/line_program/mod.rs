//! The DWARF debug-line-program interpreter: the only algorithmically
//! non-trivial part of this crate (see `SPEC_FULL.md` §1–§4).

pub mod header;
pub mod history;
pub mod vm;

use crate::cursor::Cursor;
use crate::data::LineEntry;
use header::UnitHeader;
use history::{LineHistory, RowFilter};

/// Walks every compilation unit in a `.debug_line` section, emitting rows
/// through a single `LineHistory` and `RowFilter` threaded across all of
/// them (§3: "threaded across the entire section, not per-unit").
pub fn parse_section(section: &[u8], filter: &RowFilter) -> Vec<LineEntry> {
    let mut cur = Cursor::new(section);
    let mut history = LineHistory::new();
    let mut rows = Vec::new();

    loop {
        if cur.pos() + 4 > cur.len() {
            break;
        }
        match header::parse_unit_header(&mut cur) {
            UnitHeader::EndOfSection => break,
            UnitHeader::Malformed { unit_end } => {
                log::debug!("skipping malformed line-program unit (ends at {unit_end})");
                cur.seek(unit_end);
            }
            UnitHeader::Parsed { header, unit_end } => {
                vm::run_unit(&mut cur, &header, unit_end, &mut history, filter, &mut rows);
            }
        }
    }

    rows
}
