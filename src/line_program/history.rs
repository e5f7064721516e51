// Emission-history (view) accounting and the file allow-list filter.
//
// Both are threaded across the whole `.debug_line` section, not reset
// per-unit — only `DW_LNE_end_sequence` resets the history (see
// `LineHistory::reset`).

use crate::data::LineEntry;

#[derive(Debug, Default)]
pub struct LineHistory {
    last_emitted: Option<(String, u64)>,
    repeat_counter: u32,
}

impl LineHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets view-tracking state, as `DW_LNE_end_sequence` requires.
    pub fn reset(&mut self) {
        self.last_emitted = None;
        self.repeat_counter = 0;
    }

    /// Records a candidate emission and returns its view counter. This
    /// runs for every row the VM would emit, independent of the file
    /// filter — a filtered-out row still consumes a view slot.
    pub fn view_for(&mut self, file: &str, address: u64) -> u32 {
        let is_repeat = self
            .last_emitted
            .as_ref()
            .is_some_and(|(f, a)| f == file && *a == address);

        if is_repeat {
            self.repeat_counter += 1;
        } else {
            self.repeat_counter = 0;
            self.last_emitted = Some((file.to_string(), address));
        }
        self.repeat_counter
    }
}

/// Case-insensitive allow-list over file basenames. An empty list accepts
/// everything.
#[derive(Debug, Default)]
pub struct RowFilter {
    allowed_lower: Vec<String>,
}

impl RowFilter {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        RowFilter {
            allowed_lower: names
                .into_iter()
                .map(|s| s.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn accepts(&self, file: &str) -> bool {
        self.allowed_lower.is_empty()
            || self
                .allowed_lower
                .iter()
                .any(|allowed| allowed == &file.to_ascii_lowercase())
    }
}

pub fn format_address(address: u64) -> String {
    format!("0x{address:x}")
}

pub fn make_entry(
    file: String,
    address: u64,
    line: u32,
    is_stmt: bool,
    basic_block: bool,
    view: u32,
) -> LineEntry {
    LineEntry {
        file,
        address: format_address(address),
        line,
        is_stmt,
        basic_block,
        view,
    }
}
