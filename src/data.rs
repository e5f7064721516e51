//! The two record shapes this crate produces.

/// A single row of the source-line matrix, immutable once emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineEntry {
    /// Basename only (see `line_program::header`'s basename extraction).
    pub file: String,
    /// Lowercase hex, `0x`-prefixed, no zero padding.
    pub address: String,
    pub line: u32,
    pub is_stmt: bool,
    pub basic_block: bool,
    pub view: u32,
}

/// Aggregate segment byte counts for one linked image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemorySizes {
    pub text: i32,
    pub data: i32,
    pub bss: i32,
    pub flash: i32,
    pub ram: i32,
    pub bin_size: i32,
    pub dec: i32,
}

impl MemorySizes {
    pub fn from_totals(text: i64, data: i64, bss: i64) -> MemorySizes {
        MemorySizes {
            text: text as i32,
            data: data as i32,
            bss: bss as i32,
            flash: text as i32,
            ram: (data + bss) as i32,
            bin_size: (text + data) as i32,
            dec: (text + data + bss) as i32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_aggregates_match_invariant() {
        let m = MemorySizes::from_totals(100, 20, 8);
        assert_eq!(m.flash, m.text);
        assert_eq!(m.ram, m.data + m.bss);
        assert_eq!(m.bin_size, m.text + m.data);
        assert_eq!(m.dec, m.text + m.data + m.bss);
    }
}
