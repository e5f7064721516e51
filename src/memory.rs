//! Segment summarizer (§4.2): bins loadable-segment sizes into
//! text/data/bss and derives the rest of `MemorySizes`.

use crate::data::MemorySizes;

/// The shape the summarizer needs from a loadable program-header entry.
/// Decoupled from any particular container-parsing crate so this module
/// can be unit-tested without real object-file bytes; `elf::SegmentInfo`
/// is the production source.
#[derive(Debug, Clone, Copy)]
pub struct SegmentInfo {
    pub executable: bool,
    pub writable: bool,
    pub file_size: u64,
    pub memory_size: u64,
}

pub fn summarize<'a>(segments: impl IntoIterator<Item = &'a SegmentInfo>) -> MemorySizes {
    let mut text: i64 = 0;
    let mut data: i64 = 0;
    let mut bss: i64 = 0;

    for seg in segments {
        if seg.executable {
            text += seg.file_size as i64;
        } else if seg.writable {
            data += seg.file_size as i64;
            bss += (seg.memory_size as i64 - seg.file_size as i64).max(0);
        }
    }

    MemorySizes::from_totals(text, data, bss)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn executable_segments_contribute_to_text() {
        let segs = [SegmentInfo {
            executable: true,
            writable: false,
            file_size: 100,
            memory_size: 100,
        }];
        let m = summarize(&segs);
        assert_eq!(m.text, 100);
        assert_eq!(m.data, 0);
        assert_eq!(m.bss, 0);
    }

    #[test]
    fn writable_segments_split_data_and_bss() {
        let segs = [SegmentInfo {
            executable: false,
            writable: true,
            file_size: 20,
            memory_size: 28,
        }];
        let m = summarize(&segs);
        assert_eq!(m.data, 20);
        assert_eq!(m.bss, 8);
    }

    #[test]
    fn readonly_nonexecutable_segments_contribute_nothing() {
        let segs = [SegmentInfo {
            executable: false,
            writable: false,
            file_size: 50,
            memory_size: 50,
        }];
        let m = summarize(&segs);
        assert_eq!(m, MemorySizes::default());
    }

    #[test]
    fn memory_size_not_exceeding_file_size_adds_no_bss() {
        let segs = [SegmentInfo {
            executable: false,
            writable: true,
            file_size: 20,
            memory_size: 20,
        }];
        let m = summarize(&segs);
        assert_eq!(m.bss, 0);
    }

    #[test]
    fn aggregates_match_invariants_across_mixed_segments() {
        let segs = [
            SegmentInfo {
                executable: true,
                writable: false,
                file_size: 100,
                memory_size: 100,
            },
            SegmentInfo {
                executable: false,
                writable: true,
                file_size: 20,
                memory_size: 28,
            },
        ];
        let m = summarize(&segs);
        assert_eq!(m.flash, m.text);
        assert_eq!(m.ram, m.data + m.bss);
        assert_eq!(m.bin_size, m.text + m.data);
        assert_eq!(m.dec, m.text + m.data + m.bss);
    }
}
