//! Extracts a memory-footprint summary and a source-line mapping table
//! from a linked ELF executable's DWARF debug-line section.
//!
//! The two public entry points are [`analyze_memory`] and [`get_symbols`];
//! everything else in this crate exists to support them. See
//! `SPEC_FULL.md` for the full component breakdown.

pub mod cursor;
pub mod data;
pub mod elf;
pub mod error;
pub mod event;
pub mod ffi;
pub mod line_program;
pub mod memory;

use std::path::Path;

pub use data::{LineEntry, MemorySizes};
pub use error::Error;
pub use event::{Event, EventSink, Severity};

use line_program::history::RowFilter;

/// Computes the memory-footprint summary (§4.2) for the ELF image at
/// `path`.
pub fn analyze_memory(path: &Path, sink: &mut dyn EventSink) -> Result<MemorySizes, Error> {
    let image = match elf::ElfImage::open(path) {
        Ok(image) => image,
        Err(err) => {
            event::emit(sink, Severity::Err, err.to_string());
            return Err(err);
        }
    };
    let segments = match image.segments() {
        Ok(segments) => segments,
        Err(err) => {
            event::emit(sink, Severity::Err, err.to_string());
            return Err(err);
        }
    };
    let result = memory::summarize(&segments);
    event::emit(
        sink,
        Severity::Ok,
        format!(
            "text={}, data={}, bss={}, flash={}, ram={}, bin={}, dec={}",
            result.text, result.data, result.bss, result.flash, result.ram, result.bin_size, result.dec
        ),
    );
    Ok(result)
}

/// Materializes the full source-line matrix (§4.4–§4.6) for the ELF image
/// at `path`, restricted to `filters` (case-insensitive basenames; an
/// empty slice accepts every file). `base_path` is accepted for forward
/// compatibility with the host boundary (§4.8) and is not otherwise used.
pub fn get_symbols(
    path: &Path,
    filters: &[String],
    _base_path: Option<&Path>,
    sink: &mut dyn EventSink,
) -> Result<Vec<LineEntry>, Error> {
    let image = match elf::ElfImage::open(path) {
        Ok(image) => image,
        Err(err) => {
            event::emit(sink, Severity::Err, err.to_string());
            return Err(err);
        }
    };

    let section = match image.debug_line() {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            event::emit(sink, Severity::Err, ".debug_line not found");
            return Err(Error::SectionMissing);
        }
        Err(err) => {
            event::emit(sink, Severity::Err, err.to_string());
            return Err(err);
        }
    };

    let filter = RowFilter::new(filters);
    let rows = line_program::parse_section(&section, &filter);
    log::debug!("get_symbols: {} rows emitted from {} bytes", rows.len(), section.len());
    Ok(rows)
}
