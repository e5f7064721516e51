//! The C ABI boundary (§4.9, §6): `repr(C)` row/size records, `extern "C"`
//! entry points, and the paired alloc/free routines a foreign host calls.
//! No other module in this crate deals in raw pointers; everything above
//! this layer works with ordinary owned `Vec`/`String` values.

use std::os::raw::c_int;
use std::path::PathBuf;
use std::ptr;

use crate::data::{LineEntry, MemorySizes};
use crate::error::{self, Error};
use crate::event::{Event, EventSink, Severity};

/// One row of the source-line matrix, as handed across the boundary.
/// `file` and `address` are heap-owned, NUL-terminated UTF-8 strings;
/// the host must free each with `free_symbols`.
#[repr(C)]
pub struct CLineEntry {
    pub file: *mut std::os::raw::c_char,
    pub address: *mut std::os::raw::c_char,
    pub line: u32,
    pub is_stmt: c_int,
    pub basic_block: c_int,
    pub view: u32,
}

/// Segment totals in the declared field order (§6).
#[repr(C)]
pub struct CMemorySizes {
    pub text: i32,
    pub data: i32,
    pub bss: i32,
    pub flash: i32,
    pub ram: i32,
    pub bin_size: i32,
    pub dec: i32,
}

impl From<MemorySizes> for CMemorySizes {
    fn from(m: MemorySizes) -> Self {
        CMemorySizes {
            text: m.text,
            data: m.data,
            bss: m.bss,
            flash: m.flash,
            ram: m.ram,
            bin_size: m.bin_size,
            dec: m.dec,
        }
    }
}

/// The event the host callback receives. Strings are heap-owned for the
/// duration of the call only; the host must not retain pointers past the
/// callback's return.
#[repr(C)]
pub struct CBuildEvent {
    pub message: *const std::os::raw::c_char,
    pub severity: c_int,
    pub label: *const std::os::raw::c_char,
    pub time_ticks: i64,
}

pub type BuildCallback = Option<extern "C" fn(*const CBuildEvent)>;

/// Adapts a raw C function pointer into the safe [`EventSink`] trait used
/// by the core.
struct CallbackSink(BuildCallback);

impl EventSink for CallbackSink {
    fn send(&mut self, event: Event) {
        let Some(cb) = self.0 else { return };
        let Ok(message) = std::ffi::CString::new(event.message) else {
            return;
        };
        let label = std::ffi::CString::new(event.severity.label()).unwrap();
        let c_event = CBuildEvent {
            message: message.as_ptr(),
            severity: event.severity as c_int,
            label: label.as_ptr(),
            time_ticks: event.timestamp_ticks,
        };
        cb(&c_event as *const CBuildEvent);
    }
}

unsafe fn cstr_to_pathbuf(path: *const std::os::raw::c_char) -> Option<PathBuf> {
    if path.is_null() {
        return None;
    }
    let s = std::ffi::CStr::from_ptr(path).to_str().ok()?;
    Some(PathBuf::from(s))
}

/// # Safety
/// `path` must be a valid NUL-terminated C string. `out` must be a valid,
/// writable pointer. `cb`, if non-null, must be a valid function pointer
/// the host keeps alive for the duration of this call.
#[no_mangle]
pub unsafe extern "C" fn elf_analyze(
    path: *const std::os::raw::c_char,
    cb: BuildCallback,
    out: *mut *mut CMemorySizes,
) -> c_int {
    if out.is_null() {
        return error::analyze_exit_code(&Error::Unknown);
    }
    *out = ptr::null_mut();

    let mut sink = CallbackSink(cb);
    let Some(path) = cstr_to_pathbuf(path) else {
        crate::event::emit(&mut sink, Severity::Err, "invalid path string");
        return error::analyze_exit_code(&Error::FileOpen);
    };

    // `analyze_memory` already emits an Err event on failure; don't double it here.
    match crate::analyze_memory(&path, &mut sink) {
        Ok(sizes) => {
            *out = Box::into_raw(Box::new(CMemorySizes::from(sizes)));
            0
        }
        Err(err) => error::analyze_exit_code(&err),
    }
}

/// # Safety
/// `path` must be a valid NUL-terminated C string. `filters` must point to
/// `filter_count` valid NUL-terminated C strings (or be null if
/// `filter_count == 0`). `out_array`/`out_count` must be valid writable
/// pointers.
#[no_mangle]
pub unsafe extern "C" fn get_symbols(
    path: *const std::os::raw::c_char,
    filters: *const *const std::os::raw::c_char,
    filter_count: usize,
    cb: BuildCallback,
    out_array: *mut *mut CLineEntry,
    out_count: *mut usize,
    _base_path: *const std::os::raw::c_char,
) -> c_int {
    if out_array.is_null() || out_count.is_null() {
        return error::get_symbols_exit_code(&Error::Unknown);
    }
    *out_array = ptr::null_mut();
    *out_count = 0;

    let mut sink = CallbackSink(cb);
    let Some(path) = cstr_to_pathbuf(path) else {
        crate::event::emit(&mut sink, Severity::Err, "invalid path string");
        return error::get_symbols_exit_code(&Error::FileOpen);
    };

    let mut owned_filters = Vec::with_capacity(filter_count);
    for i in 0..filter_count {
        let ptr = *filters.add(i);
        if ptr.is_null() {
            continue;
        }
        if let Ok(s) = std::ffi::CStr::from_ptr(ptr).to_str() {
            owned_filters.push(s.to_string());
        }
    }

    // `get_symbols` already emits an Err event on failure; don't double it here.
    let rows = match crate::get_symbols(&path, &owned_filters, None, &mut sink) {
        Ok(rows) => rows,
        Err(err) => return error::get_symbols_exit_code(&err),
    };

    if rows.is_empty() {
        return 0;
    }

    match allocate_rows(rows) {
        Some((arr, count)) => {
            *out_array = arr;
            *out_count = count;
            0
        }
        None => {
            crate::event::emit(&mut sink, Severity::Err, "allocation failure");
            error::get_symbols_exit_code(&Error::AllocationFailure)
        }
    }
}

fn allocate_rows(rows: Vec<LineEntry>) -> Option<(*mut CLineEntry, usize)> {
    let count = rows.len();
    let mut boxed: Vec<CLineEntry> = Vec::with_capacity(count);
    for row in rows {
        let file = std::ffi::CString::new(row.file).ok()?;
        let address = std::ffi::CString::new(row.address).ok()?;
        boxed.push(CLineEntry {
            file: file.into_raw(),
            address: address.into_raw(),
            line: row.line,
            is_stmt: row.is_stmt as c_int,
            basic_block: row.basic_block as c_int,
            view: row.view,
        });
    }
    let mut boxed = boxed.into_boxed_slice();
    let ptr = boxed.as_mut_ptr();
    std::mem::forget(boxed);
    Some((ptr, count))
}

/// Frees an array returned by `get_symbols`, including every row's
/// per-field strings.
///
/// # Safety
/// `arr` must be null or a pointer previously returned by `get_symbols`
/// with exactly `count` elements, not yet freed.
#[no_mangle]
pub unsafe extern "C" fn free_symbols(arr: *mut CLineEntry, count: usize) {
    if arr.is_null() {
        return;
    }
    let slice = std::slice::from_raw_parts_mut(arr, count);
    for entry in slice.iter_mut() {
        if !entry.file.is_null() {
            drop(std::ffi::CString::from_raw(entry.file));
        }
        if !entry.address.is_null() {
            drop(std::ffi::CString::from_raw(entry.address));
        }
    }
    drop(Box::from_raw(std::ptr::slice_from_raw_parts_mut(arr, count)));
}

/// Frees a record returned by `elf_analyze`.
///
/// # Safety
/// `memory` must be null or a pointer previously returned by
/// `elf_analyze`, not yet freed.
#[no_mangle]
pub unsafe extern "C" fn delete_memory_sizes(memory: *mut CMemorySizes) {
    if !memory.is_null() {
        drop(Box::from_raw(memory));
    }
}
