//! The ELF adapter (§4.1): the crate's one dependency on a container-parsing
//! library (`object`). Everything downstream of this module works in terms
//! of `memory::SegmentInfo` and raw `.debug_line` bytes, so it never needs
//! to know which crate parsed the container.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;
use object::{Object, ObjectSection, ObjectSegment};

use crate::error::Error;
use crate::memory::SegmentInfo;

pub struct ElfImage {
    mmap: Mmap,
}

impl ElfImage {
    pub fn open(path: &Path) -> Result<ElfImage, Error> {
        let file = File::open(path).map_err(|_| Error::FileOpen)?;
        // Safety: we only ever read through this mapping, and the crate's
        // entry points own the `ElfImage` for the duration of the call, so
        // the backing file outlives every borrow we hand out.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|_| Error::FileOpen)?;
        Ok(ElfImage { mmap })
    }

    fn parse(&self) -> Result<object::File<'_>, Error> {
        object::File::parse(&*self.mmap).map_err(|_| Error::FileOpen)
    }

    /// Every `PT_LOAD` program-header entry, in the shape the segment
    /// summarizer (`memory::summarize`) expects.
    pub fn segments(&self) -> Result<Vec<SegmentInfo>, Error> {
        let obj = self.parse()?;
        Ok(obj
            .segments()
            .map(|seg| {
                let (executable, writable) = match seg.flags() {
                    object::SegmentFlags::Elf { p_flags } => (
                        p_flags & object::elf::PF_X != 0,
                        p_flags & object::elf::PF_W != 0,
                    ),
                    _ => (false, false),
                };
                let (_file_offset, file_size) = seg.file_range();
                SegmentInfo {
                    executable,
                    writable,
                    file_size,
                    memory_size: seg.size(),
                }
            })
            .collect())
    }

    /// The raw bytes of `.debug_line`, if the container carries one.
    pub fn debug_line(&self) -> Result<Option<Vec<u8>>, Error> {
        let obj = self.parse()?;
        match obj.section_by_name(".debug_line") {
            Some(section) => {
                let data = section.data().map_err(|_| Error::FileOpen)?;
                Ok(Some(data.to_vec()))
            }
            None => Ok(None),
        }
    }
}
