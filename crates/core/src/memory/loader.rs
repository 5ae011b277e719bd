//! ELF trace loading.
//!
//! Parses the trace with `goblin`, copies every `PT_LOAD` segment's file
//! bytes to its virtual address, and records the entry point and the image's
//! endianness.

use std::fs;
use std::path::Path;

use goblin::elf::program_header::PT_LOAD;
use goblin::elf::Elf;

use super::MipsMemory;
use crate::common::error::SimError;
use crate::common::Addr;

pub(super) fn load_elf(mem: &mut MipsMemory, path: &Path) -> Result<(), SimError> {
    let bad = |reason: String| SimError::BadTrace {
        path: path.to_path_buf(),
        reason,
    };

    let buffer = fs::read(path).map_err(|e| bad(e.to_string()))?;
    let elf = Elf::parse(&buffer).map_err(|e| bad(e.to_string()))?;

    mem.big_endian = !elf.little_endian;
    mem.start_pc = elf.entry as Addr;

    for ph in &elf.program_headers {
        if ph.p_type != PT_LOAD || ph.p_filesz == 0 {
            continue;
        }
        let off = ph.p_offset as usize;
        let len = ph.p_filesz as usize;
        let bytes = buffer
            .get(off..off.saturating_add(len))
            .ok_or_else(|| bad("segment extends past end of file".to_string()))?;
        mem.write_bytes(ph.p_vaddr as Addr, bytes);
    }

    Ok(())
}
