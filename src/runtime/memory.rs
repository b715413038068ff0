//! WebAssembly linear memory
//!
//! A zero-initialised byte buffer sized in 64 KiB pages. Every access is
//! bounds-checked against the current size before any byte is touched, and
//! effective addresses are computed in 64 bits so `addr + offset` can never
//! wrap around.

use super::{InstantiationError, Trap, TrapKind};
use crate::parser::module::Limits;
use byteorder::{ByteOrder, LittleEndian};

/// WebAssembly page size in bytes (64KB)
pub const PAGE_SIZE: usize = 65536;

/// Maximum number of pages (2^16 = 64K pages = 4GB total)
pub const MAX_PAGES: u32 = 65536;

#[derive(Debug)]
pub struct Memory {
    data: Vec<u8>,
    current_pages: u32,
    max_pages: Option<u32>,
    /// Host-imposed ceiling, independent of the declared maximum
    page_limit: u32,
}

fn out_of_bounds() -> Trap {
    Trap::new(TrapKind::MemoryOutOfBounds)
}

impl Memory {
    /// Allocate a memory with the declared limits. `page_limit` caps growth
    /// regardless of the declared maximum.
    pub fn new(limits: Limits, page_limit: u32) -> Result<Self, InstantiationError> {
        let page_limit = page_limit.min(MAX_PAGES);
        if limits.min > page_limit {
            return Err(InstantiationError::Resource(format!(
                "initial memory of {} pages exceeds the limit of {page_limit} pages",
                limits.min
            )));
        }
        let bytes = limits.min as usize * PAGE_SIZE;
        let mut data = Vec::new();
        data.try_reserve_exact(bytes)
            .map_err(|e| InstantiationError::Resource(format!("cannot allocate {bytes} bytes of memory: {e}")))?;
        data.resize(bytes, 0);

        Ok(Memory {
            data,
            current_pages: limits.min,
            max_pages: limits.max,
            page_limit,
        })
    }

    /// Current size in pages
    pub fn size(&self) -> u32 {
        self.current_pages
    }

    pub fn max_pages(&self) -> Option<u32> {
        self.max_pages
    }

    /// Size and maximum, as used for import matching
    pub fn limits(&self) -> Limits {
        Limits::new(self.current_pages, self.max_pages)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Grow by `delta_pages`, returning the previous size in pages, or -1
    /// with the memory untouched when the new size is not allowed or cannot
    /// be allocated.
    pub fn grow(&mut self, delta_pages: u32) -> i32 {
        let current = self.current_pages;

        let Some(new_pages) = current.checked_add(delta_pages) else {
            return -1;
        };

        let effective_max = self.max_pages.unwrap_or(MAX_PAGES).min(self.page_limit);
        if new_pages > effective_max {
            return -1;
        }

        let new_bytes = new_pages as usize * PAGE_SIZE;
        match self.data.try_reserve_exact(new_bytes - self.data.len()) {
            Ok(()) => {
                self.data.resize(new_bytes, 0);
                self.current_pages = new_pages;
                current as i32
            }
            Err(_) => -1,
        }
    }

    /// Resolve `[addr, addr + len)` to a slice range, trapping when any part
    /// of it falls outside the memory.
    #[inline]
    fn range(&self, addr: u64, len: usize) -> Result<std::ops::Range<usize>, Trap> {
        let end = addr.checked_add(len as u64).ok_or_else(out_of_bounds)?;
        if end > self.data.len() as u64 {
            return Err(out_of_bounds());
        }
        Ok(addr as usize..end as usize)
    }

    #[inline]
    fn slice(&self, addr: u64, len: usize) -> Result<&[u8], Trap> {
        let range = self.range(addr, len)?;
        Ok(&self.data[range])
    }

    #[inline]
    fn slice_mut(&mut self, addr: u64, len: usize) -> Result<&mut [u8], Trap> {
        let range = self.range(addr, len)?;
        Ok(&mut self.data[range])
    }

    pub fn read_u8(&self, addr: u64) -> Result<u8, Trap> {
        Ok(self.slice(addr, 1)?[0])
    }

    pub fn read_u16(&self, addr: u64) -> Result<u16, Trap> {
        Ok(LittleEndian::read_u16(self.slice(addr, 2)?))
    }

    pub fn read_u32(&self, addr: u64) -> Result<u32, Trap> {
        Ok(LittleEndian::read_u32(self.slice(addr, 4)?))
    }

    pub fn read_u64(&self, addr: u64) -> Result<u64, Trap> {
        Ok(LittleEndian::read_u64(self.slice(addr, 8)?))
    }

    pub fn write_u8(&mut self, addr: u64, value: u8) -> Result<(), Trap> {
        self.slice_mut(addr, 1)?[0] = value;
        Ok(())
    }

    pub fn write_u16(&mut self, addr: u64, value: u16) -> Result<(), Trap> {
        LittleEndian::write_u16(self.slice_mut(addr, 2)?, value);
        Ok(())
    }

    pub fn write_u32(&mut self, addr: u64, value: u32) -> Result<(), Trap> {
        LittleEndian::write_u32(self.slice_mut(addr, 4)?, value);
        Ok(())
    }

    pub fn write_u64(&mut self, addr: u64, value: u64) -> Result<(), Trap> {
        LittleEndian::write_u64(self.slice_mut(addr, 8)?, value);
        Ok(())
    }

    /// Copy `buf.len()` bytes starting at `addr` into `buf`.
    pub fn read(&self, addr: u64, buf: &mut [u8]) -> Result<(), Trap> {
        buf.copy_from_slice(self.slice(addr, buf.len())?);
        Ok(())
    }

    pub fn write(&mut self, addr: u64, bytes: &[u8]) -> Result<(), Trap> {
        self.slice_mut(addr, bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    /// `memory.fill`: the whole range is checked before anything is written.
    pub fn fill(&mut self, dst: u32, value: u8, len: u32) -> Result<(), Trap> {
        self.slice_mut(dst as u64, len as usize)?.fill(value);
        Ok(())
    }

    /// `memory.copy`: overlapping ranges behave as if copied through a
    /// temporary buffer.
    pub fn copy_within(&mut self, dst: u32, src: u32, len: u32) -> Result<(), Trap> {
        let src = self.range(src as u64, len as usize)?;
        let dst = self.range(dst as u64, len as usize)?;
        self.data.copy_within(src, dst.start);
        Ok(())
    }

    /// `memory.init` and active data segments: copy `data[src..src+len]` to `dst`.
    pub fn init(&mut self, dst: u32, data: &[u8], src: u32, len: u32) -> Result<(), Trap> {
        let src_end = (src as u64) + len as u64;
        if src_end > data.len() as u64 {
            return Err(out_of_bounds());
        }
        let bytes = &data[src as usize..src_end as usize];
        self.write(dst as u64, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory(min: u32, max: Option<u32>) -> Memory {
        Memory::new(Limits::new(min, max), MAX_PAGES).unwrap()
    }

    #[test]
    fn test_memory_creation() {
        let mem = memory(1, None);
        assert_eq!(mem.size(), 1);
        assert_eq!(mem.len(), PAGE_SIZE);

        let mem = memory(0, Some(10));
        assert!(mem.is_empty());
        assert_eq!(mem.max_pages(), Some(10));
    }

    #[test]
    fn test_creation_respects_page_limit() {
        assert!(matches!(
            Memory::new(Limits::new(4, None), 2),
            Err(InstantiationError::Resource(_))
        ));
    }

    #[test]
    fn test_memory_grow() {
        let mut mem = memory(1, Some(10));

        assert_eq!(mem.grow(2), 1);
        assert_eq!(mem.size(), 3);
        assert_eq!(mem.len(), 3 * PAGE_SIZE);

        assert_eq!(mem.grow(7), 3);
        assert_eq!(mem.size(), 10);

        assert_eq!(mem.grow(1), -1);
        assert_eq!(mem.size(), 10);
        assert_eq!(mem.grow(0), 10);
    }

    #[test]
    fn test_memory_grow_overflow() {
        let mut mem = memory(1, None);
        assert_eq!(mem.grow(u32::MAX), -1);
        assert_eq!(mem.size(), 1);
    }

    #[test]
    fn test_grow_respects_page_limit() {
        let mut mem = Memory::new(Limits::new(1, None), 3).unwrap();
        assert_eq!(mem.grow(2), 1);
        assert_eq!(mem.grow(1), -1);
        assert_eq!(mem.size(), 3);
    }

    #[test]
    fn test_bounds_checking() {
        let mem = memory(1, None);
        let size = PAGE_SIZE as u64;

        assert!(mem.read_u8(size - 1).is_ok());
        assert_eq!(mem.read_u8(size).unwrap_err().kind, TrapKind::MemoryOutOfBounds);
        assert!(mem.read_u32(size - 4).is_ok());
        assert!(mem.read_u32(size - 3).is_err());
        assert!(mem.read_u64(u64::MAX).is_err());
    }

    #[test]
    fn test_little_endian_round_trip() {
        let mut mem = memory(1, None);

        mem.write_u32(100, 0x12345678).unwrap();
        assert_eq!(mem.read_u32(100).unwrap(), 0x12345678);
        assert_eq!(mem.read_u8(100).unwrap(), 0x78);
        assert_eq!(mem.read_u8(103).unwrap(), 0x12);

        mem.write_u64(3, 0x123456789ABCDEF0).unwrap();
        assert_eq!(mem.read_u64(3).unwrap(), 0x123456789ABCDEF0);
        mem.write_u16(1, 0xbeef).unwrap();
        assert_eq!(mem.read_u16(1).unwrap(), 0xbeef);
    }

    #[test]
    fn test_failed_write_leaves_memory_untouched() {
        let mut mem = memory(1, None);
        let end = PAGE_SIZE as u64;
        assert!(mem.write_u32(end - 2, u32::MAX).is_err());
        assert_eq!(mem.read_u16(end - 2).unwrap(), 0);
    }

    #[test]
    fn test_bulk_operations() {
        let mut mem = memory(1, None);
        mem.write(0, &[1, 2, 3, 4, 5]).unwrap();

        mem.copy_within(2, 0, 5).unwrap();
        let mut buf = [0u8; 7];
        mem.read(0, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 1, 2, 3, 4, 5]);

        mem.fill(1, 9, 3).unwrap();
        mem.read(0, &mut buf).unwrap();
        assert_eq!(buf, [1, 9, 9, 9, 3, 4, 5]);

        assert!(mem.fill(PAGE_SIZE as u32 - 1, 0, 2).is_err());
        assert!(mem.fill(PAGE_SIZE as u32, 0, 0).is_ok());
        assert!(mem.fill(PAGE_SIZE as u32 + 1, 0, 0).is_err());
    }

    #[test]
    fn test_init_checks_both_ranges() {
        let mut mem = memory(1, None);
        let data = [7u8, 8, 9];
        mem.init(10, &data, 1, 2).unwrap();
        assert_eq!(mem.read_u16(10).unwrap(), u16::from_le_bytes([8, 9]));
        assert!(mem.init(0, &data, 2, 2).is_err());
        assert!(mem.init(PAGE_SIZE as u32 - 1, &data, 0, 2).is_err());
        assert!(mem.init(0, &data, 3, 0).is_ok());
    }

    #[test]
    fn test_grow_zero_initialisation() {
        let mut mem = memory(1, None);
        mem.write_u32(0, 0xDEADBEEF).unwrap();
        mem.grow(1);
        assert_eq!(mem.read_u32(0).unwrap(), 0xDEADBEEF);
        assert_eq!(mem.read_u32(PAGE_SIZE as u64 + 100).unwrap(), 0);
    }
}
