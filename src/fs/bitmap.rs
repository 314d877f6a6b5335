use crate::disk::{Block, BlockDevice, BLOCK_SIZE};
use crate::fs::config::{bitmap_blocks, BITMAP_START_BLOCK, BITS_PER_BLOCK};
use crate::fs::error::{FsError, Result};

/// One bit per block, system-wide: inode blocks and directory/data blocks
/// are drawn from the same pool. The bitmap itself occupies the blocks
/// right after the superblock; every allocate/free is a single whole-block
/// write, persisted before the call returns.
#[derive(Debug)]
pub struct FreeSpaceBitmap {
    total_blocks: u32,
    bitmap_blocks: u32,
}

impl FreeSpaceBitmap {
    /// Describes the bitmap of an already-formatted volume.
    pub fn open(total_blocks: u32) -> Self {
        Self {
            total_blocks,
            bitmap_blocks: bitmap_blocks(total_blocks),
        }
    }

    /// Writes a fresh bitmap: everything free except the superblock, the
    /// bitmap blocks themselves, and the tail bits past `total_blocks`
    /// (pre-set so the scan can never hand them out).
    pub fn format<D: BlockDevice>(disk: &D, total_blocks: u32) -> Result<Self> {
        let map = Self::open(total_blocks);
        let reserved = BITMAP_START_BLOCK + map.bitmap_blocks;

        for b in 0..map.bitmap_blocks {
            let mut buf: Block = [0; BLOCK_SIZE];
            let base = b * BITS_PER_BLOCK;
            for bit in 0..BITS_PER_BLOCK {
                let global = base + bit;
                if global < reserved || global >= total_blocks {
                    buf[(bit / 8) as usize] |= 1 << (bit % 8);
                }
            }
            disk.write_block(BITMAP_START_BLOCK + b, &buf)?;
        }

        Ok(map)
    }

    /// Returns the first free block address and marks it used, or
    /// `NoBlockAvailable` when every bit is set. The scan order is
    /// bitmap-block-major, then byte, then bit.
    pub fn allocate<D: BlockDevice>(&self, disk: &D) -> Result<u32> {
        let mut buf: Block = [0; BLOCK_SIZE];
        for b in 0..self.bitmap_blocks {
            disk.read_block(BITMAP_START_BLOCK + b, &mut buf)?;
            // A fully-set block has no byte below 0xFF; skip it whole.
            if let Some(byte_index) = buf.iter().position(|&byte| byte != 0xFF) {
                let bit = (!buf[byte_index]).trailing_zeros();
                buf[byte_index] |= 1 << bit;
                disk.write_block(BITMAP_START_BLOCK + b, &buf)?;
                return Ok(b * BITS_PER_BLOCK + byte_index as u32 * 8 + bit);
            }
        }
        Err(FsError::NoBlockAvailable)
    }

    /// Clears the bit for `addr`. Freeing an already-free or out-of-range
    /// address is a no-op, never an error.
    pub fn free<D: BlockDevice>(&self, disk: &D, addr: u32) -> Result<()> {
        if addr >= self.total_blocks {
            return Ok(());
        }

        let owner = addr / BITS_PER_BLOCK;
        let offset = addr % BITS_PER_BLOCK;
        let byte_index = (offset / 8) as usize;
        let mask = 1u8 << (offset % 8);

        let mut buf: Block = [0; BLOCK_SIZE];
        disk.read_block(BITMAP_START_BLOCK + owner, &mut buf)?;
        if buf[byte_index] & mask != 0 {
            buf[byte_index] &= !mask;
            disk.write_block(BITMAP_START_BLOCK + owner, &buf)?;
        }
        Ok(())
    }

    pub fn is_allocated<D: BlockDevice>(&self, disk: &D, addr: u32) -> Result<bool> {
        let owner = addr / BITS_PER_BLOCK;
        let offset = addr % BITS_PER_BLOCK;

        let mut buf: Block = [0; BLOCK_SIZE];
        disk.read_block(BITMAP_START_BLOCK + owner, &mut buf)?;
        Ok(buf[(offset / 8) as usize] & (1 << (offset % 8)) != 0)
    }

    /// Number of blocks still allocatable.
    pub fn free_count<D: BlockDevice>(&self, disk: &D) -> Result<u32> {
        let mut used = 0u32;
        let mut buf: Block = [0; BLOCK_SIZE];
        for b in 0..self.bitmap_blocks {
            disk.read_block(BITMAP_START_BLOCK + b, &mut buf)?;
            used += buf.iter().map(|byte| byte.count_ones()).sum::<u32>();
        }
        // Tail bits past total_blocks are permanently set; they are not blocks.
        let covered = self.bitmap_blocks * BITS_PER_BLOCK;
        Ok(self.total_blocks - (used - (covered - self.total_blocks)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::MemDisk;

    fn fresh(total: u32) -> (MemDisk, FreeSpaceBitmap) {
        let disk = MemDisk::new(total);
        let map = FreeSpaceBitmap::format(&disk, total).unwrap();
        (disk, map)
    }

    #[test]
    fn format_reserves_superblock_and_bitmap() {
        let (disk, map) = fresh(64);
        assert!(map.is_allocated(&disk, 0).unwrap());
        assert!(map.is_allocated(&disk, 1).unwrap());
        assert!(!map.is_allocated(&disk, 2).unwrap());
        assert_eq!(map.free_count(&disk).unwrap(), 62);
    }

    #[test]
    fn allocations_are_distinct_and_in_range() {
        let (disk, map) = fresh(64);
        let mut seen = Vec::new();
        for _ in 0..62 {
            let addr = map.allocate(&disk).unwrap();
            assert!(addr >= 2 && addr < 64);
            assert!(!seen.contains(&addr));
            seen.push(addr);
        }
    }

    #[test]
    fn exhaustion_is_deterministic() {
        let (disk, map) = fresh(16);
        while map.allocate(&disk).is_ok() {}
        for _ in 0..3 {
            match map.allocate(&disk) {
                Err(FsError::NoBlockAvailable) => {}
                other => panic!("expected NoBlockAvailable, got {:?}", other),
            }
        }
    }

    #[test]
    fn free_restores_the_free_count() {
        let (disk, map) = fresh(64);
        let before = map.free_count(&disk).unwrap();
        let addr = map.allocate(&disk).unwrap();
        assert_eq!(map.free_count(&disk).unwrap(), before - 1);
        map.free(&disk, addr).unwrap();
        assert_eq!(map.free_count(&disk).unwrap(), before);
    }

    #[test]
    fn freeing_twice_is_a_no_op() {
        let (disk, map) = fresh(64);
        let addr = map.allocate(&disk).unwrap();
        let before = map.free_count(&disk).unwrap();
        map.free(&disk, addr).unwrap();
        map.free(&disk, addr).unwrap();
        assert_eq!(map.free_count(&disk).unwrap(), before + 1);
    }

    #[test]
    fn freed_block_is_reused_first() {
        let (disk, map) = fresh(64);
        let a = map.allocate(&disk).unwrap();
        let _b = map.allocate(&disk).unwrap();
        map.free(&disk, a).unwrap();
        assert_eq!(map.allocate(&disk).unwrap(), a);
    }
}
