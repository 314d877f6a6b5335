use serde::{Deserialize, Serialize};

use crate::disk::BlockDevice;
use crate::fs::config::{NDIRECT, NONE};
use crate::fs::error::Result;
use crate::fs::{read_block_as, write_block_as};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InodeKind {
    File,
    Directory,
}

/// Per-object metadata, occupying exactly one block. The block address of
/// the inode is its identity; nothing here records it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inode {
    /// Byte count. For directories this moves in DIRENT_SIZE steps.
    pub size: u32,
    pub kind: InodeKind,
    /// Direct block pointers, filled front to back, NONE when unused.
    pub direct: [u32; NDIRECT],
    /// Reserved. Present in the layout, exercised by no operation.
    pub indirect: u32,
}

impl Inode {
    pub fn new(kind: InodeKind) -> Self {
        Self {
            size: 0,
            kind,
            direct: [NONE; NDIRECT],
            indirect: NONE,
        }
    }

    /// Reads the inode stored at block `addr`. No semantic validation here;
    /// that is the directory engine's job.
    pub fn read<D: BlockDevice>(disk: &D, addr: u32) -> Result<Self> {
        read_block_as(disk, addr)
    }

    pub fn write<D: BlockDevice>(&self, disk: &D, addr: u32) -> Result<()> {
        write_block_as(disk, addr, self)
    }

    /// Index of the first unused direct pointer slot, if any.
    pub fn first_free_direct(&self) -> Option<usize> {
        self.direct.iter().position(|&ptr| ptr == NONE)
    }

    /// The direct pointers that actually reference a block.
    pub fn linked_blocks(&self) -> impl Iterator<Item = u32> + '_ {
        self.direct.iter().copied().filter(|&ptr| ptr != NONE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::MemDisk;

    #[test]
    fn write_then_read_round_trips() {
        let disk = MemDisk::new(8);
        let mut inode = Inode::new(InodeKind::Directory);
        inode.size = 64;
        inode.direct[0] = 5;
        inode.write(&disk, 3).unwrap();

        let read = Inode::read(&disk, 3).unwrap();
        assert_eq!(read.size, 64);
        assert_eq!(read.kind, InodeKind::Directory);
        assert_eq!(read.direct[0], 5);
        assert_eq!(read.indirect, NONE);
    }

    #[test]
    fn first_free_direct_skips_used_slots() {
        let mut inode = Inode::new(InodeKind::Directory);
        assert_eq!(inode.first_free_direct(), Some(0));
        inode.direct[0] = 9;
        assert_eq!(inode.first_free_direct(), Some(1));
        inode.direct = [9; NDIRECT];
        assert_eq!(inode.first_free_direct(), None);
    }
}
