use serde::{Deserialize, Serialize};

use crate::disk::BlockDevice;
use crate::fs::config::{DENTRY_PER_BLOCK, NONE};
use crate::fs::error::Result;
use crate::fs::{read_block_as, write_block_as};

/// A (name, inode address) pair. `ino == NONE` marks a vacant slot; the
/// deletion path and the free-slot scan agree on that one sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,
    pub ino: u32,
}

impl DirEntry {
    pub fn new(name: &str, ino: u32) -> Self {
        Self {
            name: name.to_string(),
            ino,
        }
    }

    pub fn vacant() -> Self {
        Self {
            name: String::new(),
            ino: NONE,
        }
    }

    pub fn is_vacant(&self) -> bool {
        self.ino == NONE
    }
}

/// One directory block: a fixed array of entry slots. The first block of a
/// directory reserves slot 0 for "." and slot 1 for ".."; those are written
/// at creation and never cleared while the directory exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryBlock {
    pub entries: [DirEntry; DENTRY_PER_BLOCK],
}

impl DirectoryBlock {
    pub fn empty() -> Self {
        Self {
            entries: std::array::from_fn(|_| DirEntry::vacant()),
        }
    }

    /// The first block of a fresh directory: "." pointing at the directory
    /// itself, ".." at its parent, everything else vacant.
    pub fn first_block(self_ino: u32, parent_ino: u32) -> Self {
        let mut block = Self::empty();
        block.entries[0] = DirEntry::new(".", self_ino);
        block.entries[1] = DirEntry::new("..", parent_ino);
        block
    }

    pub fn read<D: BlockDevice>(disk: &D, addr: u32) -> Result<Self> {
        read_block_as(disk, addr)
    }

    pub fn write<D: BlockDevice>(&self, disk: &D, addr: u32) -> Result<()> {
        write_block_as(disk, addr, self)
    }

    /// Slot index of the live entry named `name`, if present.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| !e.is_vacant() && e.name == name)
    }

    /// First vacant slot at or after `from` (2 for a directory's first
    /// block, 0 otherwise).
    pub fn first_vacant(&self, from: usize) -> Option<usize> {
        (from..DENTRY_PER_BLOCK).find(|&i| self.entries[i].is_vacant())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::MemDisk;

    #[test]
    fn first_block_reserves_dot_and_dotdot() {
        let block = DirectoryBlock::first_block(7, 3);
        assert_eq!(block.entries[0], DirEntry::new(".", 7));
        assert_eq!(block.entries[1], DirEntry::new("..", 3));
        assert!(block.entries[2..].iter().all(|e| e.is_vacant()));
        assert_eq!(block.first_vacant(2), Some(2));
    }

    #[test]
    fn find_ignores_vacant_slots() {
        let mut block = DirectoryBlock::empty();
        block.entries[3] = DirEntry::new("f", 9);
        assert_eq!(block.find("f"), Some(3));
        assert_eq!(block.find(""), None);
        block.entries[3] = DirEntry::vacant();
        assert_eq!(block.find("f"), None);
    }

    #[test]
    fn write_then_read_round_trips() {
        let disk = MemDisk::new(8);
        let mut block = DirectoryBlock::first_block(2, 2);
        block.entries[2] = DirEntry::new("hello", 5);
        block.write(&disk, 4).unwrap();

        let read = DirectoryBlock::read(&disk, 4).unwrap();
        assert_eq!(read.entries[2], DirEntry::new("hello", 5));
        assert_eq!(read.find("."), Some(0));
    }
}
