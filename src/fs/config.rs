use crate::disk::BLOCK_SIZE;

/// Identifies a formatted volume; checked on every mount.
pub const MAGIC: u32 = 0x4246_5331; // "BFS1"

/// The reserved block address meaning "no block" / "empty slot". Block 0 is
/// the superblock, so 0 can never name an inode or a data block. The same
/// constant is used by the free-slot scan and by deletion.
pub const NONE: u32 = 0;

/// Block 0 holds the superblock; the bitmap starts right behind it.
pub const SUPER_BLOCK_ID: u32 = 0;
pub const BITMAP_START_BLOCK: u32 = 1;

/// Direct block pointers per inode. Directories grow across these only;
/// the indirect pointer exists in the layout but is never exercised.
pub const NDIRECT: usize = 14;

/// Directory entries per directory block.
pub const DENTRY_PER_BLOCK: usize = 8;

/// Maximum entry name length in bytes.
pub const NAMELEN: usize = 24;

/// On-disk accounting width of one directory entry. Directory inode sizes
/// move in multiples of this.
pub const DIRENT_SIZE: u32 = 32;

/// One bitmap block covers this many block indices (one bit each).
pub const BITS_PER_BLOCK: u32 = (BLOCK_SIZE * 8) as u32;

/// Number of bitmap blocks needed to cover a volume of `total_blocks`.
pub fn bitmap_blocks(total_blocks: u32) -> u32 {
    (total_blocks + BITS_PER_BLOCK - 1) / BITS_PER_BLOCK
}

/// The root inode lives in the first block after the bitmap. It is computed
/// from the layout at mount, never stored and never derived from anything
/// else.
pub fn root_inode_block(total_blocks: u32) -> u32 {
    BITMAP_START_BLOCK + bitmap_blocks(total_blocks)
}
