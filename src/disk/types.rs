/// Size of one logical block in bytes. Every read and write against a
/// [`BlockDevice`](super::BlockDevice) moves exactly one block.
pub const BLOCK_SIZE: usize = 512;

/// One logical block's worth of bytes.
pub type Block = [u8; BLOCK_SIZE];
