use std::io::Result;

use crate::disk::types::Block;

/// A fixed-size random-access block device. Indices past `total_blocks`
/// are rejected by the implementation with `InvalidInput`.
pub trait BlockDevice: Send + Sync {
    fn total_blocks(&self) -> u32;
    fn read_block(&self, block_id: u32, buf: &mut Block) -> Result<()>;
    fn write_block(&self, block_id: u32, buf: &Block) -> Result<()>;
}
