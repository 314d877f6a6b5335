use std::{
    io::{Error, ErrorKind, Result},
    sync::Mutex,
};

use crate::disk::{
    block_device::BlockDevice,
    types::{Block, BLOCK_SIZE},
};

/// An in-memory block device. Mainly useful for tests, where a real disk
/// image would just slow things down.
#[derive(Debug)]
pub struct MemDisk {
    blocks: Mutex<Vec<u8>>,
    total_blocks: u32,
}

impl MemDisk {
    pub fn new(total_blocks: u32) -> Self {
        Self {
            blocks: Mutex::new(vec![0; total_blocks as usize * BLOCK_SIZE]),
            total_blocks,
        }
    }

    fn check_bounds(&self, block_id: u32) -> Result<()> {
        if block_id >= self.total_blocks {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("block {} out of range", block_id),
            ));
        }
        Ok(())
    }
}

impl BlockDevice for MemDisk {
    fn total_blocks(&self) -> u32 {
        self.total_blocks
    }

    fn read_block(&self, block_id: u32, buf: &mut Block) -> Result<()> {
        self.check_bounds(block_id)?;
        let blocks = self.blocks.lock().unwrap();
        let start = block_id as usize * BLOCK_SIZE;
        buf.copy_from_slice(&blocks[start..start + BLOCK_SIZE]);
        Ok(())
    }

    fn write_block(&self, block_id: u32, buf: &Block) -> Result<()> {
        self.check_bounds(block_id)?;
        let mut blocks = self.blocks.lock().unwrap();
        let start = block_id as usize * BLOCK_SIZE;
        blocks[start..start + BLOCK_SIZE].copy_from_slice(buf);
        Ok(())
    }
}
