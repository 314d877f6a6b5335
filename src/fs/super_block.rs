use serde::{Deserialize, Serialize};

use crate::disk::BlockDevice;
use crate::fs::config::{MAGIC, SUPER_BLOCK_ID};
use crate::fs::error::{FsError, Result};
use crate::fs::{read_block_as, write_block_as};

/// Block 0 of every volume. Read once per mount, held for the session,
/// written only by format.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct SuperBlock {
    pub magic: u32,
    pub total_blocks: u32,
    pub volume_name: String,
}

impl SuperBlock {
    pub fn new(total_blocks: u32, volume_name: &str) -> Self {
        Self {
            magic: MAGIC,
            total_blocks,
            volume_name: volume_name.to_string(),
        }
    }

    /// Loads the superblock and validates the magic. A mismatch is fatal to
    /// the mount.
    pub fn load<D: BlockDevice>(disk: &D) -> Result<Self> {
        let sb: SuperBlock = read_block_as(disk, SUPER_BLOCK_ID)?;
        if sb.magic != MAGIC {
            return Err(FsError::BadMagic(sb.magic));
        }
        Ok(sb)
    }

    pub fn sync<D: BlockDevice>(&self, disk: &D) -> Result<()> {
        write_block_as(disk, SUPER_BLOCK_ID, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::MemDisk;

    #[test]
    fn sync_then_load_round_trips() {
        let disk = MemDisk::new(8);
        let sb = SuperBlock::new(8, "testvol");
        sb.sync(&disk).unwrap();

        let loaded = SuperBlock::load(&disk).unwrap();
        assert_eq!(loaded, sb);
    }

    #[test]
    fn load_rejects_unformatted_disk() {
        let disk = MemDisk::new(8);
        match SuperBlock::load(&disk) {
            Err(FsError::BadMagic(_)) => {}
            other => panic!("expected BadMagic, got {:?}", other),
        }
    }
}
