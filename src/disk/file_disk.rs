use std::{
    fs::{File, OpenOptions},
    io::{Error, ErrorKind, Read, Result, Seek, SeekFrom, Write},
    path::Path,
    sync::Mutex,
};

use crate::disk::{
    block_device::BlockDevice,
    types::{Block, BLOCK_SIZE},
};

/// A block device backed by a regular file (the disk image).
#[derive(Debug)]
pub struct FileDisk {
    file: Mutex<File>,
    total_blocks: u32,
}

impl FileDisk {
    /// Opens an existing disk image. The image must already exist and hold a
    /// whole number of blocks.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;

        let len = file.metadata()?.len();
        if len == 0 || len % BLOCK_SIZE as u64 != 0 {
            return Err(Error::new(
                ErrorKind::InvalidData,
                "image size is not a multiple of the block size",
            ));
        }

        Ok(Self {
            file: Mutex::new(file),
            total_blocks: (len / BLOCK_SIZE as u64) as u32,
        })
    }

    /// Creates a zero-filled image of `total_blocks` blocks, truncating any
    /// existing file at `path`.
    pub fn create<P: AsRef<Path>>(path: P, total_blocks: u32) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        file.set_len(total_blocks as u64 * BLOCK_SIZE as u64)?;

        Ok(Self {
            file: Mutex::new(file),
            total_blocks,
        })
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

impl BlockDevice for FileDisk {
    fn total_blocks(&self) -> u32 {
        self.total_blocks
    }

    fn read_block(&self, block_id: u32, buf: &mut Block) -> Result<()> {
        self.check_bounds(block_id)?;
        let mut file = self.file.lock().unwrap();
        file.seek(SeekFrom::Start(block_id as u64 * BLOCK_SIZE as u64))?;
        file.read_exact(buf)?;
        Ok(())
    }

    fn write_block(&self, block_id: u32, buf: &Block) -> Result<()> {
        self.check_bounds(block_id)?;
        let mut file = self.file.lock().unwrap();
        file.seek(SeekFrom::Start(block_id as u64 * BLOCK_SIZE as u64))?;
        file.write_all(buf)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_reopen_round_trips_a_block() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("disk.img");

        let disk = FileDisk::create(&path, 16).unwrap();
        let mut block: Block = [0; BLOCK_SIZE];
        block[0] = 0xAB;
        block[BLOCK_SIZE - 1] = 0xCD;
        disk.write_block(7, &block).unwrap();
        drop(disk);

        let disk = FileDisk::open(&path).unwrap();
        assert_eq!(disk.total_blocks(), 16);
        let mut read: Block = [0; BLOCK_SIZE];
        disk.read_block(7, &mut read).unwrap();
        assert_eq!(read[0], 0xAB);
        assert_eq!(read[BLOCK_SIZE - 1], 0xCD);
    }

    #[test]
    fn open_missing_image_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FileDisk::open(dir.path().join("nope.img")).is_err());
    }

    #[test]
    fn out_of_range_block_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let disk = FileDisk::create(dir.path().join("disk.img"), 4).unwrap();
        let mut buf: Block = [0; BLOCK_SIZE];
        assert!(disk.read_block(4, &mut buf).is_err());
        assert!(disk.write_block(4, &buf).is_err());
    }
}
