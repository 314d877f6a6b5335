use serde::{de::DeserializeOwned, Serialize};

use crate::disk::{Block, BlockDevice, BLOCK_SIZE};

pub mod bitmap;
pub mod config;
pub mod directory;
pub mod error;
pub mod inode;
pub mod super_block;

use crate::fs::bitmap::FreeSpaceBitmap;
use crate::fs::config::{root_inode_block, DIRENT_SIZE, NAMELEN, NONE};
use crate::fs::directory::{DirEntry, DirectoryBlock};
use crate::fs::error::{FsError, Result};
use crate::fs::inode::{Inode, InodeKind};
use crate::fs::super_block::SuperBlock;

/// Decodes the struct stored at block `addr`.
pub(crate) fn read_block_as<T: DeserializeOwned, D: BlockDevice>(disk: &D, addr: u32) -> Result<T> {
    let mut buf: Block = [0; BLOCK_SIZE];
    disk.read_block(addr, &mut buf)?;
    bincode::deserialize(&buf).map_err(codec_error)
}

/// Encodes `value` into a zero-padded block and writes it at `addr`.
pub(crate) fn write_block_as<T: Serialize, D: BlockDevice>(
    disk: &D,
    addr: u32,
    value: &T,
) -> Result<()> {
    let bytes = bincode::serialize(value).map_err(codec_error)?;
    // Every on-disk struct encodes well below one block.
    debug_assert!(bytes.len() <= BLOCK_SIZE);
    let mut buf: Block = [0; BLOCK_SIZE];
    buf[..bytes.len()].copy_from_slice(&bytes);
    disk.write_block(addr, &buf)?;
    Ok(())
}

fn codec_error(e: bincode::Error) -> FsError {
    FsError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

/// The mount's current-directory state. The engine itself is stateless
/// between calls; the shell owns one of these per mounted volume.
#[derive(Debug, Clone)]
pub struct Session {
    pub cwd_ino: u32,
    pub cwd_name: String,
}

impl Session {
    pub fn at_root(root_ino: u32) -> Self {
        Self {
            cwd_ino: root_ino,
            cwd_name: "/".to_string(),
        }
    }
}

/// A mounted volume: the block device, the superblock read at mount, and
/// the free-space bitmap. All directory-tree mutations go through here,
/// one single-name operation at a time; there is no path resolver.
#[derive(Debug)]
pub struct FileSystem<D: BlockDevice> {
    disk: D,
    super_block: SuperBlock,
    bitmap: FreeSpaceBitmap,
    root_ino: u32,
}

impl<D: BlockDevice> FileSystem<D> {
    /// Writes a fresh file system onto `disk`: superblock, bitmap, and a
    /// root directory containing only "." and "..".
    pub fn format(disk: D, volume_name: &str) -> Result<Self> {
        let total_blocks = disk.total_blocks();
        let bitmap = FreeSpaceBitmap::format(&disk, total_blocks)?;
        let super_block = SuperBlock::new(total_blocks, volume_name);
        super_block.sync(&disk)?;

        let root_ino = bitmap.allocate(&disk)?;
        debug_assert_eq!(root_ino, root_inode_block(total_blocks));
        let root_block = bitmap.allocate(&disk)?;

        DirectoryBlock::first_block(root_ino, root_ino).write(&disk, root_block)?;
        let mut root = Inode::new(InodeKind::Directory);
        root.direct[0] = root_block;
        root.size = 2 * DIRENT_SIZE;
        root.write(&disk, root_ino)?;

        Ok(Self {
            disk,
            super_block,
            bitmap,
            root_ino,
        })
    }

    /// Mounts an already-formatted volume. Fails with `BadMagic` on
    /// anything that is not one of our images.
    pub fn mount(disk: D) -> Result<Self> {
        let super_block = SuperBlock::load(&disk)?;
        if super_block.total_blocks > disk.total_blocks() {
            return Err(FsError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "superblock block count exceeds the device",
            )));
        }
        let bitmap = FreeSpaceBitmap::open(super_block.total_blocks);
        let root_ino = root_inode_block(super_block.total_blocks);
        Ok(Self {
            disk,
            super_block,
            bitmap,
            root_ino,
        })
    }

    pub fn root_ino(&self) -> u32 {
        self.root_ino
    }

    /// Releases the underlying device (unmount).
    pub fn into_disk(self) -> D {
        self.disk
    }

    pub fn super_block(&self) -> &SuperBlock {
        &self.super_block
    }

    /// Blocks still allocatable on this volume.
    pub fn free_blocks(&self) -> Result<u32> {
        self.bitmap.free_count(&self.disk)
    }

    pub fn read_inode(&self, addr: u32) -> Result<Inode> {
        Inode::read(&self.disk, addr)
    }

    /// Creates a file or directory named `name` under `parent` and returns
    /// the new inode's block address. Any failure after the first tentative
    /// allocation releases everything again; the allocator ends up exactly
    /// where it started.
    pub fn create(&self, parent: u32, name: &str, kind: InodeKind) -> Result<u32> {
        validate_name(name)?;
        let mut parent_inode = self.read_dir_inode(parent)?;
        if self.lookup(&parent_inode, name)?.is_some() {
            return Err(FsError::AlreadyExists);
        }

        let new_ino = self.bitmap.allocate(&self.disk)?;

        // Find a vacant entry slot in the already-linked blocks; slots 0/1
        // of the first block belong to "." and "..".
        let mut chosen: Option<(u32, usize, DirectoryBlock)> = None;
        for (i, &ptr) in parent_inode.direct.iter().enumerate() {
            if ptr == NONE {
                continue;
            }
            let block = DirectoryBlock::read(&self.disk, ptr)?;
            let from = if i == 0 { 2 } else { 0 };
            if let Some(slot) = block.first_vacant(from) {
                chosen = Some((ptr, slot, block));
                break;
            }
        }

        // No slot: link a fresh directory block if a direct pointer is
        // still free, otherwise the directory is full.
        let mut fresh: Option<u32> = None;
        let (entry_addr, slot, mut entry_block) = match chosen {
            Some(c) => c,
            None => match parent_inode.first_free_direct() {
                Some(index) => {
                    let addr = match self.bitmap.allocate(&self.disk) {
                        Ok(addr) => addr,
                        Err(e) => {
                            self.bitmap.free(&self.disk, new_ino)?;
                            return Err(e);
                        }
                    };
                    parent_inode.direct[index] = addr;
                    fresh = Some(addr);
                    (addr, 0, DirectoryBlock::empty())
                }
                None => {
                    self.bitmap.free(&self.disk, new_ino)?;
                    return Err(FsError::DirectoryFull);
                }
            },
        };

        // A new directory also needs its own first block for "." and "..".
        let mut new_inode = Inode::new(kind);
        if kind == InodeKind::Directory {
            let child_block = match self.bitmap.allocate(&self.disk) {
                Ok(addr) => addr,
                Err(e) => {
                    if let Some(addr) = fresh {
                        self.bitmap.free(&self.disk, addr)?;
                    }
                    self.bitmap.free(&self.disk, new_ino)?;
                    return Err(e);
                }
            };
            DirectoryBlock::first_block(new_ino, parent).write(&self.disk, child_block)?;
            new_inode.direct[0] = child_block;
            new_inode.size = 2 * DIRENT_SIZE;
        }

        // All blocks are held; from here on every write commits.
        new_inode.write(&self.disk, new_ino)?;

        entry_block.entries[slot] = DirEntry::new(name, new_ino);
        entry_block.write(&self.disk, entry_addr)?;

        parent_inode.size += DIRENT_SIZE;
        parent_inode.write(&self.disk, parent)?;

        Ok(new_ino)
    }

    /// Removes the file named `name` from `parent`, returning its data
    /// blocks and its inode block to the allocator.
    pub fn remove_file(&self, parent: u32, name: &str) -> Result<()> {
        let mut parent_inode = self.read_dir_inode(parent)?;
        let (entry_addr, slot, ino) = self
            .lookup(&parent_inode, name)?
            .ok_or(FsError::NotFound)?;

        let target = Inode::read(&self.disk, ino)?;
        if target.kind == InodeKind::Directory {
            return Err(FsError::IsADirectory);
        }

        // Free the addresses the inode actually records, never anything
        // derived from the inode's own position.
        for ptr in target.linked_blocks() {
            self.bitmap.free(&self.disk, ptr)?;
        }
        self.bitmap.free(&self.disk, ino)?;

        self.clear_entry(&mut parent_inode, parent, entry_addr, slot)
    }

    /// Removes the empty directory named `name` from `parent`.
    pub fn remove_dir(&self, parent: u32, name: &str) -> Result<()> {
        if name == "." || name == ".." {
            return Err(FsError::InvalidArgument);
        }
        let mut parent_inode = self.read_dir_inode(parent)?;
        let (entry_addr, slot, ino) = self
            .lookup(&parent_inode, name)?
            .ok_or(FsError::NotFound)?;

        let target = Inode::read(&self.disk, ino)?;
        if target.kind != InodeKind::Directory {
            return Err(FsError::NotADirectory);
        }

        // Anything beyond the reserved "." and ".." slots makes it non-empty.
        for (i, &ptr) in target.direct.iter().enumerate() {
            if ptr == NONE {
                continue;
            }
            let block = DirectoryBlock::read(&self.disk, ptr)?;
            let from = if i == 0 { 2 } else { 0 };
            if block.entries[from..].iter().any(|e| !e.is_vacant()) {
                return Err(FsError::NotEmpty);
            }
        }

        for ptr in target.linked_blocks() {
            self.bitmap.free(&self.disk, ptr)?;
        }
        self.bitmap.free(&self.disk, ino)?;

        self.clear_entry(&mut parent_inode, parent, entry_addr, slot)
    }

    /// Renames `old` to `new` within `parent`. The entry keeps its inode
    /// and its slot; only the name field is rewritten.
    pub fn rename(&self, parent: u32, old: &str, new: &str) -> Result<()> {
        validate_name(old)?;
        validate_name(new)?;
        let parent_inode = self.read_dir_inode(parent)?;
        if self.lookup(&parent_inode, new)?.is_some() {
            return Err(FsError::AlreadyExists);
        }
        let (entry_addr, slot, _) = self
            .lookup(&parent_inode, old)?
            .ok_or(FsError::NotFound)?;

        let mut block = DirectoryBlock::read(&self.disk, entry_addr)?;
        block.entries[slot].name = new.to_string();
        block.write(&self.disk, entry_addr)
    }

    /// With no name: every live entry of `dir` in block-then-slot order,
    /// tagged with its kind. With a name: the matching file itself, or one
    /// level of the matching directory's own listing.
    pub fn list(&self, dir: u32, name: Option<&str>) -> Result<Vec<(String, InodeKind)>> {
        let dir_inode = self.read_dir_inode(dir)?;
        match name {
            None => self.list_entries(&dir_inode),
            Some(name) => {
                let (_, _, ino) = self
                    .lookup(&dir_inode, name)?
                    .ok_or(FsError::NotFound)?;
                let target = Inode::read(&self.disk, ino)?;
                match target.kind {
                    InodeKind::File => Ok(vec![(name.to_string(), InodeKind::File)]),
                    InodeKind::Directory => self.list_entries(&target),
                }
            }
        }
    }

    /// Resolves the new current directory. No name means back to root.
    pub fn change_dir(&self, current: u32, name: Option<&str>) -> Result<(u32, String)> {
        match name {
            None => Ok((self.root_ino, "/".to_string())),
            Some(name) => {
                let current_inode = self.read_dir_inode(current)?;
                let (_, _, ino) = self
                    .lookup(&current_inode, name)?
                    .ok_or(FsError::NotFound)?;
                if Inode::read(&self.disk, ino)?.kind != InodeKind::Directory {
                    return Err(FsError::NotADirectory);
                }
                Ok((ino, name.to_string()))
            }
        }
    }

    /// Renders the directory at `ino` for the `dump` command: the inode
    /// line, every live entry, and the inode line of each file entry.
    pub fn dump(&self, ino: u32, name: &str) -> Result<String> {
        let inode = Inode::read(&self.disk, ino)?;
        let mut out = String::new();
        out.push_str(&format!("cwd inode {} name {}\n", ino, name));
        self.dump_inode(&mut out, &inode, 0)?;
        Ok(out)
    }

    fn dump_inode(&self, out: &mut String, inode: &Inode, depth: usize) -> Result<()> {
        let pad = "\t".repeat(depth);
        let kind = match inode.kind {
            InodeKind::File => "FILE",
            InodeKind::Directory => "DIR",
        };
        out.push_str(&format!(
            "{}size {} type {} direct {:?} indirect {}\n",
            pad, inode.size, kind, inode.direct, inode.indirect
        ));

        if inode.kind != InodeKind::Directory {
            return Ok(());
        }
        for ptr in inode.linked_blocks() {
            let block = DirectoryBlock::read(&self.disk, ptr)?;
            for entry in block.entries.iter().filter(|e| !e.is_vacant()) {
                out.push_str(&format!("{}{} {}\n", pad, entry.ino, entry.name));
                let child = Inode::read(&self.disk, entry.ino)?;
                if child.kind == InodeKind::File {
                    self.dump_inode(out, &child, depth + 1)?;
                }
            }
        }
        Ok(())
    }

    fn read_dir_inode(&self, addr: u32) -> Result<Inode> {
        let inode = Inode::read(&self.disk, addr)?;
        if inode.kind != InodeKind::Directory {
            return Err(FsError::NotADirectory);
        }
        Ok(inode)
    }

    /// Finds `name` among the directory's live entries. Returns the owning
    /// block address, the slot index, and the entry's inode address.
    fn lookup(&self, dir: &Inode, name: &str) -> Result<Option<(u32, usize, u32)>> {
        for ptr in dir.linked_blocks() {
            let block = DirectoryBlock::read(&self.disk, ptr)?;
            if let Some(slot) = block.find(name) {
                return Ok(Some((ptr, slot, block.entries[slot].ino)));
            }
        }
        Ok(None)
    }

    fn list_entries(&self, dir: &Inode) -> Result<Vec<(String, InodeKind)>> {
        let mut out = Vec::new();
        for ptr in dir.linked_blocks() {
            let block = DirectoryBlock::read(&self.disk, ptr)?;
            for entry in block.entries.iter().filter(|e| !e.is_vacant()) {
                let kind = Inode::read(&self.disk, entry.ino)?.kind;
                out.push((entry.name.clone(), kind));
            }
        }
        Ok(out)
    }

    fn clear_entry(
        &self,
        parent_inode: &mut Inode,
        parent: u32,
        entry_addr: u32,
        slot: usize,
    ) -> Result<()> {
        let mut block = DirectoryBlock::read(&self.disk, entry_addr)?;
        block.entries[slot] = DirEntry::vacant();
        block.write(&self.disk, entry_addr)?;

        parent_inode.size = parent_inode.size.saturating_sub(DIRENT_SIZE);
        parent_inode.write(&self.disk, parent)
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." {
        return Err(FsError::InvalidArgument);
    }
    if name.contains('/') || name.len() > NAMELEN {
        return Err(FsError::InvalidArgument);
    }
    Ok(())
}
