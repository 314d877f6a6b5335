use std::path::Path;

use colored::*;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};

use crate::disk::FileDisk;
use crate::fs::error::FsError;
use crate::fs::inode::InodeKind;
use crate::fs::{FileSystem, Session};

/// Blocks in an image created through the shell: 2 MiB at 512-byte blocks.
const DEFAULT_IMAGE_BLOCKS: u32 = 4096;

#[derive(Debug)]
pub enum Command {
    Help,
    Mount(String),
    Umount,
    Touch(String),
    Mkdir(String),
    Rmdir(String),
    Rm(String),
    Mv(String, String),
    Ls(Option<String>),
    Cd(Option<String>),
    Pwd,
    Dump,
    Cpin(String, String),
    Cpout(String, String),
    Exit,
}

/// A mounted volume plus its current-directory session.
pub struct Mounted {
    pub fs: FileSystem<FileDisk>,
    pub session: Session,
}

/// Typed errors surface here, formatted as `<command>: <name>: <message>`.
fn print_error(command: &str, name: &str, err: &FsError) {
    println!("{}", format!("{}: {}: {}", command, name, err).red());
}

fn not_mounted() {
    println!("{}", "no volume mounted (use 'mount <image>')".yellow());
}

pub fn execute_command(cmd: &Command, state: &mut Option<Mounted>) {
    match cmd {
        Command::Help => print_help(),
        Command::Mount(path) => mount(path, state),
        Command::Umount => umount(state),
        Command::Exit => umount(state),

        Command::Touch(name) => {
            if let Some(m) = state {
                if let Err(e) = m.fs.create(m.session.cwd_ino, name, InodeKind::File) {
                    print_error("touch", name, &e);
                }
            } else {
                not_mounted();
            }
        }
        Command::Mkdir(name) => {
            if let Some(m) = state {
                if let Err(e) = m.fs.create(m.session.cwd_ino, name, InodeKind::Directory) {
                    print_error("mkdir", name, &e);
                }
            } else {
                not_mounted();
            }
        }
        Command::Rmdir(name) => {
            if let Some(m) = state {
                if let Err(e) = m.fs.remove_dir(m.session.cwd_ino, name) {
                    print_error("rmdir", name, &e);
                }
            } else {
                not_mounted();
            }
        }
        Command::Rm(name) => {
            if let Some(m) = state {
                if let Err(e) = m.fs.remove_file(m.session.cwd_ino, name) {
                    print_error("rm", name, &e);
                }
            } else {
                not_mounted();
            }
        }
        Command::Mv(old, new) => {
            if let Some(m) = state {
                if let Err(e) = m.fs.rename(m.session.cwd_ino, old, new) {
                    print_error("mv", old, &e);
                }
            } else {
                not_mounted();
            }
        }
        Command::Ls(name) => {
            if let Some(m) = state {
                match m.fs.list(m.session.cwd_ino, name.as_deref()) {
                    Ok(entries) => print_listing(&entries),
                    Err(e) => {
                        print_error("ls", name.as_deref().unwrap_or(&m.session.cwd_name), &e)
                    }
                }
            } else {
                not_mounted();
            }
        }
        Command::Cd(name) => {
            if let Some(m) = state {
                match m.fs.change_dir(m.session.cwd_ino, name.as_deref()) {
                    Ok((ino, cwd_name)) => {
                        m.session.cwd_ino = ino;
                        m.session.cwd_name = cwd_name;
                    }
                    Err(e) => print_error("cd", name.as_deref().unwrap_or("/"), &e),
                }
            } else {
                not_mounted();
            }
        }
        Command::Pwd => {
            if let Some(m) = state {
                println!("{}", m.session.cwd_name.cyan());
            } else {
                not_mounted();
            }
        }
        Command::Dump => {
            if let Some(m) = state {
                match m.fs.dump(m.session.cwd_ino, &m.session.cwd_name) {
                    Ok(text) => print!("{}", text),
                    Err(e) => print_error("dump", &m.session.cwd_name, &e),
                }
            } else {
                not_mounted();
            }
        }
        Command::Cpin(_, name) => print_error("cpin", name, &FsError::NotImplemented),
        Command::Cpout(name, _) => print_error("cpout", name, &FsError::NotImplemented),
    }
}

fn print_listing(entries: &[(String, InodeKind)]) {
    for (name, kind) in entries {
        match kind {
            InodeKind::Directory => print!("{}\t", format!("{}/", name).blue().bold()),
            InodeKind::File => print!("{}\t", name),
        }
    }
    println!();
}

/// Mounting over an existing mount unmounts the old volume first. A path
/// that does not exist can be created and formatted on the spot.
fn mount(path: &str, state: &mut Option<Mounted>) {
    umount(state);

    let exists = Path::new(path).exists();
    let result = if exists {
        match FileDisk::open(path) {
            Ok(disk) => FileSystem::mount(disk),
            Err(_) => {
                println!("{}", format!("mount: {}: cannot open image", path).red());
                return;
            }
        }
    } else {
        let create = Confirm::new()
            .with_prompt(format!("{} does not exist, create a new image?", path))
            .default(true)
            .interact()
            .unwrap_or(false);
        if !create {
            println!("{}", format!("mount: {}: cannot open image", path).red());
            return;
        }
        create_image(path)
    };

    match result {
        Ok(fs) => {
            let root = fs.root_ino();
            println!("Disk image: {}", path);
            println!("Superblock magic: {:x}", fs.super_block().magic);
            println!("Number of blocks: {}", fs.super_block().total_blocks);
            println!("Volume name: {}", fs.super_block().volume_name);
            println!(
                "{}",
                format!("{}, mounted", fs.super_block().volume_name).green()
            );
            *state = Some(Mounted {
                fs,
                session: Session::at_root(root),
            });
        }
        Err(e) => print_error("mount", path, &e),
    }
}

fn create_image(path: &str) -> Result<FileSystem<FileDisk>, FsError> {
    let volume_name = Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("blockfs")
        .to_string();

    let pb = ProgressBar::new(2);
    pb.set_style(
        ProgressStyle::with_template("[{bar:40.cyan/blue}] {msg}")
            .unwrap()
            .progress_chars("=> "),
    );

    pb.set_message("allocating image...");
    let disk = FileDisk::create(path, DEFAULT_IMAGE_BLOCKS)?;
    pb.inc(1);

    pb.set_message("formatting...");
    let fs = FileSystem::format(disk, &volume_name)?;
    pb.inc(1);
    pb.finish_with_message("done");

    Ok(fs)
}

fn umount(state: &mut Option<Mounted>) {
    if let Some(m) = state.take() {
        println!(
            "{}",
            format!("{}, unmounted", m.fs.super_block().volume_name).yellow()
        );
    }
}

fn print_help() {
    println!("{}", "BlockFS commands".bright_cyan().bold());
    println!(
        "{}",
        "
  mount <image>      Mount a disk image (offers to create a missing one)
  umount             Unmount the current volume
  ls [name]          List the current directory, a file, or a subdirectory
  cd [name]          Change directory (no argument returns to root)
  pwd                Print the current directory name
  touch <name>       Create an empty file
  mkdir <name>       Create a directory
  rm <name>          Remove a file
  rmdir <name>       Remove an empty directory
  mv <old> <new>     Rename an entry in the current directory
  dump               Print the current directory's on-disk structure
  cpin <local> <n>   Copy a host file in (not implemented)
  cpout <n> <local>  Copy a file out to the host (not implemented)
  help               Show this help message
  exit               Quit the shell
"
        .bright_black()
    );
}
