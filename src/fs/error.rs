use std::fmt;

/// Everything a file-system operation can fail with. Mutating operations
/// validate all of their preconditions before the first persisted write, so
/// any of these (other than `Io`) leaves the volume unchanged.
#[derive(Debug)]
pub enum FsError {
    /// Underlying device I/O or encoding failure.
    Io(std::io::Error),
    /// Superblock magic did not match at mount; the image is not one of ours.
    BadMagic(u32),
    NotFound,
    NotADirectory,
    IsADirectory,
    AlreadyExists,
    /// The directory has no free entry slot and no free direct pointer left.
    DirectoryFull,
    /// The free-space bitmap is exhausted.
    NoBlockAvailable,
    NotEmpty,
    InvalidArgument,
    /// Declared but intentionally unimplemented (cpin/cpout).
    NotImplemented,
}

impl From<std::io::Error> for FsError {
    fn from(e: std::io::Error) -> Self {
        FsError::Io(e)
    }
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "Disk I/O error: {}", e),
            Self::BadMagic(m) => write!(f, "Bad superblock magic: {:#010x}", m),
            Self::NotFound => write!(f, "No such file or directory"),
            Self::NotADirectory => write!(f, "Not a directory"),
            Self::IsADirectory => write!(f, "Is a directory"),
            Self::AlreadyExists => write!(f, "Already exists"),
            Self::DirectoryFull => write!(f, "Directory full"),
            Self::NoBlockAvailable => write!(f, "No block available"),
            Self::NotEmpty => write!(f, "Directory not empty"),
            Self::InvalidArgument => write!(f, "Invalid argument"),
            Self::NotImplemented => write!(f, "Not implemented"),
        }
    }
}

impl std::error::Error for FsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, FsError>;
