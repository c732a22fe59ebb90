//! Error taxonomy for the ext2 volume engine.

use std::io;

/// An error produced by the ext2 volume engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// A read, write or seek on the image failed.
	#[error("I/O error: {0}")]
	Io(#[from] io::Error),

	/// The image's superblock is not a valid ext2 superblock for this engine (bad magic,
	/// impossible group/inode arithmetic, or an unsupported block size).
	#[error("invalid ext2 image: {0}")]
	InvalidImage(String),

	/// A path component could not be resolved to any inode.
	#[error("no such file or directory")]
	NotFound,

	/// A non-final path component (or an operand that must be a directory) is not one.
	#[error("not a directory")]
	NotADirectory,

	/// An operand that must be a regular file is not one.
	#[error("not a regular file")]
	NotAFile,

	/// The destination of a creating/renaming/moving/copying operation already exists.
	#[error("already exists")]
	AlreadyExists,

	/// A supplied name is empty, overlong, contains `/`, or misuses `.`/`..`.
	#[error("invalid name: {0}")]
	InvalidName(String),

	/// `rmdir` was called on a directory with entries besides `.` and `..`.
	#[error("directory not empty")]
	NotEmpty,

	/// There is no room to insert (or widen) a directory record in its one data block.
	#[error("directory is full")]
	DirFull,

	/// The bitmap allocator found no free inode or block.
	#[error("no space left on device")]
	NoSpace,

	/// `rename` was asked to operate across two different directories.
	#[error("cross-directory rename")]
	CrossDirectory,

	/// The operation is not supported by this engine (e.g. copying a directory).
	#[error("unsupported operation: {0}")]
	Unsupported(String),
}

/// A specialized [`Result`] for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
