//! The ext2 volume engine: on-disk data model, block/inode allocator, path resolver,
//! directory-entry editor, and block-tree I/O for a single mounted image.

pub mod bgdt;
pub mod bitmap;
pub mod block_device;
pub mod blocktree;
pub mod directory;
pub mod error;
pub mod inode;
pub mod path;
pub mod raw;
pub mod session;
pub mod superblock;
pub mod volume;

#[cfg(test)]
pub mod testutil;

pub use error::Error;
pub use error::Result;
pub use inode::FileType;
pub use volume::Volume;
