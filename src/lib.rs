//! `ext2shell`: an interactive read/write shell over a raw ext2 filesystem image.
//!
//! [`ext2`] is the volume engine — block device, superblock/BGDT cache, bitmap allocator,
//! inode and directory-block I/O, path resolution. [`commands`] composes those primitives into
//! the shell's verbs (`info`, `ls`, `cat`, ...). Everything REPL-shaped (prompt formatting,
//! tokenizing a typed line, printing a result) lives in `main.rs`, outside this library.

pub mod commands;
pub mod ext2;
