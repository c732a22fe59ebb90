//! Command handlers: each one composes the ext2 engine primitives into one shell verb.
//!
//! A handler receives the session's cwd inode and whatever argument paths the REPL parsed off
//! the command line, and returns either a structured result or a typed [`crate::ext2::Error`].
//! No handler ever formats or prints anything; that belongs to the REPL.

pub mod attr;
pub mod cat;
pub mod cd;
mod common;
pub mod cp;
pub mod info;
pub mod ls;
pub mod mkdir;
pub mod mv;
pub mod rename;
pub mod rm;
pub mod rmdir;
pub mod touch;
