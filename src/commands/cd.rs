//! `pwd` and `cd [path]`: session cwd bookkeeping.

use crate::ext2::error::Error;
use crate::ext2::error::Result;
use crate::ext2::session::Session;
use crate::ext2::volume::Volume;

/// Returns the session's current textual working directory.
pub fn pwd(session: &Session) -> &str {
	session.cwd_path()
}

/// Changes the session's cwd to `path` (root if omitted).
pub fn cd(vol: &mut Volume, session: &mut Session, path: Option<&str>) -> Result<()> {
	let path = path.unwrap_or("/");
	let (n, file_type) = vol.resolve(session.cwd_inode(), path)?;
	if !file_type.is_directory() {
		return Err(Error::NotADirectory);
	}
	session.enter(n, path);
	Ok(())
}
