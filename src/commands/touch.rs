//! `touch path`: creates an empty regular file.

use crate::commands::common::load_dir;
use crate::commands::common::resolve_parent_and_leaf;
use crate::commands::common::store_dir;
use crate::ext2::directory;
use crate::ext2::error::Error;
use crate::ext2::error::Result;
use crate::ext2::inode::FileType;
use crate::ext2::inode::Inode;
use crate::ext2::volume::Volume;
use crate::ext2::volume::now;

/// The default permission bits `touch` gives a new regular file.
const DEFAULT_FILE_MODE: u16 = 0o644;

pub fn touch(vol: &mut Volume, cwd: u32, path: &str) -> Result<()> {
	let (parent_n, leaf) = resolve_parent_and_leaf(vol, cwd, path)?;
	let (mut parent, mut buf, mut size) = load_dir(vol, parent_n)?;

	if directory::contains(&buf, size, &leaf) {
		return Err(Error::AlreadyExists);
	}

	let new_n = vol.allocate_inode()?;
	let new_inode = Inode::new_regular(now(), DEFAULT_FILE_MODE);
	vol.write_inode(new_n, &new_inode)?;

	if let Err(e) = directory::insert(&mut buf, &mut size, &leaf, new_n, FileType::Regular) {
		vol.deallocate_inode(new_n)?;
		return Err(e);
	}

	parent.mtime = now();
	parent.ctime = now();
	store_dir(vol, parent_n, &mut parent, &buf, size)
}
