//! `rmdir path`: deletes an empty directory.

use crate::commands::common::load_dir;
use crate::commands::common::store_dir;
use crate::ext2::directory;
use crate::ext2::error::Error;
use crate::ext2::error::Result;
use crate::ext2::inode::FileType;
use crate::ext2::path;
use crate::ext2::volume::Volume;
use crate::ext2::volume::now;

pub fn rmdir(vol: &mut Volume, cwd: u32, path: &str) -> Result<()> {
	let (parent_path, leaf) = path::split_leaf(path);
	path::reject_dot_entries(leaf)?;
	let (parent_n, parent_type) = vol.resolve(cwd, parent_path)?;
	if !parent_type.is_directory() {
		return Err(Error::NotADirectory);
	}

	let (mut parent, mut parent_buf, mut parent_size) = load_dir(vol, parent_n)?;
	let (target_n, target_type) = directory::lookup(&parent_buf, parent_size, leaf).ok_or(Error::NotFound)?;
	if target_type != FileType::Directory {
		return Err(Error::NotADirectory);
	}

	let (target, target_buf, target_size) = load_dir(vol, target_n)?;
	if directory::count_live(&target_buf, target_size) != 2 {
		return Err(Error::NotEmpty);
	}

	directory::delete(&mut parent_buf, parent_size, leaf)?;
	parent.links_count = parent.links_count.saturating_sub(1);
	parent.mtime = now();
	parent.ctime = now();
	store_dir(vol, parent_n, &mut parent, &parent_buf, parent_size)?;

	vol.deallocate_block(target.block[0])?;
	vol.deallocate_inode(target_n)?;
	vol.dec_used_dirs(vol.inode_group(target_n))
}
