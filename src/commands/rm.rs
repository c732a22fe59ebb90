//! `rm path`: deletes a regular file.

use crate::commands::common::load_dir;
use crate::commands::common::store_dir;
use crate::ext2::directory;
use crate::ext2::error::Error;
use crate::ext2::error::Result;
use crate::ext2::inode::FileType;
use crate::ext2::path;
use crate::ext2::volume::Volume;
use crate::ext2::volume::now;

pub fn rm(vol: &mut Volume, cwd: u32, path: &str) -> Result<()> {
	let (parent_path, leaf) = path::split_leaf(path);
	let (parent_n, parent_type) = vol.resolve(cwd, parent_path)?;
	if !parent_type.is_directory() {
		return Err(Error::NotADirectory);
	}

	let (mut parent, mut buf, mut size) = load_dir(vol, parent_n)?;
	let (target_n, target_type) = directory::lookup(&buf, size, leaf).ok_or(Error::NotFound)?;
	if target_type != FileType::Regular {
		return Err(Error::NotAFile);
	}

	directory::delete(&mut buf, size, leaf)?;
	parent.mtime = now();
	parent.ctime = now();
	store_dir(vol, parent_n, &mut parent, &buf, size)?;

	let mut target = vol.read_inode(target_n)?;
	target.links_count = target.links_count.saturating_sub(1);
	if target.links_count == 0 {
		vol.free_block_tree(&mut target)?;
		target.set_size(0);
		target.blocks = 0;
		target.dtime = now();
		vol.write_inode(target_n, &target)?;
		vol.deallocate_inode(target_n)?;
	} else {
		vol.write_inode(target_n, &target)?;
	}

	Ok(())
}
