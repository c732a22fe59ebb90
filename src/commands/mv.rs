//! `mv src dst`: moves or renames a directory entry, possibly across directories.

use crate::commands::common::load_dir;
use crate::commands::common::store_dir;
use crate::ext2::directory;
use crate::ext2::error::Error;
use crate::ext2::error::Result;
use crate::ext2::inode::FileType;
use crate::ext2::path;
use crate::ext2::volume::Volume;
use crate::ext2::volume::now;

pub fn mv(vol: &mut Volume, cwd: u32, src: &str, dst: &str) -> Result<()> {
	let (src_parent_path, src_leaf) = path::split_leaf(src);
	path::reject_dot_entries(src_leaf)?;
	let (src_parent_n, src_parent_type) = vol.resolve(cwd, src_parent_path)?;
	if !src_parent_type.is_directory() {
		return Err(Error::NotADirectory);
	}
	let (_, src_buf, src_size) = load_dir(vol, src_parent_n)?;
	let (src_inode, src_type) = directory::lookup(&src_buf, src_size, src_leaf).ok_or(Error::NotFound)?;

	// If `dst` already names an existing directory, the effective destination is that
	// directory plus the source's own basename.
	let (dst_parent_n, dst_leaf) = match vol.resolve(cwd, dst) {
		Ok((n, t)) if t.is_directory() => (n, src_leaf.to_string()),
		_ => {
			let (dst_parent_path, dst_leaf) = path::split_leaf(dst);
			path::reject_dot_entries(dst_leaf)?;
			path::validate_name(dst_leaf)?;
			let (n, t) = vol.resolve(cwd, dst_parent_path)?;
			if !t.is_directory() {
				return Err(Error::NotADirectory);
			}
			(n, dst_leaf.to_string())
		}
	};

	let same_parent = src_parent_n == dst_parent_n;
	let now = now();

	if same_parent {
		// Both operands share one directory block: edit a single in-memory copy so the
		// insert and the delete don't race each other's writes to disk.
		let (mut parent, mut buf, mut size) = load_dir(vol, src_parent_n)?;
		if directory::contains(&buf, size, &dst_leaf) {
			return Err(Error::AlreadyExists);
		}
		directory::insert(&mut buf, &mut size, &dst_leaf, src_inode, src_type)?;
		directory::delete(&mut buf, size, src_leaf)?;
		parent.mtime = now;
		parent.ctime = now;
		store_dir(vol, src_parent_n, &mut parent, &buf, size)?;
	} else {
		let (mut dst_parent, mut dst_buf, mut dst_size) = load_dir(vol, dst_parent_n)?;
		if directory::contains(&dst_buf, dst_size, &dst_leaf) {
			return Err(Error::AlreadyExists);
		}
		directory::insert(&mut dst_buf, &mut dst_size, &dst_leaf, src_inode, src_type)?;

		let (mut src_parent, mut src_buf, src_size) = load_dir(vol, src_parent_n)?;
		if let Err(e) = directory::delete(&mut src_buf, src_size, src_leaf) {
			// Roll back the insert into the destination before surfacing the failure.
			let _ = directory::delete(&mut dst_buf, dst_size, &dst_leaf);
			return Err(e);
		}

		dst_parent.mtime = now;
		dst_parent.ctime = now;
		store_dir(vol, dst_parent_n, &mut dst_parent, &dst_buf, dst_size)?;

		src_parent.mtime = now;
		src_parent.ctime = now;
		store_dir(vol, src_parent_n, &mut src_parent, &src_buf, src_size)?;
	}

	if src_type.is_directory() {
		let moved = vol.read_inode(src_inode)?;
		let mut moved_buf = vol.read_block(moved.block[0])?;
		let moved_size = (moved.size() as usize).min(moved_buf.len());
		directory::rewrite_dotdot(&mut moved_buf, moved_size, dst_parent_n)?;
		vol.write_block(moved.block[0], &moved_buf)?;
	}

	Ok(())
}
