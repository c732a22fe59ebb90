//! `cp src dst`: copies a regular file.

use crate::commands::common::load_dir;
use crate::commands::common::store_dir;
use crate::ext2::directory;
use crate::ext2::error::Error;
use crate::ext2::error::Result;
use crate::ext2::inode::DIRECT_POINTERS;
use crate::ext2::inode::FileType;
use crate::ext2::inode::Inode;
use crate::ext2::path;
use crate::ext2::volume::Volume;
use crate::ext2::volume::now;

pub fn cp(vol: &mut Volume, cwd: u32, src: &str, dst: &str) -> Result<()> {
	let (src_n, src_type) = vol.resolve(cwd, src)?;
	match src_type {
		FileType::Regular => {}
		FileType::Directory => return Err(Error::Unsupported("copying a directory".into())),
		_ => return Err(Error::NotAFile),
	}
	let source = vol.read_inode(src_n)?;

	let (dst_parent_n, dst_leaf) = match vol.resolve(cwd, dst) {
		Ok((n, t)) if t.is_directory() => {
			let (_, leaf) = path::split_leaf(src);
			(n, leaf.to_string())
		}
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

	let (mut dst_parent, mut dst_buf, mut dst_size) = load_dir(vol, dst_parent_n)?;
	if directory::contains(&dst_buf, dst_size, &dst_leaf) {
		return Err(Error::AlreadyExists);
	}

	let new_n = match vol.allocate_inode() {
		Ok(n) => n,
		Err(e) => return Err(e),
	};

	let mut new_inode = Inode {
		mode: source.mode,
		uid: source.uid,
		gid: source.gid,
		flags: source.flags,
		links_count: 1,
		..Inode::new_regular(now(), source.mode & 0o7777)
	};

	let mut new_blocks = Vec::new();
	if let Err(e) = copy_direct_blocks(vol, &source, &mut new_inode, &mut new_blocks) {
		rollback(vol, new_n, &new_blocks);
		return Err(e);
	}
	new_inode.set_size(source.size());
	new_inode.blocks = (new_blocks.len() as u32) * (crate::ext2::block_device::BLOCK_SIZE / 512);

	if let Err(e) = vol.write_inode(new_n, &new_inode) {
		rollback(vol, new_n, &new_blocks);
		return Err(e);
	}

	if let Err(e) = directory::insert(&mut dst_buf, &mut dst_size, &dst_leaf, new_n, FileType::Regular) {
		rollback(vol, new_n, &new_blocks);
		return Err(e);
	}

	dst_parent.mtime = now();
	dst_parent.ctime = now();
	store_dir(vol, dst_parent_n, &mut dst_parent, &dst_buf, dst_size)
}

/// Copies every non-zero direct pointer of `source` into a freshly allocated block, recording
/// each new block in `new_inode` and in `new_blocks` (for rollback). Indirect ranges are not
/// copied.
fn copy_direct_blocks(vol: &mut Volume, source: &Inode, new_inode: &mut Inode, new_blocks: &mut Vec<u32>) -> Result<()> {
	for i in 0..DIRECT_POINTERS {
		let src_block = source.block[i];
		if src_block == 0 {
			continue;
		}
		let data = vol.read_block(src_block)?;
		let dst_block = vol.allocate_block()?;
		new_blocks.push(dst_block);
		vol.write_block(dst_block, &data)?;
		new_inode.block[i] = dst_block;
	}
	Ok(())
}

fn rollback(vol: &mut Volume, inode: u32, blocks: &[u32]) {
	for &b in blocks {
		let _ = vol.deallocate_block(b);
	}
	let _ = vol.deallocate_inode(inode);
}
