//! Shared helpers used by more than one command handler.

use crate::ext2::block_device::BLOCK_SIZE;
use crate::ext2::error::Error;
use crate::ext2::error::Result;
use crate::ext2::inode::Inode;
use crate::ext2::path;
use crate::ext2::volume::Volume;

/// Loads a directory's inode and its single data block (clamped to one block, per this
/// engine's single-block-directory invariant), plus the block's logical size.
pub fn load_dir(vol: &mut Volume, n: u32) -> Result<(Inode, [u8; BLOCK_SIZE as usize], usize)> {
	let node = vol.read_inode(n)?;
	if !node.file_type().is_directory() {
		return Err(Error::NotADirectory);
	}
	let buf = vol.read_block(node.block[0])?;
	let size = (node.size() as usize).min(BLOCK_SIZE as usize);
	Ok((node, buf, size))
}

/// Writes a directory's data block back, updates its inode's `i_size`, and writes the inode.
pub fn store_dir(vol: &mut Volume, n: u32, node: &mut Inode, buf: &[u8; BLOCK_SIZE as usize], size: usize) -> Result<()> {
	vol.write_block(node.block[0], buf)?;
	node.set_size(size as u64);
	vol.write_inode(n, node)
}

/// Splits `path` into its parent directory's inode number and the leaf name, after validating
/// the leaf per [`path::validate_name`].
pub fn resolve_parent_and_leaf(vol: &mut Volume, cwd: u32, path: &str) -> Result<(u32, String)> {
	let (parent_path, leaf) = path::split_leaf(path);
	path::validate_name(leaf)?;
	let (parent, file_type) = vol.resolve(cwd, parent_path)?;
	if !file_type.is_directory() {
		return Err(Error::NotADirectory);
	}
	Ok((parent, leaf.to_string()))
}
