//! `Volume`: the owning handle over an open ext2 image.
//!
//! This replaces the source's global file descriptor, superblock cache and BGDT with a
//! single object threaded explicitly through every command handler — there is no process-wide
//! mutable state anywhere in this engine.

use std::fs::OpenOptions;
use std::path::Path;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use super::bgdt;
use super::bgdt::GroupDescriptor;
use super::bitmap;
use super::block_device::BLOCK_SIZE;
use super::block_device::BlockDevice;
use super::blocktree;
use super::error::Result;
use super::inode;
use super::inode::Inode;
use super::superblock::Superblock;

/// An open ext2 image: the block device plus the in-memory superblock and group descriptor
/// caches, kept write-through consistent with the backing file.
pub struct Volume {
	dev: BlockDevice,
	sb: Superblock,
	table: Vec<GroupDescriptor>,
}

impl Volume {
	/// Opens `path` read/write and validates its superblock.
	pub fn open(path: &Path) -> Result<Self> {
		let file = OpenOptions::new().read(true).write(true).open(path)?;
		let mut dev = BlockDevice::new(file);
		let sb = Superblock::read(&mut dev)?;
		let table = bgdt::read_table(&mut dev, &sb)?;
		Ok(Self {
			dev,
			sb,
			table,
		})
	}

	/// Builds a `Volume` from already-opened parts. Used by command-handler tests that drive
	/// the synthetic images from [`super::testutil`] rather than a real file path.
	#[cfg(test)]
	pub fn from_parts(dev: BlockDevice, sb: Superblock, table: Vec<GroupDescriptor>) -> Self {
		Self {
			dev,
			sb,
			table,
		}
	}

	pub fn superblock(&self) -> &Superblock {
		&self.sb
	}

	pub fn group_descriptors(&self) -> &[GroupDescriptor] {
		&self.table
	}

	/// The group a global inode number belongs to.
	pub fn inode_group(&self, n: u32) -> u32 {
		(n - 1) / self.sb.inodes_per_group
	}

	/// The group a global block number belongs to.
	pub fn block_group(&self, n: u32) -> u32 {
		(n - self.sb.first_data_block) / self.sb.blocks_per_group
	}

	pub fn read_block(&mut self, n: u32) -> Result<[u8; BLOCK_SIZE as usize]> {
		self.dev.read_block(n)
	}

	pub fn write_block(&mut self, n: u32, buf: &[u8; BLOCK_SIZE as usize]) -> Result<()> {
		self.dev.write_block(n, buf)
	}

	/// Resolves `path` starting from `base` (see [`super::path::resolve`]).
	pub fn resolve(&mut self, base: u32, path: &str) -> Result<(u32, super::inode::FileType)> {
		super::path::resolve(&mut self.dev, &self.sb, &self.table, base, path)
	}

	pub fn read_inode(&mut self, n: u32) -> Result<Inode> {
		inode::read_inode(&mut self.dev, &self.sb, &self.table, n)
	}

	pub fn write_inode(&mut self, n: u32, node: &Inode) -> Result<()> {
		inode::write_inode(&mut self.dev, &self.sb, &self.table, n, node)
	}

	pub fn allocate_inode(&mut self) -> Result<u32> {
		bitmap::allocate_inode(&mut self.dev, &mut self.sb, &mut self.table)
	}

	pub fn allocate_block(&mut self) -> Result<u32> {
		bitmap::allocate_block(&mut self.dev, &mut self.sb, &mut self.table)
	}

	pub fn deallocate_inode(&mut self, n: u32) -> Result<()> {
		bitmap::deallocate_inode(&mut self.dev, &mut self.sb, &mut self.table, n)
	}

	pub fn deallocate_block(&mut self, n: u32) -> Result<()> {
		bitmap::deallocate_block(&mut self.dev, &mut self.sb, &mut self.table, n)
	}

	/// Frees every block in `node`'s direct/indirect tree and zeroes its pointers.
	pub fn free_block_tree(&mut self, node: &mut Inode) -> Result<()> {
		blocktree::free_all(&mut self.dev, &mut self.sb, &mut self.table, node)
	}

	/// Resolves logical block `logical` of `node` to a physical block number, or `None` for a
	/// hole. Never allocates.
	pub fn resolve_block(&mut self, node: &Inode, logical: u64) -> Result<Option<u32>> {
		blocktree::resolve(&mut self.dev, &self.sb, node, logical)
	}

	/// Reads the full byte stream of a file's contents, per `node.size()`.
	pub fn read_file(&mut self, node: &Inode) -> Result<Vec<u8>> {
		let size = node.size() as usize;
		let block_size = self.sb.block_size() as usize;
		let mut out = Vec::with_capacity(size);
		let mut logical = 0u64;
		while out.len() < size {
			let remaining = size - out.len();
			let take = remaining.min(block_size);
			match self.resolve_block(node, logical)? {
				Some(phys) => {
					let block = self.dev.read_block(phys)?;
					out.extend_from_slice(&block[..take]);
				}
				None => out.resize(out.len() + take, 0),
			}
			logical += 1;
		}
		Ok(out)
	}

	/// Increments the used-directory-inode counter of `group` and writes it back.
	pub fn inc_used_dirs(&mut self, group: u32) -> Result<()> {
		self.table[group as usize].used_dirs += 1;
		bgdt::write_descriptor(&mut self.dev, group, &self.table[group as usize])
	}

	/// Decrements the used-directory-inode counter of `group` and writes it back.
	pub fn dec_used_dirs(&mut self, group: u32) -> Result<()> {
		self.table[group as usize].used_dirs = self.table[group as usize].used_dirs.saturating_sub(1);
		bgdt::write_descriptor(&mut self.dev, group, &self.table[group as usize])
	}
}

/// The current time as a 32-bit Unix timestamp, for inode `atime`/`ctime`/`mtime`/`dtime`.
pub fn now() -> u32 {
	SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as u32).unwrap_or(0)
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::ext2::inode::ROOT_INODE;
	use crate::ext2::testutil::build_minimal_image;

	/// `Volume::open` can't use the tempfile-backed `BlockDevice` testutil builds directly
	/// (it returns an already-open device), so these tests exercise the wrapper methods
	/// against that device instead of re-opening a path.
	fn open_minimal() -> (BlockDevice, tempfile::NamedTempFile) {
		build_minimal_image()
	}

	#[test]
	fn read_file_reads_exact_size_with_holes_as_zero() {
		let (mut dev, _tmp) = open_minimal();
		let sb = Superblock::read(&mut dev).unwrap();
		let table = bgdt::read_table(&mut dev, &sb).unwrap();
		let mut vol = Volume {
			dev,
			sb,
			table,
		};
		let root = vol.read_inode(ROOT_INODE).unwrap();
		let data = vol.read_file(&root).unwrap();
		assert_eq!(data.len(), root.size() as usize);
	}

	#[test]
	fn group_of_inode_and_block_agree_with_bitmap_allocator() {
		let (mut dev, _tmp) = open_minimal();
		let sb = Superblock::read(&mut dev).unwrap();
		let table = bgdt::read_table(&mut dev, &sb).unwrap();
		let mut vol = Volume {
			dev,
			sb,
			table,
		};
		let n = vol.allocate_inode().unwrap();
		assert_eq!(vol.inode_group(n), 0);
		let b = vol.allocate_block().unwrap();
		assert_eq!(vol.block_group(b), 0);
	}
}
