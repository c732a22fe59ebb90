//! Inode table I/O: the fixed-layout record describing one file or directory.

use super::bgdt::GroupDescriptor;
use super::block_device::BlockDevice;
use super::error::Error;
use super::error::Result;
use super::raw::ru16;
use super::raw::ru32;
use super::raw::wu16;
use super::raw::wu32;
use super::superblock::Superblock;

/// The root directory's inode number.
pub const ROOT_INODE: u32 = 2;
/// Number of direct block pointers in `i_block`.
pub const DIRECT_POINTERS: usize = 12;
/// Index of the single-indirect pointer in `i_block`.
pub const SINGLE_INDIRECT: usize = 12;
/// Index of the double-indirect pointer in `i_block`.
pub const DOUBLE_INDIRECT: usize = 13;
/// Index of the triple-indirect pointer in `i_block`.
pub const TRIPLE_INDIRECT: usize = 14;

/// Size of the fixed, engine-understood portion of an on-disk inode.
const INODE_CORE_SIZE: usize = 128;

const S_IFMT: u16 = 0xf000;
const S_IFREG: u16 = 0x8000;
const S_IFDIR: u16 = 0x4000;
const S_IFCHR: u16 = 0x2000;
const S_IFBLK: u16 = 0x6000;
const S_IFIFO: u16 = 0x1000;
const S_IFSOCK: u16 = 0xc000;
const S_IFLNK: u16 = 0xa000;

/// The directory-entry file-type tag / normalized inode type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
	Unknown,
	Regular,
	Directory,
	CharDevice,
	BlockDevice,
	Fifo,
	Socket,
	Symlink,
}

impl FileType {
	/// Decodes the directory-entry file-type byte.
	pub fn from_dirent_tag(tag: u8) -> Self {
		match tag {
			1 => Self::Regular,
			2 => Self::Directory,
			3 => Self::CharDevice,
			4 => Self::BlockDevice,
			5 => Self::Fifo,
			6 => Self::Socket,
			7 => Self::Symlink,
			_ => Self::Unknown,
		}
	}

	/// Encodes as a directory-entry file-type byte.
	pub fn to_dirent_tag(self) -> u8 {
		match self {
			Self::Unknown => 0,
			Self::Regular => 1,
			Self::Directory => 2,
			Self::CharDevice => 3,
			Self::BlockDevice => 4,
			Self::Fifo => 5,
			Self::Socket => 6,
			Self::Symlink => 7,
		}
	}

	/// Derives the file type from an inode's `mode` field.
	pub fn from_mode(mode: u16) -> Self {
		match mode & S_IFMT {
			S_IFREG => Self::Regular,
			S_IFDIR => Self::Directory,
			S_IFCHR => Self::CharDevice,
			S_IFBLK => Self::BlockDevice,
			S_IFIFO => Self::Fifo,
			S_IFSOCK => Self::Socket,
			S_IFLNK => Self::Symlink,
			_ => Self::Unknown,
		}
	}

	pub fn is_directory(self) -> bool {
		self == Self::Directory
	}

	pub fn is_regular(self) -> bool {
		self == Self::Regular
	}

	/// The trailing marker `ls` appends to directory names in a listing.
	pub fn ls_suffix(self) -> &'static str {
		if self.is_directory() {
			"/"
		} else {
			""
		}
	}
}

/// An in-memory decoded inode.
#[derive(Debug, Clone)]
pub struct Inode {
	pub mode: u16,
	pub uid: u16,
	pub size_low: u32,
	pub atime: u32,
	pub ctime: u32,
	pub mtime: u32,
	pub dtime: u32,
	pub gid: u16,
	pub links_count: u16,
	/// Number of allocated 512-byte sectors (not blocks).
	pub blocks: u32,
	pub flags: u32,
	pub os_specific_0: u32,
	pub block: [u32; 15],
	pub generation: u32,
	pub file_acl: u32,
	pub size_high: u32,
	pub fragment_addr: u32,
}

impl Default for Inode {
	fn default() -> Self {
		Self {
			mode: 0,
			uid: 0,
			size_low: 0,
			atime: 0,
			ctime: 0,
			mtime: 0,
			dtime: 0,
			gid: 0,
			links_count: 0,
			blocks: 0,
			flags: 0,
			os_specific_0: 0,
			block: [0; 15],
			generation: 0,
			file_acl: 0,
			size_high: 0,
			fragment_addr: 0,
		}
	}
}

impl Inode {
	/// The file's type, derived from `mode`.
	pub fn file_type(&self) -> FileType {
		FileType::from_mode(self.mode)
	}

	/// The file's size in bytes. This engine never produces files large enough to need
	/// `size_high`, but it is honored on read for images written by other tools.
	pub fn size(&self) -> u64 {
		(self.size_high as u64) << 32 | self.size_low as u64
	}

	pub fn set_size(&mut self, size: u64) {
		self.size_low = size as u32;
		self.size_high = (size >> 32) as u32;
	}

	/// A freshly allocated regular file: the given permission bits, one link, all timestamps
	/// set to `now`, empty.
	pub fn new_regular(now: u32, permissions: u16) -> Self {
		Self {
			mode: S_IFREG | (permissions & 0o7777),
			links_count: 1,
			atime: now,
			ctime: now,
			mtime: now,
			..Default::default()
		}
	}

	/// A freshly allocated, still-blockless directory: the given permission bits, two links
	/// (the parent's entry and its own `.`), all timestamps set to `now`.
	pub fn new_directory(now: u32, permissions: u16) -> Self {
		Self {
			mode: S_IFDIR | (permissions & 0o7777),
			links_count: 2,
			atime: now,
			ctime: now,
			mtime: now,
			..Default::default()
		}
	}

	fn decode(buf: &[u8]) -> Self {
		let mut block = [0u32; 15];
		for (i, slot) in block.iter_mut().enumerate() {
			*slot = ru32(buf, 40 + i * 4);
		}

		Self {
			mode: ru16(buf, 0),
			uid: ru16(buf, 2),
			size_low: ru32(buf, 4),
			atime: ru32(buf, 8),
			ctime: ru32(buf, 12),
			mtime: ru32(buf, 16),
			dtime: ru32(buf, 20),
			gid: ru16(buf, 24),
			links_count: ru16(buf, 26),
			blocks: ru32(buf, 28),
			flags: ru32(buf, 32),
			os_specific_0: ru32(buf, 36),
			block,
			generation: ru32(buf, 100),
			file_acl: ru32(buf, 104),
			size_high: ru32(buf, 108),
			fragment_addr: ru32(buf, 112),
		}
	}

	fn encode(&self, buf: &mut [u8]) {
		wu16(buf, 0, self.mode);
		wu16(buf, 2, self.uid);
		wu32(buf, 4, self.size_low);
		wu32(buf, 8, self.atime);
		wu32(buf, 12, self.ctime);
		wu32(buf, 16, self.mtime);
		wu32(buf, 20, self.dtime);
		wu16(buf, 24, self.gid);
		wu16(buf, 26, self.links_count);
		wu32(buf, 28, self.blocks);
		wu32(buf, 32, self.flags);
		wu32(buf, 36, self.os_specific_0);
		for (i, &ptr) in self.block.iter().enumerate() {
			wu32(buf, 40 + i * 4, ptr);
		}
		wu32(buf, 100, self.generation);
		wu32(buf, 104, self.file_acl);
		wu32(buf, 108, self.size_high);
		wu32(buf, 112, self.fragment_addr);
	}
}

/// Computes the `(group, slot-within-group)` pair for inode number `n`.
fn locate(n: u32, sb: &Superblock) -> Result<(u32, u32)> {
	if n == 0 {
		return Err(Error::InvalidImage("inode 0 does not exist".into()));
	}
	let group = (n - 1) / sb.inodes_per_group;
	let slot = (n - 1) % sb.inodes_per_group;
	if group >= sb.group_count() {
		return Err(Error::InvalidImage(format!("inode {} is out of range", n)));
	}
	Ok((group, slot))
}

/// Byte offset of inode `n`'s on-disk slot.
fn slot_offset(n: u32, sb: &Superblock, table: &[GroupDescriptor]) -> Result<u64> {
	let (group, slot) = locate(n, sb)?;
	let desc = &table[group as usize];
	let inode_size = sb.inode_size() as u64;
	Ok(desc.inode_table as u64 * sb.block_size() as u64 + slot as u64 * inode_size)
}

/// Reads inode `n`.
pub fn read_inode(
	dev: &mut BlockDevice,
	sb: &Superblock,
	table: &[GroupDescriptor],
	n: u32,
) -> Result<Inode> {
	let offset = slot_offset(n, sb, table)?;
	let mut buf = [0u8; INODE_CORE_SIZE];
	dev.read_at(offset, &mut buf)?;
	Ok(Inode::decode(&buf))
}

/// Writes inode `n`. Reads the full on-disk slot first so that any bytes beyond the 128-byte
/// core this engine models (revision-1 images may declare a larger inode size) are preserved.
pub fn write_inode(
	dev: &mut BlockDevice,
	sb: &Superblock,
	table: &[GroupDescriptor],
	n: u32,
	inode: &Inode,
) -> Result<()> {
	let offset = slot_offset(n, sb, table)?;
	let slot_size = sb.inode_size();

	let mut slot = vec![0u8; slot_size];
	dev.read_at(offset, &mut slot)?;
	inode.encode(&mut slot[..INODE_CORE_SIZE]);
	dev.write_at(offset, &slot)
}
