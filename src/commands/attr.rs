//! `attr path`: dumps an inode's metadata.

use crate::ext2::error::Result;
use crate::ext2::inode::FileType;
use crate::ext2::volume::Volume;

pub struct Attr {
	pub file_type: FileType,
	pub permissions: u16,
	pub uid: u16,
	pub gid: u16,
	pub size: u64,
	pub links_count: u16,
	pub blocks: u32,
	pub atime: u32,
	pub ctime: u32,
	pub mtime: u32,
	pub dtime: u32,
	pub flags: u32,
	pub block: [u32; 15],
}

/// Low 12 bits of `mode`: the Unix permission bits.
const PERMISSION_MASK: u16 = 0o7777;

pub fn attr(vol: &mut Volume, cwd: u32, path: &str) -> Result<Attr> {
	let (n, _) = vol.resolve(cwd, path)?;
	let node = vol.read_inode(n)?;
	Ok(Attr {
		file_type: node.file_type(),
		permissions: node.mode & PERMISSION_MASK,
		uid: node.uid,
		gid: node.gid,
		size: node.size(),
		links_count: node.links_count,
		blocks: node.blocks,
		atime: node.atime,
		ctime: node.ctime,
		mtime: node.mtime,
		dtime: node.dtime,
		flags: node.flags,
		block: node.block,
	})
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::ext2::bgdt;
	use crate::ext2::inode::ROOT_INODE;
	use crate::ext2::superblock::Superblock;
	use crate::ext2::testutil::build_minimal_image;

	#[test]
	fn reports_root_as_a_directory() {
		let (mut dev, _tmp) = build_minimal_image();
		let sb = Superblock::read(&mut dev).unwrap();
		let table = bgdt::read_table(&mut dev, &sb).unwrap();
		let mut vol = Volume::from_parts(dev, sb, table);

		let a = attr(&mut vol, ROOT_INODE, ".").unwrap();
		assert_eq!(a.file_type, FileType::Directory);
		assert_eq!(a.permissions, 0o755);
		assert_eq!(a.links_count, 2);
	}
}
