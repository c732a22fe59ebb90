//! `rename src dst`: renames a directory entry in place, without moving it between directories.

use crate::commands::common::load_dir;
use crate::commands::common::store_dir;
use crate::ext2::directory;
use crate::ext2::error::Error;
use crate::ext2::error::Result;
use crate::ext2::path;
use crate::ext2::volume::Volume;
use crate::ext2::volume::now;

pub fn rename(vol: &mut Volume, cwd: u32, src: &str, dst: &str) -> Result<()> {
	let (src_parent_path, src_leaf) = path::split_leaf(src);
	let (dst_parent_path, dst_leaf) = path::split_leaf(dst);
	path::reject_dot_entries(src_leaf)?;
	path::reject_dot_entries(dst_leaf)?;
	path::validate_name(dst_leaf)?;

	let (src_parent, src_parent_type) = vol.resolve(cwd, src_parent_path)?;
	let (dst_parent, dst_parent_type) = vol.resolve(cwd, dst_parent_path)?;
	if !src_parent_type.is_directory() || !dst_parent_type.is_directory() {
		return Err(Error::NotADirectory);
	}
	if src_parent != dst_parent {
		return Err(Error::CrossDirectory);
	}

	let (mut parent, mut buf, mut size) = load_dir(vol, src_parent)?;
	if directory::lookup(&buf, size, src_leaf).is_none() {
		return Err(Error::NotFound);
	}
	if src_leaf != dst_leaf && directory::contains(&buf, size, dst_leaf) {
		return Err(Error::AlreadyExists);
	}

	directory::rename_in_place(&mut buf, size, src_leaf, dst_leaf)?;
	parent.mtime = now();
	parent.ctime = now();
	store_dir(vol, src_parent, &mut parent, &buf, size)
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::commands::touch::touch;
	use crate::ext2::bgdt;
	use crate::ext2::inode::FileType;
	use crate::ext2::inode::ROOT_INODE;
	use crate::ext2::superblock::Superblock;
	use crate::ext2::testutil::build_minimal_image;

	#[test]
	fn renames_a_file_in_place() {
		let (mut dev, _tmp) = build_minimal_image();
		let sb = Superblock::read(&mut dev).unwrap();
		let table = bgdt::read_table(&mut dev, &sb).unwrap();
		let mut vol = Volume::from_parts(dev, sb, table);

		touch(&mut vol, ROOT_INODE, "/a.txt").unwrap();
		rename(&mut vol, ROOT_INODE, "/a.txt", "/b.txt").unwrap();

		let (_, buf, size) = load_dir(&mut vol, ROOT_INODE).unwrap();
		assert!(directory::lookup(&buf, size, "a.txt").is_none());
		assert_eq!(directory::lookup(&buf, size, "b.txt").map(|(_, t)| t), Some(FileType::Regular));
	}

	#[test]
	fn refuses_overwriting_an_existing_destination() {
		let (mut dev, _tmp) = build_minimal_image();
		let sb = Superblock::read(&mut dev).unwrap();
		let table = bgdt::read_table(&mut dev, &sb).unwrap();
		let mut vol = Volume::from_parts(dev, sb, table);

		touch(&mut vol, ROOT_INODE, "/a.txt").unwrap();
		touch(&mut vol, ROOT_INODE, "/b.txt").unwrap();
		assert!(matches!(rename(&mut vol, ROOT_INODE, "/a.txt", "/b.txt"), Err(Error::AlreadyExists)));
	}

	#[test]
	fn refuses_cross_directory_rename() {
		let (mut dev, _tmp) = build_minimal_image();
		let sb = Superblock::read(&mut dev).unwrap();
		let table = bgdt::read_table(&mut dev, &sb).unwrap();
		let mut vol = Volume::from_parts(dev, sb, table);

		crate::commands::mkdir::mkdir(&mut vol, ROOT_INODE, "/d").unwrap();
		touch(&mut vol, ROOT_INODE, "/a.txt").unwrap();
		assert!(matches!(rename(&mut vol, ROOT_INODE, "/a.txt", "/d/a.txt"), Err(Error::CrossDirectory)));
	}
}
