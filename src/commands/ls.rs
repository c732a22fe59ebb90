//! `ls [path]`: lists a directory's entries, or names a single file.

use crate::ext2::directory;
use crate::ext2::directory::DirRecord;
use crate::ext2::error::Result;
use crate::ext2::path;
use crate::ext2::volume::Volume;

/// The result of an `ls`: either a single file's name, or a directory's full entry list.
pub enum Listing {
	File(String),
	Dir(Vec<DirRecord>),
}

pub fn ls(vol: &mut Volume, cwd: u32, path: Option<&str>) -> Result<Listing> {
	let path = path.unwrap_or(".");
	let (n, file_type) = vol.resolve(cwd, path)?;

	if file_type.is_directory() {
		let node = vol.read_inode(n)?;
		let buf = vol.read_block(node.block[0])?;
		let size = (node.size() as usize).min(crate::ext2::block_device::BLOCK_SIZE as usize);
		Ok(Listing::Dir(directory::list(&buf, size)))
	} else {
		let (_, leaf) = path::split_leaf(path);
		let name = if leaf.is_empty() {
			path.to_string()
		} else {
			leaf.to_string()
		};
		Ok(Listing::File(name))
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::ext2::bgdt;
	use crate::ext2::inode::ROOT_INODE;
	use crate::ext2::superblock::Superblock;
	use crate::ext2::testutil::build_minimal_image;

	#[test]
	fn lists_root_dot_and_dotdot() {
		let (mut dev, _tmp) = build_minimal_image();
		let sb = Superblock::read(&mut dev).unwrap();
		let table = bgdt::read_table(&mut dev, &sb).unwrap();
		let mut vol = Volume::from_parts(dev, sb, table);

		let Listing::Dir(entries) = ls(&mut vol, ROOT_INODE, None).unwrap() else {
			panic!("expected a directory listing");
		};
		let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
		assert!(names.contains(&"."));
		assert!(names.contains(&".."));
	}
}
