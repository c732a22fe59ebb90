//! `mkdir path`: creates a directory, pre-populated with `.` and `..`.

use crate::commands::common::load_dir;
use crate::commands::common::resolve_parent_and_leaf;
use crate::commands::common::store_dir;
use crate::ext2::block_device::BLOCK_SIZE;
use crate::ext2::directory;
use crate::ext2::error::Error;
use crate::ext2::error::Result;
use crate::ext2::inode::FileType;
use crate::ext2::inode::Inode;
use crate::ext2::volume::Volume;
use crate::ext2::volume::now;

/// The default permission bits `mkdir` gives a new directory.
const DEFAULT_DIR_MODE: u16 = 0o755;

pub fn mkdir(vol: &mut Volume, cwd: u32, path: &str) -> Result<()> {
	let (parent_n, leaf) = resolve_parent_and_leaf(vol, cwd, path)?;
	let (mut parent, mut parent_buf, mut parent_size) = load_dir(vol, parent_n)?;

	if directory::contains(&parent_buf, parent_size, &leaf) {
		return Err(Error::AlreadyExists);
	}

	let new_n = vol.allocate_inode()?;
	let data_block = match vol.allocate_block() {
		Ok(b) => b,
		Err(e) => {
			vol.deallocate_inode(new_n)?;
			return Err(e);
		}
	};

	let mut new_inode = Inode::new_directory(now(), DEFAULT_DIR_MODE);
	new_inode.block[0] = data_block;
	new_inode.set_size(BLOCK_SIZE as u64);
	new_inode.blocks = 2; // one 1024-byte block, counted in 512-byte units

	let mut dir_buf = [0u8; BLOCK_SIZE as usize];
	let mut dir_size = 0usize;
	directory::insert(&mut dir_buf, &mut dir_size, "..", parent_n, FileType::Directory)
		.and_then(|()| directory::insert(&mut dir_buf, &mut dir_size, ".", new_n, FileType::Directory))
		.expect("two entries always fit a freshly zeroed block");

	vol.write_inode(new_n, &new_inode)?;
	vol.write_block(data_block, &dir_buf)?;

	if let Err(e) = directory::insert(&mut parent_buf, &mut parent_size, &leaf, new_n, FileType::Directory) {
		vol.deallocate_block(data_block)?;
		vol.deallocate_inode(new_n)?;
		return Err(e);
	}

	parent.links_count += 1; // the new ".." entry
	parent.mtime = now();
	parent.ctime = now();
	store_dir(vol, parent_n, &mut parent, &parent_buf, parent_size)?;

	vol.inc_used_dirs(vol.inode_group(new_n))
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::ext2::bgdt;
	use crate::ext2::inode::ROOT_INODE;
	use crate::ext2::superblock::Superblock;
	use crate::ext2::testutil::build_minimal_image;

	#[test]
	fn creates_a_directory_with_dot_and_dotdot() {
		let (mut dev, _tmp) = build_minimal_image();
		let sb = Superblock::read(&mut dev).unwrap();
		let table = bgdt::read_table(&mut dev, &sb).unwrap();
		let mut vol = Volume::from_parts(dev, sb, table);

		let root_links_before = vol.read_inode(ROOT_INODE).unwrap().links_count;
		mkdir(&mut vol, ROOT_INODE, "/d").unwrap();

		let (_, buf, size) = load_dir(&mut vol, ROOT_INODE).unwrap();
		let (n, ft) = directory::lookup(&buf, size, "d").unwrap();
		assert_eq!(ft, FileType::Directory);

		let d = vol.read_inode(n).unwrap();
		assert_eq!(d.links_count, 2);
		assert_eq!(d.size(), BLOCK_SIZE as u64);

		let (dot_buf, dot_size) = (vol.read_block(d.block[0]).unwrap(), d.size() as usize);
		assert_eq!(directory::lookup(&dot_buf, dot_size, "."), Some((n, FileType::Directory)));
		assert_eq!(directory::lookup(&dot_buf, dot_size, ".."), Some((ROOT_INODE, FileType::Directory)));

		let root_after = vol.read_inode(ROOT_INODE).unwrap();
		assert_eq!(root_after.links_count, root_links_before + 1);
	}
}
