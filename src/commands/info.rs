//! `info`: dumps the cached superblock. Pure read, never fails.

use crate::ext2::volume::Volume;

/// The reportable subset of the superblock's fields.
pub struct Info {
	pub magic: u16,
	pub block_size: u32,
	pub inode_size: usize,
	pub total_inodes: u32,
	pub free_inodes: u32,
	pub total_blocks: u32,
	pub free_blocks: u32,
	pub blocks_per_group: u32,
	pub inodes_per_group: u32,
	pub first_data_block: u32,
	pub group_count: u32,
	pub rev_level: u32,
	pub volume_name: String,
}

pub fn info(vol: &Volume) -> Info {
	let sb = vol.superblock();
	Info {
		magic: sb.magic,
		block_size: sb.block_size(),
		inode_size: sb.inode_size(),
		total_inodes: sb.total_inodes,
		free_inodes: sb.free_inodes,
		total_blocks: sb.total_blocks,
		free_blocks: sb.free_blocks,
		blocks_per_group: sb.blocks_per_group,
		inodes_per_group: sb.inodes_per_group,
		first_data_block: sb.first_data_block,
		group_count: sb.group_count(),
		rev_level: sb.rev_level,
		volume_name: sb.volume_name(),
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::ext2::bgdt;
	use crate::ext2::superblock::Superblock;
	use crate::ext2::testutil::build_minimal_image;

	#[test]
	fn reports_magic_and_block_size() {
		let (mut dev, _tmp) = build_minimal_image();
		let sb = Superblock::read(&mut dev).unwrap();
		let table = bgdt::read_table(&mut dev, &sb).unwrap();
		let vol = Volume::from_parts(dev, sb, table);
		let i = info(&vol);
		assert_eq!(i.magic, 0xef53);
		assert_eq!(i.block_size, 1024);
	}
}
