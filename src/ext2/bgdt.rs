//! The Block Group Descriptor Table (BGDT): one descriptor per block group.

use super::block_device::BLOCK_SIZE;
use super::block_device::BlockDevice;
use super::error::Result;
use super::raw::ru16;
use super::raw::ru32;
use super::raw::wu16;
use super::raw::wu32;
use super::superblock::SUPERBLOCK_OFFSET;
use super::superblock::Superblock;

/// Size in bytes of one on-disk group descriptor.
const DESCRIPTOR_SIZE: u64 = 32;

/// A single block group's metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupDescriptor {
	pub block_bitmap: u32,
	pub inode_bitmap: u32,
	pub inode_table: u32,
	pub free_blocks: u16,
	pub free_inodes: u16,
	pub used_dirs: u16,
	_pad: u16,
	_reserved: [u32; 3],
}

impl GroupDescriptor {
	fn decode(buf: &[u8]) -> Self {
		Self {
			block_bitmap: ru32(buf, 0),
			inode_bitmap: ru32(buf, 4),
			inode_table: ru32(buf, 8),
			free_blocks: ru16(buf, 12),
			free_inodes: ru16(buf, 14),
			used_dirs: ru16(buf, 16),
			_pad: ru16(buf, 18),
			_reserved: [ru32(buf, 20), ru32(buf, 24), ru32(buf, 28)],
		}
	}

	fn encode(&self, buf: &mut [u8]) {
		wu32(buf, 0, self.block_bitmap);
		wu32(buf, 4, self.inode_bitmap);
		wu32(buf, 8, self.inode_table);
		wu16(buf, 12, self.free_blocks);
		wu16(buf, 14, self.free_inodes);
		wu16(buf, 16, self.used_dirs);
		wu16(buf, 18, self._pad);
		wu32(buf, 20, self._reserved[0]);
		wu32(buf, 24, self._reserved[1]);
		wu32(buf, 28, self._reserved[2]);
	}
}

/// Byte offset of the block immediately following the superblock, where the BGDT begins.
fn bgdt_offset() -> u64 {
	(SUPERBLOCK_OFFSET / BLOCK_SIZE as u64 + 1) * BLOCK_SIZE as u64
}

/// Byte offset of the `i`th group descriptor.
fn descriptor_offset(i: u32) -> u64 {
	bgdt_offset() + i as u64 * DESCRIPTOR_SIZE
}

/// Reads the whole group descriptor table.
pub fn read_table(dev: &mut BlockDevice, sb: &Superblock) -> Result<Vec<GroupDescriptor>> {
	let count = sb.group_count();
	let mut table = Vec::with_capacity(count as usize);

	for i in 0..count {
		let mut buf = [0u8; DESCRIPTOR_SIZE as usize];
		dev.read_at(descriptor_offset(i), &mut buf)?;
		table.push(GroupDescriptor::decode(&buf));
	}

	Ok(table)
}

/// Writes back the `i`th group descriptor.
pub fn write_descriptor(dev: &mut BlockDevice, i: u32, desc: &GroupDescriptor) -> Result<()> {
	let mut buf = [0u8; DESCRIPTOR_SIZE as usize];
	desc.encode(&mut buf);
	dev.write_at(descriptor_offset(i), &buf)
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::ext2::testutil::build_minimal_image;

	#[test]
	fn reads_one_group_table() {
		let (mut dev, _) = build_minimal_image();
		let sb = Superblock::read(&mut dev).unwrap();
		let table = read_table(&mut dev, &sb).unwrap();
		assert_eq!(table.len(), sb.group_count() as usize);
		assert!(table[0].inode_table > 0);
	}

	#[test]
	fn write_then_read_is_identity() {
		let (mut dev, _) = build_minimal_image();
		let sb = Superblock::read(&mut dev).unwrap();
		let mut table = read_table(&mut dev, &sb).unwrap();
		table[0].free_blocks -= 3;
		write_descriptor(&mut dev, 0, &table[0]).unwrap();

		let table2 = read_table(&mut dev, &sb).unwrap();
		assert_eq!(table2[0].free_blocks, table[0].free_blocks);
	}
}
