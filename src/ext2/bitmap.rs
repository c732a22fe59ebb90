//! The bitmap allocator: finds, flips, and releases inode/block bitmap bits.

use super::bgdt;
use super::bgdt::GroupDescriptor;
use super::block_device::BlockDevice;
use super::error::Error;
use super::error::Result;
use super::inode::ROOT_INODE;
use super::superblock::Superblock;

/// Finds the index of the first clear bit in `bitmap`, scanning from bit 0.
fn find_clear_bit(bitmap: &[u8], limit: u32) -> Option<u32> {
	for b in 0..limit {
		let byte = bitmap[(b / 8) as usize];
		if byte & (1 << (b % 8)) == 0 {
			return Some(b);
		}
	}
	None
}

fn bit_is_set(bitmap: &[u8], b: u32) -> bool {
	bitmap[(b / 8) as usize] & (1 << (b % 8)) != 0
}

fn set_bit(bitmap: &mut [u8], b: u32) {
	bitmap[(b / 8) as usize] |= 1 << (b % 8);
}

fn clear_bit(bitmap: &mut [u8], b: u32) {
	bitmap[(b / 8) as usize] &= !(1 << (b % 8));
}

/// Allocates and returns a free inode number.
pub fn allocate_inode(dev: &mut BlockDevice, sb: &mut Superblock, table: &mut [GroupDescriptor]) -> Result<u32> {
	for group in 0..table.len() as u32 {
		let desc = &table[group as usize];
		if desc.free_inodes == 0 {
			continue;
		}

		let mut bitmap = dev.read_block(desc.inode_bitmap)?;
		let Some(b) = find_clear_bit(&bitmap, sb.inodes_per_group) else {
			log::warn!(
				"group {} claims {} free inodes but its bitmap has none clear; disabling the group",
				group, desc.free_inodes
			);
			table[group as usize].free_inodes = 0;
			continue;
		};

		set_bit(&mut bitmap, b);
		dev.write_block(desc.inode_bitmap, &bitmap)?;

		table[group as usize].free_inodes -= 1;
		bgdt::write_descriptor(dev, group, &table[group as usize])?;

		sb.free_inodes -= 1;
		sb.write(dev)?;

		return Ok(group * sb.inodes_per_group + b + 1);
	}

	Err(Error::NoSpace)
}

/// Allocates and returns a free block number.
pub fn allocate_block(dev: &mut BlockDevice, sb: &mut Superblock, table: &mut [GroupDescriptor]) -> Result<u32> {
	for group in 0..table.len() as u32 {
		let desc = &table[group as usize];
		if desc.free_blocks == 0 {
			continue;
		}

		let mut bitmap = dev.read_block(desc.block_bitmap)?;
		let Some(b) = find_clear_bit(&bitmap, sb.blocks_per_group) else {
			log::warn!(
				"group {} claims {} free blocks but its bitmap has none clear; disabling the group",
				group, desc.free_blocks
			);
			table[group as usize].free_blocks = 0;
			continue;
		};

		set_bit(&mut bitmap, b);
		dev.write_block(desc.block_bitmap, &bitmap)?;

		table[group as usize].free_blocks -= 1;
		bgdt::write_descriptor(dev, group, &table[group as usize])?;

		sb.free_blocks -= 1;
		sb.write(dev)?;

		return Ok(group * sb.blocks_per_group + sb.first_data_block + b);
	}

	Err(Error::NoSpace)
}

/// Frees inode `n`. Inode 0 and the root inode may never be freed.
pub fn deallocate_inode(dev: &mut BlockDevice, sb: &mut Superblock, table: &mut [GroupDescriptor], n: u32) -> Result<()> {
	if n == 0 || n == ROOT_INODE {
		return Err(Error::InvalidImage(format!("refusing to free reserved inode {}", n)));
	}

	let group = (n - 1) / sb.inodes_per_group;
	let b = (n - 1) % sb.inodes_per_group;
	let desc = &table[group as usize];

	let mut bitmap = dev.read_block(desc.inode_bitmap)?;
	if !bit_is_set(&bitmap, b) {
		log::warn!("double-free of inode {}", n);
		return Ok(());
	}
	clear_bit(&mut bitmap, b);
	dev.write_block(desc.inode_bitmap, &bitmap)?;

	table[group as usize].free_inodes += 1;
	bgdt::write_descriptor(dev, group, &table[group as usize])?;

	sb.free_inodes += 1;
	sb.write(dev)
}

/// Frees block `n`. Block 0 may never be freed.
pub fn deallocate_block(dev: &mut BlockDevice, sb: &mut Superblock, table: &mut [GroupDescriptor], n: u32) -> Result<()> {
	if n == 0 {
		return Err(Error::InvalidImage("refusing to free block 0".into()));
	}

	let group = (n - sb.first_data_block) / sb.blocks_per_group;
	let b = (n - sb.first_data_block) % sb.blocks_per_group;
	let desc = &table[group as usize];

	let mut bitmap = dev.read_block(desc.block_bitmap)?;
	if !bit_is_set(&bitmap, b) {
		log::warn!("double-free of block {}", n);
		return Ok(());
	}
	clear_bit(&mut bitmap, b);
	dev.write_block(desc.block_bitmap, &bitmap)?;

	table[group as usize].free_blocks += 1;
	bgdt::write_descriptor(dev, group, &table[group as usize])?;

	sb.free_blocks += 1;
	sb.write(dev)
}
