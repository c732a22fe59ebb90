//! Reading and freeing a file's 15-pointer direct/indirect block tree.

use super::bgdt::GroupDescriptor;
use super::bitmap;
use super::block_device::BLOCK_SIZE;
use super::block_device::BlockDevice;
use super::error::Result;
use super::inode::DIRECT_POINTERS;
use super::inode::DOUBLE_INDIRECT;
use super::inode::Inode;
use super::inode::SINGLE_INDIRECT;
use super::inode::TRIPLE_INDIRECT;
use super::raw::ru32;
use super::superblock::Superblock;

/// Number of block pointers that fit in one indirect block.
fn pointers_per_block(sb: &Superblock) -> usize {
	sb.block_size() as usize / 4
}

/// Maps a zero-based logical block index to a physical block number, or `None` if that
/// logical block is a hole (an unallocated pointer slot). Never allocates.
pub fn resolve(dev: &mut BlockDevice, sb: &Superblock, inode: &Inode, logical: u64) -> Result<Option<u32>> {
	let ppb = pointers_per_block(sb) as u64;

	if logical < DIRECT_POINTERS as u64 {
		let ptr = inode.block[logical as usize];
		return Ok(if ptr == 0 { None } else { Some(ptr) });
	}
	let logical = logical - DIRECT_POINTERS as u64;

	if logical < ppb {
		return resolve_indirect(dev, inode.block[SINGLE_INDIRECT], logical);
	}
	let logical = logical - ppb;

	if logical < ppb * ppb {
		let outer = inode.block[DOUBLE_INDIRECT];
		if outer == 0 {
			return Ok(None);
		}
		let slot = (logical / ppb) as u32;
		let inner = read_pointer(dev, outer, slot)?;
		return resolve_indirect(dev, inner, logical % ppb);
	}
	let logical = logical - ppb * ppb;

	if logical < ppb * ppb * ppb {
		let outer = inode.block[TRIPLE_INDIRECT];
		if outer == 0 {
			return Ok(None);
		}
		let mid_slot = (logical / (ppb * ppb)) as u32;
		let mid = read_pointer(dev, outer, mid_slot)?;
		if mid == 0 {
			return Ok(None);
		}
		let rem = logical % (ppb * ppb);
		let inner_slot = (rem / ppb) as u32;
		let inner = read_pointer(dev, mid, inner_slot)?;
		return resolve_indirect(dev, inner, rem % ppb);
	}

	Ok(None)
}

fn resolve_indirect(dev: &mut BlockDevice, table: u32, slot: u64) -> Result<Option<u32>> {
	if table == 0 {
		return Ok(None);
	}
	let ptr = read_pointer(dev, table, slot as u32)?;
	Ok(if ptr == 0 { None } else { Some(ptr) })
}

fn read_pointer(dev: &mut BlockDevice, table: u32, slot: u32) -> Result<u32> {
	let block = dev.read_block(table)?;
	Ok(ru32(&block, slot as usize * 4))
}

/// Frees every block reachable from `inode`'s direct and indirect pointers, including the
/// indirect blocks themselves, and zeroes the pointers. Does not free the inode itself.
pub fn free_all(
	dev: &mut BlockDevice,
	sb: &mut Superblock,
	table: &mut [GroupDescriptor],
	inode: &mut Inode,
) -> Result<()> {
	for i in 0..DIRECT_POINTERS {
		if inode.block[i] != 0 {
			bitmap::deallocate_block(dev, sb, table, inode.block[i])?;
			inode.block[i] = 0;
		}
	}

	if inode.block[SINGLE_INDIRECT] != 0 {
		free_indirect(dev, sb, table, inode.block[SINGLE_INDIRECT], 0)?;
		inode.block[SINGLE_INDIRECT] = 0;
	}
	if inode.block[DOUBLE_INDIRECT] != 0 {
		free_indirect(dev, sb, table, inode.block[DOUBLE_INDIRECT], 1)?;
		inode.block[DOUBLE_INDIRECT] = 0;
	}
	if inode.block[TRIPLE_INDIRECT] != 0 {
		free_indirect(dev, sb, table, inode.block[TRIPLE_INDIRECT], 2)?;
		inode.block[TRIPLE_INDIRECT] = 0;
	}

	inode.blocks = 0;
	Ok(())
}

/// Recursively frees an indirect block and everything it points to. `depth` 0 means `table`
/// points directly at data blocks; depth 1/2 mean one/two more levels of indirection below it.
fn free_indirect(
	dev: &mut BlockDevice,
	sb: &mut Superblock,
	table: &mut [GroupDescriptor],
	block_num: u32,
	depth: u32,
) -> Result<()> {
	let ppb = pointers_per_block(sb);
	let contents = dev.read_block(block_num)?;
	let mut pointers = Vec::with_capacity(ppb);
	for i in 0..ppb {
		pointers.push(ru32(&contents, i * 4));
	}

	for ptr in pointers {
		if ptr == 0 {
			continue;
		}
		if depth == 0 {
			bitmap::deallocate_block(dev, sb, table, ptr)?;
		} else {
			free_indirect(dev, sb, table, ptr, depth - 1)?;
		}
	}

	bitmap::deallocate_block(dev, sb, table, block_num)
}
