//! Synthetic single-group ext2 images for unit tests.

use std::fs::OpenOptions;

use tempfile::NamedTempFile;

use super::block_device::BLOCK_SIZE;
use super::block_device::BlockDevice;
use super::raw::wu16;
use super::raw::wu32;
use super::superblock::EXT2_MAGIC;
use super::superblock::SUPERBLOCK_OFFSET;

const BLOCKS_PER_GROUP: u32 = 64;
const INODES_PER_GROUP: u32 = 32;
const BLOCK_BITMAP_BLOCK: u32 = 3;
const INODE_BITMAP_BLOCK: u32 = 4;
const INODE_TABLE_BLOCK: u32 = 5;
const INODE_TABLE_BLOCKS: u32 = 4;
const ROOT_DATA_BLOCK: u32 = 9;

fn dir_entry(buf: &mut [u8], off: usize, inode: u32, rec_len: u16, file_type: u8, name: &str) {
	wu32(buf, off, inode);
	wu16(buf, off + 4, rec_len);
	buf[off + 6] = name.len() as u8;
	buf[off + 7] = file_type;
	buf[off + 8..off + 8 + name.len()].copy_from_slice(name.as_bytes());
}

/// Builds a minimal, valid single-group ext2 image with only the root directory present.
/// Returns the opened device plus the backing temp file (kept alive for the image's lifetime).
pub fn build_minimal_image() -> (BlockDevice, NamedTempFile) {
	let tmp = NamedTempFile::new().expect("create temp file");
	let total_blocks = BLOCKS_PER_GROUP;

	let file = OpenOptions::new()
		.read(true)
		.write(true)
		.open(tmp.path())
		.expect("reopen temp file read-write");
	file.set_len(total_blocks as u64 * BLOCK_SIZE as u64).expect("set image length");
	let mut dev = BlockDevice::new(file);

	// Superblock (block 1).
	let mut sb = [0u8; BLOCK_SIZE as usize];
	wu32(&mut sb, 0, INODES_PER_GROUP); // total_inodes
	wu32(&mut sb, 4, total_blocks); // total_blocks
	wu32(&mut sb, 8, 0); // reserved_blocks
	wu32(&mut sb, 12, total_blocks - 9); // free_blocks
	wu32(&mut sb, 16, INODES_PER_GROUP - 2); // free_inodes
	wu32(&mut sb, 20, 1); // first_data_block
	wu32(&mut sb, 24, 0); // block_size_log
	wu32(&mut sb, 28, 0); // fragment_size_log
	wu32(&mut sb, 32, BLOCKS_PER_GROUP); // blocks_per_group
	wu32(&mut sb, 36, BLOCKS_PER_GROUP); // fragments_per_group
	wu32(&mut sb, 40, INODES_PER_GROUP); // inodes_per_group
	wu16(&mut sb, 56, EXT2_MAGIC);
	wu16(&mut sb, 58, 1); // fs_state: clean
	wu32(&mut sb, 76, 0); // rev_level: 0, engine falls back to 128-byte inodes
	dev.write_at(SUPERBLOCK_OFFSET, &sb).expect("write superblock");

	// Group descriptor table (block 2): one descriptor.
	let mut bgdt = [0u8; BLOCK_SIZE as usize];
	wu32(&mut bgdt, 0, BLOCK_BITMAP_BLOCK);
	wu32(&mut bgdt, 4, INODE_BITMAP_BLOCK);
	wu32(&mut bgdt, 8, INODE_TABLE_BLOCK);
	wu16(&mut bgdt, 12, (total_blocks - 9) as u16); // free_blocks
	wu16(&mut bgdt, 14, (INODES_PER_GROUP - 2) as u16); // free_inodes
	wu16(&mut bgdt, 16, 1); // used_dirs
	dev.write_block(2, &bgdt).expect("write bgdt");

	// Block bitmap (block 3): blocks 1..=9 (superblock, bgdt, block bitmap, inode bitmap,
	// the 4 inode table blocks, and the root directory's data block) are in use.
	let mut block_bitmap = [0u8; BLOCK_SIZE as usize];
	for b in 0u32..9 {
		block_bitmap[(b / 8) as usize] |= 1 << (b % 8);
	}
	dev.write_block(BLOCK_BITMAP_BLOCK, &block_bitmap).expect("write block bitmap");

	// Inode bitmap (block 4): inodes 1 (reserved) and 2 (root) are in use.
	let mut inode_bitmap = [0u8; BLOCK_SIZE as usize];
	inode_bitmap[0] = 0b11;
	dev.write_block(INODE_BITMAP_BLOCK, &inode_bitmap).expect("write inode bitmap");

	// Inode table (blocks 5..=8): only the root inode's slot (inode 2, the second 128-byte
	// slot) is populated.
	for b in 0..INODE_TABLE_BLOCKS {
		dev.write_block(INODE_TABLE_BLOCK + b, &[0u8; BLOCK_SIZE as usize]).expect("zero inode table block");
	}
	let mut root_slot = [0u8; 128];
	wu16(&mut root_slot, 0, 0x41ed); // mode: directory, 0755
	wu16(&mut root_slot, 26, 2); // links_count
	wu32(&mut root_slot, 4, BLOCK_SIZE); // size_low: one data block
	wu32(&mut root_slot, 28, 2); // blocks: 512-byte sectors in one 1024-byte block
	wu32(&mut root_slot, 40, ROOT_DATA_BLOCK); // i_block[0]
	let root_offset = SUPERBLOCK_OFFSET
		+ (INODE_TABLE_BLOCK - 1) as u64 * BLOCK_SIZE as u64
		+ 128;
	dev.write_at(root_offset, &root_slot).expect("write root inode");

	// Root directory data block: "." and ".." only.
	let mut dirblock = [0u8; BLOCK_SIZE as usize];
	dir_entry(&mut dirblock, 0, 2, 12, 2, ".");
	dir_entry(&mut dirblock, 12, 2, (BLOCK_SIZE - 12) as u16, 2, "..");
	dev.write_block(ROOT_DATA_BLOCK, &dirblock).expect("write root directory block");

	(dev, tmp)
}
