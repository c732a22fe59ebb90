//! The ext2 superblock: singleton metadata describing the whole filesystem.

use super::block_device::BLOCK_SIZE;
use super::block_device::BlockDevice;
use super::error::Error;
use super::error::Result;
use super::raw::ru16;
use super::raw::ru32;
use super::raw::wu16;
use super::raw::wu32;

/// Byte offset of the superblock from the beginning of the image.
pub const SUPERBLOCK_OFFSET: u64 = 1024;
/// The ext2 magic signature.
pub const EXT2_MAGIC: u16 = 0xef53;
/// Size in bytes of the on-disk superblock structure (it occupies a full block).
const SUPERBLOCK_SIZE: usize = 1024;

/// In-memory cache of the image's superblock.
///
/// Fields the engine never alters (mount bookkeeping, feature flags, the filesystem id, the
/// reserved padding...) are still decoded and re-encoded unmodified on every flush, so a
/// mutation never clobbers metadata this engine doesn't model.
#[derive(Debug, Clone)]
pub struct Superblock {
	pub total_inodes: u32,
	pub total_blocks: u32,
	pub reserved_blocks: u32,
	pub free_blocks: u32,
	pub free_inodes: u32,
	pub first_data_block: u32,
	pub block_size_log: u32,
	pub fragment_size_log: u32,
	pub blocks_per_group: u32,
	pub fragments_per_group: u32,
	pub inodes_per_group: u32,
	pub last_mount_time: u32,
	pub last_write_time: u32,
	pub mount_count_since_fsck: u16,
	pub mount_count_before_fsck: u16,
	pub magic: u16,
	pub fs_state: u16,
	pub error_action: u16,
	pub minor_rev_level: u16,
	pub last_fsck_time: u32,
	pub fsck_interval: u32,
	pub os_id: u32,
	pub rev_level: u32,
	pub uid_reserved: u16,
	pub gid_reserved: u16,

	// Extended fields (valid for `rev_level >= 1`; this engine trusts them regardless, since
	// `get_inode_size` already falls back to 128 for revision 0).
	pub first_non_reserved_inode: u32,
	pub inode_size: u16,
	pub block_group_nr: u16,
	pub optional_features: u32,
	pub required_features: u32,
	pub write_required_features: u32,
	pub filesystem_id: [u8; 16],
	pub volume_name: [u8; 16],
	pub last_mount_path: [u8; 64],

	/// Raw bytes of the remaining on-disk fields (compression algorithms, preallocation
	/// counts, journal bookkeeping, and the trailing padding) that this engine reads and
	/// writes back unmodified.
	tail: [u8; SUPERBLOCK_SIZE - 236],
}

impl Superblock {
	/// Reads and validates the superblock from the image.
	pub fn read(dev: &mut BlockDevice) -> Result<Self> {
		let mut buf = [0u8; SUPERBLOCK_SIZE];
		dev.read_at(SUPERBLOCK_OFFSET, &mut buf)?;

		let magic = ru16(&buf, 56);
		if magic != EXT2_MAGIC {
			return Err(Error::InvalidImage(format!(
				"bad magic 0x{:04x}, expected 0x{:04x}",
				magic, EXT2_MAGIC
			)));
		}

		let mut tail = [0u8; SUPERBLOCK_SIZE - 236];
		tail.copy_from_slice(&buf[236..SUPERBLOCK_SIZE]);

		let sb = Self {
			total_inodes: ru32(&buf, 0),
			total_blocks: ru32(&buf, 4),
			reserved_blocks: ru32(&buf, 8),
			free_blocks: ru32(&buf, 12),
			free_inodes: ru32(&buf, 16),
			first_data_block: ru32(&buf, 20),
			block_size_log: ru32(&buf, 24),
			fragment_size_log: ru32(&buf, 28),
			blocks_per_group: ru32(&buf, 32),
			fragments_per_group: ru32(&buf, 36),
			inodes_per_group: ru32(&buf, 40),
			last_mount_time: ru32(&buf, 44),
			last_write_time: ru32(&buf, 48),
			mount_count_since_fsck: ru16(&buf, 52),
			mount_count_before_fsck: ru16(&buf, 54),
			magic,
			fs_state: ru16(&buf, 58),
			error_action: ru16(&buf, 60),
			minor_rev_level: ru16(&buf, 62),
			last_fsck_time: ru32(&buf, 64),
			fsck_interval: ru32(&buf, 68),
			os_id: ru32(&buf, 72),
			rev_level: ru32(&buf, 76),
			uid_reserved: ru16(&buf, 80),
			gid_reserved: ru16(&buf, 82),

			first_non_reserved_inode: ru32(&buf, 84),
			inode_size: ru16(&buf, 88),
			block_group_nr: ru16(&buf, 90),
			optional_features: ru32(&buf, 92),
			required_features: ru32(&buf, 96),
			write_required_features: ru32(&buf, 100),
			filesystem_id: buf[104..120].try_into().unwrap(),
			volume_name: buf[120..136].try_into().unwrap(),
			last_mount_path: buf[136..200].try_into().unwrap(),

			tail,
		};

		let block_size = sb.block_size();
		if block_size != BLOCK_SIZE {
			return Err(Error::InvalidImage(format!(
				"unsupported block size {} (only {} is supported)",
				block_size, BLOCK_SIZE
			)));
		}
		if sb.inodes_per_group == 0 || sb.blocks_per_group == 0 {
			return Err(Error::InvalidImage("zero inodes_per_group or blocks_per_group".into()));
		}

		Ok(sb)
	}

	/// Writes the superblock back to the image.
	pub fn write(&self, dev: &mut BlockDevice) -> Result<()> {
		let mut buf = [0u8; SUPERBLOCK_SIZE];

		wu32(&mut buf, 0, self.total_inodes);
		wu32(&mut buf, 4, self.total_blocks);
		wu32(&mut buf, 8, self.reserved_blocks);
		wu32(&mut buf, 12, self.free_blocks);
		wu32(&mut buf, 16, self.free_inodes);
		wu32(&mut buf, 20, self.first_data_block);
		wu32(&mut buf, 24, self.block_size_log);
		wu32(&mut buf, 28, self.fragment_size_log);
		wu32(&mut buf, 32, self.blocks_per_group);
		wu32(&mut buf, 36, self.fragments_per_group);
		wu32(&mut buf, 40, self.inodes_per_group);
		wu32(&mut buf, 44, self.last_mount_time);
		wu32(&mut buf, 48, self.last_write_time);
		wu16(&mut buf, 52, self.mount_count_since_fsck);
		wu16(&mut buf, 54, self.mount_count_before_fsck);
		wu16(&mut buf, 56, self.magic);
		wu16(&mut buf, 58, self.fs_state);
		wu16(&mut buf, 60, self.error_action);
		wu16(&mut buf, 62, self.minor_rev_level);
		wu32(&mut buf, 64, self.last_fsck_time);
		wu32(&mut buf, 68, self.fsck_interval);
		wu32(&mut buf, 72, self.os_id);
		wu32(&mut buf, 76, self.rev_level);
		wu16(&mut buf, 80, self.uid_reserved);
		wu16(&mut buf, 82, self.gid_reserved);

		wu32(&mut buf, 84, self.first_non_reserved_inode);
		wu16(&mut buf, 88, self.inode_size);
		wu16(&mut buf, 90, self.block_group_nr);
		wu32(&mut buf, 92, self.optional_features);
		wu32(&mut buf, 96, self.required_features);
		wu32(&mut buf, 100, self.write_required_features);
		buf[104..120].copy_from_slice(&self.filesystem_id);
		buf[120..136].copy_from_slice(&self.volume_name);
		buf[136..200].copy_from_slice(&self.last_mount_path);

		buf[236..SUPERBLOCK_SIZE].copy_from_slice(&self.tail);

		dev.write_at(SUPERBLOCK_OFFSET, &buf)
	}

	/// The filesystem's block size in bytes, `2^(10 + block_size_log)`.
	pub fn block_size(&self) -> u32 {
		1u32 << (10 + self.block_size_log)
	}

	/// The size in bytes of one on-disk inode slot.
	pub fn inode_size(&self) -> usize {
		if self.rev_level >= 1 {
			self.inode_size.max(128) as usize
		} else {
			128
		}
	}

	/// Number of block groups, `ceil(total_blocks / blocks_per_group)`.
	pub fn group_count(&self) -> u32 {
		self.total_blocks.div_ceil(self.blocks_per_group)
	}

	/// The filesystem's volume label, if it has one.
	pub fn volume_name(&self) -> String {
		let end = self.volume_name.iter().position(|&b| b == 0).unwrap_or(self.volume_name.len());
		String::from_utf8_lossy(&self.volume_name[..end]).into_owned()
	}
}
