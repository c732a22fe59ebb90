//! Path resolution: walking a `/`-separated path from an inode to the inode it names.

use super::bgdt::GroupDescriptor;
use super::block_device::BLOCK_SIZE;
use super::block_device::BlockDevice;
use super::directory;
use super::error::Error;
use super::error::Result;
use super::inode;
use super::inode::FileType;
use super::inode::ROOT_INODE;
use super::superblock::Superblock;

/// Maximum length in bytes of one path component (ext2's on-disk `name_len` is one byte).
pub const MAX_NAME_LEN: usize = 255;

/// Reads a directory inode's single data block and its logical size (clamped to one block,
/// per this engine's single-block-directory invariant).
fn load_dir_block(
	dev: &mut BlockDevice,
	sb: &Superblock,
	table: &[GroupDescriptor],
	n: u32,
) -> Result<([u8; BLOCK_SIZE as usize], usize)> {
	let node = inode::read_inode(dev, sb, table, n)?;
	if !node.file_type().is_directory() {
		return Err(Error::NotADirectory);
	}
	let buf = dev.read_block(node.block[0])?;
	let size = (node.size() as usize).min(BLOCK_SIZE as usize);
	Ok((buf, size))
}

/// Resolves `hint` to a concrete file type, falling back to reading `n`'s inode mode when the
/// directory-entry file-type byte was `Unknown`.
fn normalize_type(dev: &mut BlockDevice, sb: &Superblock, table: &[GroupDescriptor], n: u32, hint: FileType) -> Result<FileType> {
	if hint != FileType::Unknown {
		return Ok(hint);
	}
	Ok(inode::read_inode(dev, sb, table, n)?.file_type())
}

/// Resolves `path` starting from `base` (the caller's cwd inode, assumed to already be a
/// directory). An absolute path (leading `/`) resets the cursor to the root inode first.
///
/// Returns the resolved inode number and its normalized file type.
pub fn resolve(
	dev: &mut BlockDevice,
	sb: &Superblock,
	table: &[GroupDescriptor],
	base: u32,
	path: &str,
) -> Result<(u32, FileType)> {
	let mut cursor = if path.starts_with('/') {
		ROOT_INODE
	} else {
		base
	};
	let mut cursor_type = FileType::Directory;

	for comp in path.split('/').filter(|c| !c.is_empty()) {
		if !cursor_type.is_directory() {
			return Err(Error::NotADirectory);
		}

		let (next, hint) = if comp == "." {
			(cursor, FileType::Directory)
		} else if comp == ".." {
			if cursor == ROOT_INODE {
				(ROOT_INODE, FileType::Directory)
			} else {
				let (buf, size) = load_dir_block(dev, sb, table, cursor)?;
				directory::lookup(&buf, size, "..").ok_or(Error::NotFound)?
			}
		} else {
			let (buf, size) = load_dir_block(dev, sb, table, cursor)?;
			directory::lookup(&buf, size, comp).ok_or(Error::NotFound)?
		};

		cursor = next;
		cursor_type = normalize_type(dev, sb, table, next, hint)?;
	}

	Ok((cursor, cursor_type))
}

/// Splits a path into its parent (resolvable by [`resolve`]) and final leaf component.
///
/// A leaf-only path (no `/`) yields an empty parent, which `resolve` treats as "stay at the
/// base inode" — i.e. the caller's cwd. A trailing `/` is stripped first, so `"/d/"` and
/// `"/d"` split the same way.
pub fn split_leaf(path: &str) -> (&str, &str) {
	let trimmed = path.trim_end_matches('/');
	match trimmed.rfind('/') {
		Some(i) => (&trimmed[..=i], &trimmed[i + 1..]),
		None => ("", trimmed),
	}
}

/// Validates a leaf name for `touch`/`mkdir`/`rename`/`mv`/`cp` destinations: non-empty, no
/// more than 255 bytes, and containing no `/` (guaranteed already by [`split_leaf`], checked
/// again here for names supplied directly).
pub fn validate_name(name: &str) -> Result<()> {
	if name.is_empty() {
		return Err(Error::InvalidName("empty name".into()));
	}
	if name.len() > MAX_NAME_LEN {
		return Err(Error::InvalidName(format!("name longer than {MAX_NAME_LEN} bytes")));
	}
	if name.contains('/') {
		return Err(Error::InvalidName("name contains '/'".into()));
	}
	Ok(())
}

/// Rejects `.` and `..` as an operand name, for commands that refuse to target them directly
/// (`rm`, `rmdir`, `rename`, `mv`).
pub fn reject_dot_entries(name: &str) -> Result<()> {
	if name == "." || name == ".." {
		return Err(Error::InvalidName(format!("'{name}' may not be used here")));
	}
	Ok(())
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::ext2::bgdt;
	use crate::ext2::testutil::build_minimal_image;

	#[test]
	fn resolves_root() {
		let (mut dev, _) = build_minimal_image();
		let sb = Superblock::read(&mut dev).unwrap();
		let table = bgdt::read_table(&mut dev, &sb).unwrap();
		let (n, ft) = resolve(&mut dev, &sb, &table, ROOT_INODE, "/").unwrap();
		assert_eq!(n, ROOT_INODE);
		assert_eq!(ft, FileType::Directory);
	}

	#[test]
	fn resolves_dot_and_dotdot_at_root() {
		let (mut dev, _) = build_minimal_image();
		let sb = Superblock::read(&mut dev).unwrap();
		let table = bgdt::read_table(&mut dev, &sb).unwrap();
		let (n, _) = resolve(&mut dev, &sb, &table, ROOT_INODE, "./../.").unwrap();
		assert_eq!(n, ROOT_INODE);
	}

	#[test]
	fn missing_component_is_not_found() {
		let (mut dev, _) = build_minimal_image();
		let sb = Superblock::read(&mut dev).unwrap();
		let table = bgdt::read_table(&mut dev, &sb).unwrap();
		assert!(matches!(resolve(&mut dev, &sb, &table, ROOT_INODE, "/nope"), Err(Error::NotFound)));
	}

	#[test]
	fn split_leaf_handles_absolute_and_relative_paths() {
		assert_eq!(split_leaf("/d/x"), ("/d/", "x"));
		assert_eq!(split_leaf("/x"), ("/", "x"));
		assert_eq!(split_leaf("x"), ("", "x"));
		assert_eq!(split_leaf("/d/"), ("/", "d"));
	}

	#[test]
	fn validate_name_rejects_overlong_and_empty() {
		assert!(validate_name("").is_err());
		assert!(validate_name(&"a".repeat(255)).is_ok());
		assert!(validate_name(&"a".repeat(256)).is_err());
		assert!(validate_name("has/slash").is_err());
	}
}
