//! `cat path`: streams a regular file's bytes.

use crate::ext2::error::Error;
use crate::ext2::error::Result;
use crate::ext2::volume::Volume;

pub fn cat(vol: &mut Volume, cwd: u32, path: &str) -> Result<Vec<u8>> {
	let (n, file_type) = vol.resolve(cwd, path)?;
	if !file_type.is_regular() {
		return Err(Error::NotAFile);
	}
	let node = vol.read_inode(n)?;
	vol.read_file(&node)
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::ext2::bgdt;
	use crate::ext2::inode::ROOT_INODE;
	use crate::ext2::superblock::Superblock;
	use crate::ext2::testutil::build_minimal_image;

	#[test]
	fn refuses_a_directory() {
		let (mut dev, _tmp) = build_minimal_image();
		let sb = Superblock::read(&mut dev).unwrap();
		let table = bgdt::read_table(&mut dev, &sb).unwrap();
		let mut vol = Volume::from_parts(dev, sb, table);

		assert!(matches!(cat(&mut vol, ROOT_INODE, "."), Err(Error::NotAFile)));
	}
}
