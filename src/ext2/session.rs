//! `Session`: the REPL's current-working-directory bookkeeping.
//!
//! Deliberately separate from [`super::volume::Volume`]: the volume is the filesystem engine
//! handle, while the session is per-REPL-instance state that every command handler receives
//! alongside it, matching the "handler receives the cwd inode as an argument" contract.

use super::inode::ROOT_INODE;

/// The REPL's current working directory: both the resolved inode and its textual path.
pub struct Session {
	cwd_inode: u32,
	cwd_path: String,
}

impl Session {
	/// A fresh session rooted at `/`.
	pub fn new() -> Self {
		Self {
			cwd_inode: ROOT_INODE,
			cwd_path: "/".to_string(),
		}
	}

	pub fn cwd_inode(&self) -> u32 {
		self.cwd_inode
	}

	pub fn cwd_path(&self) -> &str {
		&self.cwd_path
	}

	/// Updates the session after a successful `cd` to `path`, which resolved to `inode`.
	pub fn enter(&mut self, inode: u32, path: &str) {
		self.cwd_path = join_and_normalize(&self.cwd_path, path);
		self.cwd_inode = inode;
	}
}

impl Default for Session {
	fn default() -> Self {
		Self::new()
	}
}

/// Joins `path` onto `base` the way a shell's `cd` would, then normalizes the result: resolves
/// `.` and `..` components textually, collapses repeated `/`, and trims any trailing slash
/// (except the root itself). This textual walk is independent of — but kept in lockstep with —
/// the inode-level resolution in [`super::path::resolve`].
fn join_and_normalize(base: &str, path: &str) -> String {
	let mut segments: Vec<&str> = if path.starts_with('/') {
		Vec::new()
	} else {
		base.split('/').filter(|c| !c.is_empty()).collect()
	};

	for comp in path.split('/').filter(|c| !c.is_empty()) {
		match comp {
			"." => {}
			".." => {
				segments.pop();
			}
			_ => segments.push(comp),
		}
	}

	if segments.is_empty() {
		"/".to_string()
	} else {
		format!("/{}", segments.join("/"))
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn absolute_path_resets_to_root() {
		let mut s = Session::new();
		s.enter(5, "/d/e");
		assert_eq!(s.cwd_path(), "/d/e");
	}

	#[test]
	fn relative_path_joins_onto_cwd() {
		let mut s = Session::new();
		s.enter(5, "/d");
		s.enter(6, "e");
		assert_eq!(s.cwd_path(), "/d/e");
	}

	#[test]
	fn dotdot_pops_a_segment() {
		let mut s = Session::new();
		s.enter(5, "/d/e");
		s.enter(2, "..");
		assert_eq!(s.cwd_path(), "/d");
	}

	#[test]
	fn dotdot_at_root_stays_at_root() {
		let mut s = Session::new();
		s.enter(2, "..");
		assert_eq!(s.cwd_path(), "/");
	}

	#[test]
	fn duplicate_and_trailing_slashes_are_trimmed() {
		let mut s = Session::new();
		s.enter(5, "//d//e/");
		assert_eq!(s.cwd_path(), "/d/e");
	}
}
