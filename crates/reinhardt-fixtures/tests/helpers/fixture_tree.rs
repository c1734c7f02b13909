//! Fixture tree helper.
//!
//! Builds fixture directories in a temporary location.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Temporary fixture root.
///
/// The directory is removed when the tree is dropped.
pub struct FixtureTree {
	dir: TempDir,
}

impl FixtureTree {
	/// Create an empty fixture root.
	pub fn new() -> Self {
		Self {
			dir: TempDir::new().expect("Failed to create temporary fixture root"),
		}
	}

	/// Write a file below the root, creating parent directories.
	///
	/// # Arguments
	///
	/// * `relative` - Path of the file relative to the root
	/// * `content` - File contents
	pub fn write(&self, relative: &str, content: &str) -> &Self {
		let path = self.path(relative);
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)
				.unwrap_or_else(|_| panic!("Failed to create directory: {:?}", parent));
		}
		fs::write(&path, content).unwrap_or_else(|_| panic!("Failed to write fixture: {:?}", path));
		self
	}

	/// Create a directory below the root.
	pub fn dir(&self, relative: &str) -> &Self {
		let path = self.path(relative);
		fs::create_dir_all(&path)
			.unwrap_or_else(|_| panic!("Failed to create directory: {:?}", path));
		self
	}

	/// Get the full path of an entry below the root.
	pub fn path(&self, relative: &str) -> PathBuf {
		self.dir.path().join(relative)
	}

	/// Get the fixture root.
	pub fn root(&self) -> &Path {
		self.dir.path()
	}
}

impl Default for FixtureTree {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[rstest::rstest]
	fn test_fixture_tree_write_creates_parents() {
		let tree = FixtureTree::new();
		tree.write("checkout/empty_cart/carts.yml", "empty: {}\n");
		assert!(tree.path("checkout/empty_cart/carts.yml").is_file());
	}

	#[rstest::rstest]
	fn test_fixture_tree_dir() {
		let tree = FixtureTree::new();
		tree.dir("notes");
		assert!(tree.path("notes").is_dir());
		assert!(tree.path("notes").starts_with(tree.root()));
	}
}
