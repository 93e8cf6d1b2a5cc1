//! Test helpers shared across the `reliquary` workspace.
#![warn(missing_docs)]

use std::path::{Path, PathBuf};

/// Returns the full path to the specified fixture.
///
/// Fixtures are stored in the `reliquary-testutils/fixtures` directory and
/// paths should be given relative to that location.
///
/// # Example
///
/// ```no_run
/// use reliquary_testutils::fixture;
///
/// let path = fixture("packs/tiny_content.bin");
/// assert!(path.ends_with("packs/tiny_content.bin"));
/// ```
pub fn fixture<P: AsRef<Path>>(path: P) -> PathBuf {
    let mut full_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    full_path.push("fixtures");

    let path = path.as_ref();
    full_path.push(path);

    assert!(
        full_path.exists(),
        "Fixture does not exist: {}",
        full_path.display()
    );

    full_path
}
