//! Filesystem primitives for link targets (observe, then act).
pub mod symlink;

use anyhow::{Context as _, Result};
use std::io;
use std::path::{Path, PathBuf};

/// What currently occupies a target path.
///
/// # Examples
///
/// ```
/// use dotlink::resources::TargetState;
///
/// let dir = std::env::temp_dir().join("dotlink-doc-surely-absent");
/// assert_eq!(TargetState::observe(&dir).unwrap(), TargetState::Absent);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetState {
    /// Nothing exists at the path.
    Absent,
    /// A symlink whose referent exists.
    SymlinkValid {
        /// The link's stored destination.
        points_to: PathBuf,
    },
    /// A symlink whose referent does not exist.
    SymlinkBroken {
        /// The link's stored destination.
        points_to: PathBuf,
    },
    /// A regular file, directory or other non-symlink entry.
    OtherExisting {
        /// Whether the entry is a directory.
        is_dir: bool,
    },
}

impl TargetState {
    /// Inspect `path` without following its final component, then follow it
    /// once to tell valid links from broken ones.
    ///
    /// A missing parent, or a parent that is not a directory, counts as
    /// [`TargetState::Absent`]; creating the parent is what then fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be inspected (e.g. permission
    /// denied on a parent directory).
    pub fn observe(path: &Path) -> Result<Self> {
        let meta = match std::fs::symlink_metadata(path) {
            Ok(meta) => meta,
            Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
                return Ok(Self::Absent);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("reading metadata: {}", path.display()));
            }
        };

        if meta.file_type().is_symlink() {
            let points_to = std::fs::read_link(path)
                .with_context(|| format!("reading link: {}", path.display()))?;
            if path.exists() {
                Ok(Self::SymlinkValid { points_to })
            } else {
                Ok(Self::SymlinkBroken { points_to })
            }
        } else {
            Ok(Self::OtherExisting {
                is_dir: meta.is_dir(),
            })
        }
    }
}
