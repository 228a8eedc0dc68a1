//! Symlink creation and removal.
use anyhow::{Context as _, Result};
use std::path::Path;

/// Result of [`remove_entry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The entry is (or would be) deleted.
    Removed,
    /// Nothing was there.
    Absent,
    /// A directory with content; left in place.
    NotEmpty,
}

/// Lexical existence check: a dangling symlink counts as existing.
#[must_use]
pub fn source_exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

/// Create the parent directory of `path` if needed.
///
/// # Errors
///
/// Returns an error if the directory cannot be created, e.g. because a
/// regular file occupies part of the path.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create parent: {}", parent.display()))?;
    }
    Ok(())
}

/// Check, without creating anything, that [`ensure_parent_dir`] could
/// succeed for `path`: the nearest existing ancestor must be a directory.
///
/// # Errors
///
/// Returns an error naming the ancestor that blocks the parent path.
pub fn check_parent_dir(path: &Path) -> Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    match parent.ancestors().find(|p| p.symlink_metadata().is_ok()) {
        Some(existing) if !existing.is_dir() => anyhow::bail!(
            "create parent: {}: {} is not a directory",
            parent.display(),
            existing.display()
        ),
        _ => Ok(()),
    }
}

/// Create a symlink at `link` pointing to `source`.
///
/// # Errors
///
/// Returns an error if the link cannot be created (including when
/// something already exists at `link`).
pub fn create_symlink(source: &Path, link: &Path) -> Result<()> {
    std::os::unix::fs::symlink(source, link).with_context(|| {
        format!(
            "creating symlink {} -> {}",
            link.display(),
            source.display()
        )
    })
}

/// Remove the symlink at `path` without touching what it points to.
///
/// # Errors
///
/// Returns an error if `path` is not a symlink or cannot be unlinked.
pub fn remove_symlink(path: &Path) -> Result<()> {
    let meta = std::fs::symlink_metadata(path)
        .with_context(|| format!("reading metadata: {}", path.display()))?;
    if !meta.file_type().is_symlink() {
        anyhow::bail!("not a symlink: {}", path.display());
    }
    std::fs::remove_file(path).with_context(|| format!("removing symlink: {}", path.display()))
}

/// Report what [`remove_entry`] would do at `path` without changing anything.
///
/// # Errors
///
/// Returns an error if the path or directory listing cannot be read.
pub fn inspect_removal(path: &Path) -> Result<Removal> {
    let meta = match std::fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e)
            if matches!(
                e.kind(),
                std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory
            ) =>
        {
            return Ok(Removal::Absent);
        }
        Err(e) => return Err(e).with_context(|| format!("reading metadata: {}", path.display())),
    };
    if meta.is_dir()
        && std::fs::read_dir(path)
            .with_context(|| format!("reading directory: {}", path.display()))?
            .next()
            .is_some()
    {
        return Ok(Removal::NotEmpty);
    }
    Ok(Removal::Removed)
}

/// Delete whatever exists at `path`: files and symlinks are unlinked, an
/// empty directory is removed, a non-empty directory is refused.
///
/// # Errors
///
/// Returns an error if the path cannot be inspected or the removal fails
/// for a reason other than the directory having content.
pub fn remove_entry(path: &Path) -> Result<Removal> {
    let plan = inspect_removal(path)?;
    if plan != Removal::Removed {
        return Ok(plan);
    }
    let is_dir = std::fs::symlink_metadata(path).is_ok_and(|m| m.is_dir());
    if is_dir {
        std::fs::remove_dir(path)
            .with_context(|| format!("removing directory: {}", path.display()))?;
    } else {
        std::fs::remove_file(path).with_context(|| format!("removing file: {}", path.display()))?;
    }
    Ok(Removal::Removed)
}
