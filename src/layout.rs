//! path resolution helpers under a repository's `gitdir`
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// join path segments under `gitdir`
pub fn path(gitdir: &Path, segments: &[&str]) -> PathBuf {
    segments.iter().fold(gitdir.to_path_buf(), |p, seg| p.join(seg))
}

/// return a directory handle under `gitdir`, optionally creating it.
///
/// fails if a non-directory occupies the path, or if it is absent and
/// `mkdir` is false.
pub fn dir(gitdir: &Path, segments: &[&str], mkdir: bool) -> Result<PathBuf> {
    let target = path(gitdir, segments);
    if target.exists() {
        if target.is_dir() {
            Ok(target)
        } else {
            Err(Error::PathConflict(target))
        }
    } else if mkdir {
        std::fs::create_dir_all(&target).map_err(|source| Error::Io {
            path: target.clone(),
            source,
        })?;
        Ok(target)
    } else {
        Err(Error::NotFound(target))
    }
}

/// return the full path to a file under `gitdir`, ensuring the parent
/// directory exists (optionally creating it).
pub fn file(gitdir: &Path, segments: &[&str], mkdir: bool) -> Result<PathBuf> {
    let (parent, _) = segments.split_at(segments.len() - 1);
    if !parent.is_empty() {
        dir(gitdir, parent, mkdir)?;
    }
    Ok(path(gitdir, segments))
}

/// `objects/<oid[0:2]>/<oid[2:]>`, optionally creating the shard directory
pub fn object_path(gitdir: &Path, oid: &crate::oid::Oid, mkdir: bool) -> Result<PathBuf> {
    let (shard, rest) = oid.to_path_components();
    if mkdir {
        dir(gitdir, &["objects", &shard], true)?;
    }
    Ok(path(gitdir, &["objects", &shard, &rest]))
}
