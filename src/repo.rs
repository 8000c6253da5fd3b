use std::fs::File;
use std::path::{Path, PathBuf};

use nix::fcntl::{Flock, FlockArg};

use crate::config::Config;
use crate::error::{Error, IoResultExt, Result};

/// a repository: a worktree path paired with its `.git` directory and
/// parsed configuration
pub struct Repo {
    worktree: PathBuf,
    gitdir: PathBuf,
    config: Config,
}

impl Repo {
    /// initialize a fresh repository at `worktree`
    pub fn create(worktree: &Path) -> Result<Self> {
        let gitdir = worktree.join(".git");

        std::fs::create_dir_all(&gitdir).with_path(&gitdir)?;
        std::fs::create_dir_all(gitdir.join("branches")).with_path(&gitdir)?;
        std::fs::create_dir_all(gitdir.join("objects")).with_path(&gitdir)?;
        std::fs::create_dir_all(gitdir.join("refs/tags")).with_path(&gitdir)?;
        std::fs::create_dir_all(gitdir.join("refs/heads")).with_path(&gitdir)?;
        std::fs::create_dir_all(gitdir.join("tmp")).with_path(&gitdir)?;

        std::fs::write(
            gitdir.join("description"),
            "Unnamed repository; edit this file 'description' to name the repository.\n",
        )
        .with_path(&gitdir)?;
        std::fs::write(gitdir.join("HEAD"), "ref: refs/heads/master\n").with_path(&gitdir)?;

        let config = Config::default();
        config.save(&gitdir.join("config"))?;

        tracing::debug!(path = %worktree.display(), "initialized repository");

        Ok(Self {
            worktree: worktree.to_path_buf(),
            gitdir,
            config,
        })
    }

    /// open an existing repository; fails unless `gitdir` exists and
    /// `core.repositoryformatversion == 0`
    pub fn open(worktree: &Path) -> Result<Self> {
        let gitdir = worktree.join(".git");
        if !gitdir.is_dir() {
            return Err(Error::NotARepository(worktree.to_path_buf()));
        }
        let config = Config::load(&gitdir.join("config"))?;

        Ok(Self {
            worktree: worktree.to_path_buf(),
            gitdir,
            config,
        })
    }

    /// walk upward from `start` until a directory containing `.git/` is
    /// found, then open it
    pub fn find(start: &Path) -> Result<Self> {
        let mut current = start
            .canonicalize()
            .map_err(|source| Error::Io { path: start.to_path_buf(), source })?;

        loop {
            if current.join(".git").is_dir() {
                return Self::open(&current);
            }
            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Err(Error::NotARepository(start.to_path_buf())),
            }
        }
    }

    pub fn worktree(&self) -> &Path {
        &self.worktree
    }

    pub fn gitdir(&self) -> &Path {
        &self.gitdir
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tmp_path(&self) -> PathBuf {
        self.gitdir.join("tmp")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.gitdir.join(".lock")
    }

    /// acquire an exclusive advisory lock on the repository, blocking
    /// writers. Released on drop. Not taken implicitly by any operation
    /// in this crate — callers that need multi-writer safety opt in.
    pub fn lock(&self) -> Result<RepoLock> {
        let path = self.lock_path();
        let file = File::create(&path).with_path(&path)?;
        let flock = Flock::lock(file, FlockArg::LockExclusiveNonblock)
            .map_err(|_| Error::LockContention)?;
        Ok(RepoLock { flock })
    }

    pub fn try_lock(&self) -> Result<Option<RepoLock>> {
        let path = self.lock_path();
        let file = File::create(&path).with_path(&path)?;
        match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(flock) => Ok(Some(RepoLock { flock })),
            Err((_, nix::errno::Errno::EWOULDBLOCK)) => Ok(None),
            Err(_) => Err(Error::LockContention),
        }
    }
}

/// guard releasing the repository lock when dropped
pub struct RepoLock {
    #[allow(dead_code)]
    flock: Flock<File>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn create_lays_out_skeleton() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("repo");
        let repo = Repo::create(&path).unwrap();

        assert_eq!(
            std::fs::read_to_string(repo.gitdir().join("HEAD")).unwrap(),
            "ref: refs/heads/master\n"
        );
        assert!(repo.gitdir().join("refs/heads").is_dir());
        assert!(repo.gitdir().join("refs/tags").is_dir());
        assert!(std::fs::read_to_string(repo.gitdir().join("config"))
            .unwrap()
            .contains("[core]"));
    }

    #[test]
    fn open_requires_existing_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope");
        assert!(matches!(Repo::open(&path), Err(Error::NotARepository(_))));
    }

    #[test]
    fn find_walks_upward_to_gitdir() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("repo");
        Repo::create(&root).unwrap();

        let nested = root.join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();

        let found = Repo::find(&nested).unwrap();
        assert_eq!(found.gitdir(), root.join(".git"));
    }

    #[test]
    fn open_rejects_unsupported_format_version() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("repo");
        let repo = Repo::create(&path).unwrap();
        std::fs::write(
            repo.gitdir().join("config"),
            "[core]\n\trepositoryformatversion = 9\n",
        )
        .unwrap();

        assert!(matches!(Repo::open(&path), Err(Error::UnsupportedFormat(9))));
    }

    #[test]
    fn lock_then_try_lock_is_contended() {
        let dir = tempdir().unwrap();
        let repo = Repo::create(&dir.path().join("repo")).unwrap();

        let guard = repo.lock().unwrap();
        assert!(repo.try_lock().unwrap().is_none());
        drop(guard);
        assert!(repo.try_lock().unwrap().is_some());
    }
}
