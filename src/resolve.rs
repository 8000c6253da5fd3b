//! resolve a user-supplied name to an oid: HEAD, full hex, short hex
//! prefix, ref-tree search, and optional typed peeling.

use crate::error::{Error, Result};
use crate::object::{self, Kind, Object};
use crate::oid::Oid;
use crate::refs;
use crate::repo::Repo;

/// resolve `name` to an oid, peeling to `want` if given
pub fn object_find(repo: &Repo, name: &str, want: Option<Kind>) -> Result<Oid> {
    let name = name.trim();
    let oid = resolve_name(repo, name)?;
    match want {
        Some(kind) => peel(repo, oid, kind),
        None => Ok(oid),
    }
}

fn resolve_name(repo: &Repo, name: &str) -> Result<Oid> {
    if name == "HEAD" {
        return refs::resolve(repo, "HEAD");
    }
    if is_hex_candidate(name) {
        if name.len() == 40 {
            return Oid::from_hex(&name.to_lowercase());
        }
        return resolve_short_hex(repo, name);
    }
    if let Some(oid) = refs::find_by_leaf_name(repo, name)? {
        return Ok(oid);
    }
    Err(Error::NoMatch(name.to_string()))
}

fn is_hex_candidate(s: &str) -> bool {
    (4..=40).contains(&s.len()) && s.chars().all(|c| c.is_ascii_hexdigit())
}

fn resolve_short_hex(repo: &Repo, prefix: &str) -> Result<Oid> {
    let prefix = prefix.to_lowercase();
    let (shard, rest) = prefix.split_at(2);
    let shard_dir = repo.gitdir().join("objects").join(shard);
    if !shard_dir.is_dir() {
        return Err(Error::NoMatch(prefix));
    }

    let mut candidates: Vec<String> = std::fs::read_dir(&shard_dir)
        .map_err(|source| crate::error::Error::Io { path: shard_dir.clone(), source })?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with(rest))
        .collect();
    candidates.sort();

    match candidates.len() {
        0 => Err(Error::NoMatch(prefix)),
        1 => Oid::from_hex(&format!("{shard}{}", candidates[0])),
        n => Err(Error::Ambiguous(prefix, n)),
    }
}

fn peel(repo: &Repo, oid: Oid, want: Kind) -> Result<Oid> {
    let object = object::read(repo, &oid)?;
    if object.kind() == want {
        return Ok(oid);
    }
    match &object {
        Object::Tag(tag) => peel(repo, tag.target()?, want),
        Object::Commit(commit) if want == Kind::Tree => commit.tree(),
        _ => Err(Error::TypeMismatch(oid, object.kind().as_str(), want.as_str())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{write, Blob, Commit, Tag, Tree};
    use tempfile::tempdir;

    fn repo() -> (tempfile::TempDir, Repo) {
        let dir = tempdir().unwrap();
        let repo = Repo::create(&dir.path().join("r")).unwrap();
        (dir, repo)
    }

    #[test]
    fn resolves_head_through_master() {
        let (_dir, repo) = repo();
        let blob_oid = write(&repo, &Object::Blob(Blob::new(b"x".to_vec())), false).unwrap();
        let tree_oid = write(
            &repo,
            &Object::Tree(Tree::new(vec![crate::object::TreeEntry::new(
                "100644", "x", blob_oid,
            )])),
            false,
        )
        .unwrap();
        let commit_oid = write(
            &repo,
            &Object::Commit(Commit::new(tree_oid, &[], &[], b"c".to_vec())),
            false,
        )
        .unwrap();
        refs::write_direct(&repo, "refs/heads/master", &commit_oid).unwrap();

        assert_eq!(object_find(&repo, "HEAD", None).unwrap(), commit_oid);
    }

    #[test]
    fn short_hash_ambiguous_and_unique() {
        let (_dir, repo) = repo();
        let a = write(&repo, &Object::Blob(Blob::new(b"aaaa".to_vec())), false).unwrap();
        let b = write(&repo, &Object::Blob(Blob::new(b"bbbb".to_vec())), false).unwrap();

        // full hash always resolves uniquely
        assert_eq!(object_find(&repo, &a.to_hex(), None).unwrap(), a);
        assert_eq!(object_find(&repo, &b.to_hex(), None).unwrap(), b);

        // a too-short shared prefix of both full hashes is ambiguous
        let shared_len = a
            .to_hex()
            .chars()
            .zip(b.to_hex().chars())
            .take_while(|(x, y)| x == y)
            .count();
        if shared_len >= 4 {
            let prefix = &a.to_hex()[..shared_len.max(4)];
            assert!(matches!(
                object_find(&repo, prefix, None),
                Err(Error::Ambiguous(_, _))
            ));
        }
    }

    #[test]
    fn unknown_name_is_no_match() {
        let (_dir, repo) = repo();
        assert!(matches!(
            object_find(&repo, "does-not-exist", None),
            Err(Error::NoMatch(_))
        ));
    }

    #[test]
    fn peels_tag_chain_to_commit_and_tree() {
        let (_dir, repo) = repo();
        let tree_oid = write(&repo, &Object::Tree(Tree::default()), false).unwrap();
        let commit_oid = write(
            &repo,
            &Object::Commit(Commit::new(tree_oid, &[], &[], b"c".to_vec())),
            false,
        )
        .unwrap();
        let inner_tag = write(
            &repo,
            &Object::Tag(Tag::new(commit_oid, Kind::Commit, "inner", &[], b"i".to_vec())),
            false,
        )
        .unwrap();
        let outer_tag = write(
            &repo,
            &Object::Tag(Tag::new(inner_tag, Kind::Tag, "outer", &[], b"o".to_vec())),
            false,
        )
        .unwrap();

        assert_eq!(
            object_find(&repo, &outer_tag.to_hex(), Some(Kind::Commit)).unwrap(),
            commit_oid
        );
        assert_eq!(
            object_find(&repo, &outer_tag.to_hex(), Some(Kind::Tree)).unwrap(),
            tree_oid
        );
    }

    #[test]
    fn type_mismatch_when_peel_impossible() {
        let (_dir, repo) = repo();
        let blob_oid = write(&repo, &Object::Blob(Blob::new(b"x".to_vec())), false).unwrap();
        assert!(matches!(
            object_find(&repo, &blob_oid.to_hex(), Some(Kind::Commit)),
            Err(Error::TypeMismatch(_, _, _))
        ));
    }
}
