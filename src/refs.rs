//! symbolic/direct refs and the hierarchical `refs/` namespace.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

use crate::error::{Error, IoResultExt, Result};
use crate::layout;
use crate::oid::Oid;
use crate::repo::Repo;

const MAX_SYMBOLIC_DEPTH: u32 = 10;

/// a node in the `refs/` tree: a leaf resolves directly to an oid, or a
/// subtree groups further refs beneath it
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefNode {
    Leaf(Oid),
    Tree(BTreeMap<String, RefNode>),
}

/// write a direct ref (create or update), storing `<oid>\n`
pub fn write_direct(repo: &Repo, ref_path: &str, oid: &Oid) -> Result<()> {
    write_raw(repo, ref_path, &format!("{}\n", oid.to_hex()))
}

/// write a symbolic ref, storing `ref: <target>\n`
pub fn write_symbolic(repo: &Repo, ref_path: &str, target: &str) -> Result<()> {
    write_raw(repo, ref_path, &format!("ref: {target}\n"))
}

fn write_raw(repo: &Repo, ref_path: &str, content: &str) -> Result<()> {
    validate_ref_path(ref_path)?;
    let segments: Vec<&str> = ref_path.split('/').collect();
    let path = layout::file(repo.gitdir(), &segments, true)?;

    let tmp_path = repo.tmp_path().join(uuid::Uuid::new_v4().to_string());
    {
        let mut tmp_file = File::create(&tmp_path).with_path(&tmp_path)?;
        tmp_file.write_all(content.as_bytes()).with_path(&tmp_path)?;
        tmp_file.sync_all().with_path(&tmp_path)?;
    }
    fs::rename(&tmp_path, &path).with_path(&path)?;
    Ok(())
}

/// read the literal content of a ref file (trimmed), without following
/// symbolic indirection
fn read_raw(repo: &Repo, ref_path: &str) -> Result<String> {
    let path = full_path(repo, ref_path);
    let content = fs::read_to_string(&path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::NoMatch(ref_path.to_string())
        } else {
            Error::Io { path: path.clone(), source: e }
        }
    })?;
    Ok(content.trim_end().to_string())
}

/// resolve a ref path (`HEAD`, `refs/heads/master`, ...) to its oid,
/// following symbolic indirection up to a bounded depth
pub fn resolve(repo: &Repo, ref_path: &str) -> Result<Oid> {
    resolve_depth(repo, ref_path, 0)
}

fn resolve_depth(repo: &Repo, ref_path: &str, depth: u32) -> Result<Oid> {
    if depth >= MAX_SYMBOLIC_DEPTH {
        return Err(Error::RefCycle(ref_path.to_string()));
    }
    let content = read_raw(repo, ref_path)?;
    if let Some(target) = content.strip_prefix("ref: ") {
        resolve_depth(repo, target.trim(), depth + 1)
    } else {
        Oid::from_hex(&content)
    }
}

/// walk `refs/` and return the nested tree, in lexicographic order
/// within each directory
pub fn find_all(repo: &Repo) -> Result<BTreeMap<String, RefNode>> {
    let refs_dir = repo.gitdir().join("refs");
    let mut tree = BTreeMap::new();
    if refs_dir.is_dir() {
        collect(repo, &refs_dir, &mut tree)?;
    }
    Ok(tree)
}

fn collect(repo: &Repo, dir: &PathBuf, out: &mut BTreeMap<String, RefNode>) -> Result<()> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .with_path(dir)?
        .map(|e| e.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<std::io::Result<_>>()
        .with_path(dir)?;
    names.sort();

    for name in names {
        let path = dir.join(&name);
        if path.is_dir() {
            let mut subtree = BTreeMap::new();
            collect(repo, &path, &mut subtree)?;
            out.insert(name, RefNode::Tree(subtree));
        } else {
            let rel = path
                .strip_prefix(repo.gitdir())
                .unwrap_or(&path)
                .to_string_lossy()
                .into_owned();
            let oid = resolve(repo, &rel)?;
            out.insert(name, RefNode::Leaf(oid));
        }
    }
    Ok(())
}

/// find the first leaf named `name` in a depth-first, lexicographic walk
/// of the ref tree; stops at the first match and does not let a later
/// subtree overwrite it
pub fn find_by_leaf_name(repo: &Repo, name: &str) -> Result<Option<Oid>> {
    let tree = find_all(repo)?;
    Ok(search(&tree, name))
}

fn search(tree: &BTreeMap<String, RefNode>, name: &str) -> Option<Oid> {
    for (key, node) in tree {
        match node {
            RefNode::Leaf(oid) if key == name => return Some(*oid),
            RefNode::Leaf(_) => {}
            RefNode::Tree(subtree) => {
                if let Some(found) = search(subtree, name) {
                    return Some(found);
                }
            }
        }
    }
    None
}

/// write a lightweight tag at `refs/tags/<name>`
pub fn create_lightweight_tag(repo: &Repo, name: &str, oid: &Oid) -> Result<()> {
    write_direct(repo, &format!("refs/tags/{name}"), oid)
}

fn full_path(repo: &Repo, ref_path: &str) -> PathBuf {
    repo.gitdir().join(ref_path)
}

fn validate_ref_path(ref_path: &str) -> Result<()> {
    if ref_path.is_empty() {
        return Err(Error::InvalidRefName("empty ref path".into()));
    }
    if ref_path.starts_with('/') || ref_path.ends_with('/') {
        return Err(Error::InvalidRefName(ref_path.to_string()));
    }
    if ref_path.contains("//") || ref_path.contains('\0') {
        return Err(Error::InvalidRefName(ref_path.to_string()));
    }
    for component in ref_path.split('/') {
        if component == "." || component == ".." {
            return Err(Error::InvalidRefName(ref_path.to_string()));
        }
    }
    Ok(())
}
