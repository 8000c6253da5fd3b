//! trees: ordered sequences of (mode, path, oid) entries.

use crate::error::{Error, Result};
use crate::oid::Oid;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeEntry {
    /// ASCII octal mode string, e.g. `100644` or `40000`
    pub mode: Vec<u8>,
    pub path: Vec<u8>,
    pub oid: Oid,
}

impl TreeEntry {
    pub fn new(mode: impl Into<Vec<u8>>, path: impl Into<Vec<u8>>, oid: Oid) -> Self {
        Self {
            mode: mode.into(),
            path: path.into(),
            oid,
        }
    }

    /// directory entries are the modes beginning with the octal prefix `4`
    pub fn is_tree(&self) -> bool {
        self.mode.starts_with(b"40")
    }

    /// sort key used by canonical ordering: directory entries sort as if
    /// their name ended with `/`
    fn sort_key(&self) -> Vec<u8> {
        let mut key = self.path.clone();
        if self.is_tree() {
            key.push(b'/');
        }
        key
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tree {
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    pub fn new(entries: Vec<TreeEntry>) -> Self {
        Self { entries }
    }

    /// sort entries into canonical order, as required before an entry
    /// list is written to produce a reproducible oid
    pub fn sort_canonical(&mut self) {
        self.entries.sort_by_key(|e| e.sort_key());
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for entry in &self.entries {
            out.extend_from_slice(&entry.mode);
            out.push(b' ');
            out.extend_from_slice(&entry.path);
            out.push(0);
            out.extend_from_slice(entry.oid.as_bytes());
        }
        out
    }

    pub fn deserialize(payload: &[u8]) -> Result<Self> {
        let mut entries = Vec::new();
        let mut i = 0usize;

        while i < payload.len() {
            let space = payload[i..]
                .iter()
                .position(|&b| b == b' ')
                .map(|p| p + i)
                .ok_or_else(|| Error::MalformedObject("tree: missing mode delimiter".into()))?;
            let mode = payload[i..space].to_vec();

            let nul = payload[space + 1..]
                .iter()
                .position(|&b| b == 0)
                .map(|p| p + space + 1)
                .ok_or_else(|| Error::MalformedObject("tree: missing path terminator".into()))?;
            let path = payload[space + 1..nul].to_vec();

            let oid_start = nul + 1;
            let oid_end = oid_start + 20;
            if oid_end > payload.len() {
                return Err(Error::MalformedObject("tree: truncated oid".into()));
            }
            let mut raw = [0u8; 20];
            raw.copy_from_slice(&payload[oid_start..oid_end]);

            entries.push(TreeEntry::new(mode, path, Oid::from_raw(raw)));
            i = oid_end;
        }

        Ok(Tree { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tree_has_known_oid() {
        use crate::object::framing;
        use crate::object::Kind;

        let tree = Tree::default();
        let oid = framing::hash(Kind::Tree, &tree.serialize());
        assert_eq!(oid.to_hex(), "4b825dc642cb6eb9a060e54bf8d69288fbee4904");
    }

    #[test]
    fn round_trips_entries() {
        let tree = Tree::new(vec![
            TreeEntry::new("100644", "a.txt", Oid::ZERO),
            TreeEntry::new("40000", "sub", Oid::from_raw([1u8; 20])),
        ]);
        let parsed = Tree::deserialize(&tree.serialize()).unwrap();
        assert_eq!(parsed, tree);
    }

    #[test]
    fn canonical_sort_treats_directories_as_slash_suffixed() {
        // "b" as a file sorts before "b" as a directory would if compared
        // without the slash convention, since '.' < '/' lexically but a
        // plain file named "b.txt" must sort before directory "b".
        let mut tree = Tree::new(vec![
            TreeEntry::new("40000", "b", Oid::ZERO),
            TreeEntry::new("100644", "b.txt", Oid::ZERO),
        ]);
        tree.sort_canonical();
        let names: Vec<_> = tree.entries.iter().map(|e| e.path.clone()).collect();
        assert_eq!(names, vec![b"b.txt".to_vec(), b"b".to_vec()]);
    }

    #[test]
    fn same_entries_produce_same_oid_regardless_of_input_order() {
        use crate::object::framing;
        use crate::object::Kind;

        let mut t1 = Tree::new(vec![
            TreeEntry::new("100644", "z", Oid::ZERO),
            TreeEntry::new("100644", "a", Oid::ZERO),
        ]);
        let mut t2 = Tree::new(vec![
            TreeEntry::new("100644", "a", Oid::ZERO),
            TreeEntry::new("100644", "z", Oid::ZERO),
        ]);
        t1.sort_canonical();
        t2.sort_canonical();

        let h1 = framing::hash(Kind::Tree, &t1.serialize());
        let h2 = framing::hash(Kind::Tree, &t2.serialize());
        assert_eq!(h1, h2);
    }

    #[test]
    fn rejects_truncated_oid() {
        let mut payload = Vec::new();
        payload.extend_from_slice(b"100644 a\0");
        payload.extend_from_slice(&[0u8; 10]); // too short
        assert!(Tree::deserialize(&payload).is_err());
    }
}
