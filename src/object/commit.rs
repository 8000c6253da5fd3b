//! commits: a KVLM document requiring a single `tree` header and zero or
//! more `parent` headers.

use crate::error::{Error, Result};
use crate::kvlm::Kvlm;
use crate::oid::Oid;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commit {
    kvlm: Kvlm,
}

impl Commit {
    /// build a commit from its parts; `extra_headers` lets callers add
    /// `author`/`committer`/`gpgsig` etc. in the order given
    pub fn new(
        tree: Oid,
        parents: &[Oid],
        extra_headers: &[(&str, &[u8])],
        message: Vec<u8>,
    ) -> Self {
        let mut kvlm = Kvlm::new();
        kvlm.push("tree", tree.to_hex());
        for parent in parents {
            kvlm.push("parent", parent.to_hex());
        }
        for (key, value) in extra_headers {
            kvlm.push(*key, value.to_vec());
        }
        kvlm.message = message;
        Self { kvlm }
    }

    pub fn serialize(&self) -> Vec<u8> {
        self.kvlm.serialize()
    }

    pub fn deserialize(payload: &[u8]) -> Result<Self> {
        let kvlm = Kvlm::parse(payload)?;
        if kvlm.get_one(b"tree").is_none() {
            return Err(Error::MalformedObject("commit missing tree header".into()));
        }
        Ok(Self { kvlm })
    }

    pub fn tree(&self) -> Result<Oid> {
        let hex = self
            .kvlm
            .get_one(b"tree")
            .ok_or_else(|| Error::MalformedObject("commit missing tree header".into()))?;
        Oid::from_hex(std::str::from_utf8(hex).unwrap_or_default())
    }

    /// parent oids, in header-appearance order
    pub fn parents(&self) -> Result<Vec<Oid>> {
        self.kvlm
            .get(b"parent")
            .iter()
            .map(|hex| Oid::from_hex(std::str::from_utf8(hex).unwrap_or_default()))
            .collect()
    }

    pub fn header(&self, key: &[u8]) -> &[Vec<u8>] {
        self.kvlm.get(key)
    }

    pub fn message(&self) -> &[u8] {
        &self.kvlm.message
    }

    /// message bytes up to (not including) the first newline
    pub fn headline(&self) -> &[u8] {
        match self.kvlm.message.iter().position(|&b| b == b'\n') {
            Some(idx) => &self.kvlm.message[..idx],
            None => &self.kvlm.message,
        }
    }
}
