pub mod blob;
pub mod commit;
pub mod framing;
pub mod tag;
pub mod tree;

pub use blob::Blob;
pub use commit::Commit;
pub use framing::{read, write};
pub use tag::Tag;
pub use tree::{Tree, TreeEntry};

use crate::error::{Error, Result};

/// the four object kinds the store understands
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Blob => "blob",
            Kind::Tree => "tree",
            Kind::Commit => "commit",
            Kind::Tag => "tag",
        }
    }

    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        match raw {
            b"blob" => Ok(Kind::Blob),
            b"tree" => Ok(Kind::Tree),
            b"commit" => Ok(Kind::Commit),
            b"tag" => Ok(Kind::Tag),
            other => Err(Error::UnknownKind(String::from_utf8_lossy(other).into_owned())),
        }
    }
}

/// a tagged object value read from, or to be written to, the store
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Object {
    Blob(Blob),
    Tree(Tree),
    Commit(Commit),
    Tag(Tag),
}

impl Object {
    pub fn kind(&self) -> Kind {
        match self {
            Object::Blob(_) => Kind::Blob,
            Object::Tree(_) => Kind::Tree,
            Object::Commit(_) => Kind::Commit,
            Object::Tag(_) => Kind::Tag,
        }
    }

    pub fn payload(&self) -> Vec<u8> {
        match self {
            Object::Blob(b) => b.serialize(),
            Object::Tree(t) => t.serialize(),
            Object::Commit(c) => c.serialize(),
            Object::Tag(t) => t.serialize(),
        }
    }

    pub fn decode(kind: Kind, payload: &[u8]) -> Result<Self> {
        Ok(match kind {
            Kind::Blob => Object::Blob(Blob::deserialize(payload)),
            Kind::Tree => Object::Tree(Tree::deserialize(payload)?),
            Kind::Commit => Object::Commit(Commit::deserialize(payload)?),
            Kind::Tag => Object::Tag(Tag::deserialize(payload)?),
        })
    }

    pub fn as_commit(&self) -> Option<&Commit> {
        match self {
            Object::Commit(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_tree(&self) -> Option<&Tree> {
        match self {
            Object::Tree(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_tag(&self) -> Option<&Tag> {
        match self {
            Object::Tag(t) => Some(t),
            _ => None,
        }
    }
}
