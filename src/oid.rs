use std::fmt;

use sha1::{Digest, Sha1};

use crate::error::{Error, Result};

/// a SHA-1 content fingerprint, the address of an object in the store
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Oid([u8; 20]);

impl Oid {
    /// all-zero oid, used as a sentinel
    pub const ZERO: Oid = Oid([0u8; 20]);

    /// hash of the empty tree, useful as a fixture
    pub fn of(bytes: &[u8]) -> Self {
        let digest = Sha1::digest(bytes);
        let mut raw = [0u8; 20];
        raw.copy_from_slice(&digest);
        Self(raw)
    }

    /// wrap raw 20-byte digest bytes, as read from a tree entry or index record
    pub fn from_raw(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// parse a 40-character lowercase or uppercase hex string
    pub fn from_hex(s: &str) -> Result<Self> {
        if s.len() != 40 {
            return Err(Error::BadOidHex(s.to_string()));
        }
        let bytes = hex::decode(s).map_err(|_| Error::BadOidHex(s.to_string()))?;
        let mut raw = [0u8; 20];
        raw.copy_from_slice(&bytes);
        Ok(Self(raw))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// (shard, rest) path components under `objects/`
    pub fn to_path_components(&self) -> (String, String) {
        let hex = self.to_hex();
        (hex[..2].to_string(), hex[2..].to_string())
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", &self.to_hex()[..12])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip() {
        let original = Oid::from_hex("ce013625030ba8dba906f756967f9e9ca394464a").unwrap();
        assert_eq!(original.to_hex(), "ce013625030ba8dba906f756967f9e9ca394464a");
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(Oid::from_hex("abcd").is_err());
        assert!(Oid::from_hex(&"ab".repeat(21)).is_err());
    }

    #[test]
    fn path_components() {
        let oid = Oid::from_hex("ce013625030ba8dba906f756967f9e9ca394464a").unwrap();
        let (dir, file) = oid.to_path_components();
        assert_eq!(dir, "ce");
        assert_eq!(file, "013625030ba8dba906f756967f9e9ca394464a");
    }

    #[test]
    fn of_matches_known_blob_fixture() {
        let framed = b"blob 6\0hello\n";
        assert_eq!(
            Oid::of(framed).to_hex(),
            "ce013625030ba8dba906f756967f9e9ca394464a"
        );
    }
}
