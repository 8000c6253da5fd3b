//! annotated tags: same shape as a commit, pointing at an arbitrary
//! target object via the `object`/`type` headers.

use crate::error::{Error, Result};
use crate::kvlm::Kvlm;
use crate::oid::Oid;

use super::Kind;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tag {
    kvlm: Kvlm,
}

impl Tag {
    pub fn new(
        target: Oid,
        target_kind: Kind,
        tag_name: &str,
        extra_headers: &[(&str, &[u8])],
        message: Vec<u8>,
    ) -> Self {
        let mut kvlm = Kvlm::new();
        kvlm.push("object", target.to_hex());
        kvlm.push("type", target_kind.as_str());
        kvlm.push("tag", tag_name);
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
        if kvlm.get_one(b"object").is_none() || kvlm.get_one(b"type").is_none() {
            return Err(Error::MalformedObject(
                "tag missing object/type header".into(),
            ));
        }
        Ok(Self { kvlm })
    }

    /// the oid of the tag's immediate target (not yet peeled)
    pub fn target(&self) -> Result<Oid> {
        let hex = self
            .kvlm
            .get_one(b"object")
            .ok_or_else(|| Error::MalformedObject("tag missing object header".into()))?;
        Oid::from_hex(std::str::from_utf8(hex).unwrap_or_default())
    }

    pub fn target_kind(&self) -> Result<Kind> {
        let raw = self
            .kvlm
            .get_one(b"type")
            .ok_or_else(|| Error::MalformedObject("tag missing type header".into()))?;
        Kind::from_bytes(raw)
    }

    pub fn name(&self) -> Option<&[u8]> {
        self.kvlm.get_one(b"tag")
    }

    pub fn message(&self) -> &[u8] {
        &self.kvlm.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_target_and_kind() {
        let target = Oid::from_raw([9u8; 20]);
        let tag = Tag::new(target, Kind::Commit, "v1.0", &[], b"release\n".to_vec());

        let parsed = Tag::deserialize(&tag.serialize()).unwrap();
        assert_eq!(parsed.target().unwrap(), target);
        assert_eq!(parsed.target_kind().unwrap(), Kind::Commit);
        assert_eq!(parsed.name(), Some(&b"v1.0"[..]));
    }

    #[test]
    fn rejects_missing_headers() {
        let payload = b"tag v1\n\nmsg";
        assert!(Tag::deserialize(payload).is_err());
    }
}
