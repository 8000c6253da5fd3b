//! key-value-list-with-message: the shared textual format backing commit
//! and tag payloads.
//!
//! Grammar: zero or more `key SP value LF` headers (continuation lines
//! begin with a single leading space, stripped on decode and re-inserted
//! on encode), followed by a blank line and an opaque message body. A key
//! may repeat; its logical value is the list of values in the order they
//! appeared.

use crate::error::{Error, Result};

/// an ordered key -> list-of-values mapping plus a message body
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Kvlm {
    entries: Vec<(Vec<u8>, Vec<Vec<u8>>)>,
    pub message: Vec<u8>,
}

impl Kvlm {
    pub fn new() -> Self {
        Self::default()
    }

    /// all values for `key`, in appearance order; empty if absent
    pub fn get(&self, key: &[u8]) -> &[Vec<u8>] {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
            .unwrap_or(&[])
    }

    /// the single value for `key`, if it has exactly one
    pub fn get_one(&self, key: &[u8]) -> Option<&[u8]> {
        match self.get(key) {
            [v] => Some(v.as_slice()),
            _ => None,
        }
    }

    /// append a value for `key`, creating the entry if it does not exist
    pub fn push(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        let key = key.into();
        if let Some((_, values)) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            values.push(value.into());
        } else {
            self.entries.push((key, vec![value.into()]));
        }
    }

    /// keys in first-appearance order, for callers that want to walk
    /// headers without knowing their names in advance
    #[allow(dead_code)]
    pub fn keys(&self) -> impl Iterator<Item = &[u8]> {
        self.entries.iter().map(|(k, _)| k.as_slice())
    }

    /// parse a KVLM document
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut kvlm = Kvlm::new();
        let mut i = 0usize;

        loop {
            if i >= data.len() {
                return Err(Error::MalformedObject(
                    "kvlm: missing blank line before message".into(),
                ));
            }
            if data[i] == b'\n' {
                kvlm.message = data[i + 1..].to_vec();
                return Ok(kvlm);
            }

            let space = find_byte(data, i, b' ').ok_or_else(|| {
                Error::MalformedObject("kvlm: header line missing space".into())
            })?;
            let key = data[i..space].to_vec();

            // scan forward for the newline that ends this (possibly folded) value:
            // a newline followed by a space is a continuation, not a terminator.
            let mut end = space + 1;
            loop {
                let nl = find_byte(data, end, b'\n').ok_or_else(|| {
                    Error::MalformedObject("kvlm: header value missing terminator".into())
                })?;
                if data.get(nl + 1) == Some(&b' ') {
                    end = nl + 1;
                } else {
                    end = nl;
                    break;
                }
            }

            let raw_value = &data[space + 1..end];
            let value = unfold(raw_value);
            kvlm.push(key, value);

            i = end + 1;
        }
    }

    /// serialize back to bytes; headers emitted in stored order, one
    /// physical line per value for multi-valued keys, folded on `\n`.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (key, values) in &self.entries {
            for value in values {
                out.extend_from_slice(key);
                out.push(b' ');
                out.extend_from_slice(&fold(value));
                out.push(b'\n');
            }
        }
        out.push(b'\n');
        out.extend_from_slice(&self.message);
        out
    }
}

fn find_byte(data: &[u8], from: usize, needle: u8) -> Option<usize> {
    data[from..].iter().position(|&b| b == needle).map(|p| p + from)
}

/// strip `\n `  continuation markers to produce the logical value
fn unfold(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'\n' && raw.get(i + 1) == Some(&b' ') {
            out.push(b'\n');
            i += 2;
        } else {
            out.push(raw[i]);
            i += 1;
        }
    }
    out
}

/// re-insert `\n ` continuation markers before each embedded newline
fn fold(value: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    for &b in value {
        out.push(b);
        if b == b'\n' {
            out.push(b' ');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_simple_commit() {
        let data = b"tree abc\nparent def\nauthor A <a@b> 0 +0000\n\nhello\n";
        let kvlm = Kvlm::parse(data).unwrap();
        assert_eq!(kvlm.get_one(b"tree"), Some(&b"abc"[..]));
        assert_eq!(kvlm.message, b"hello\n");
        assert_eq!(kvlm.serialize(), data);
    }

    #[test]
    fn duplicate_key_becomes_a_list() {
        let data = b"tree abc\nparent p1\nparent p2\n\nmsg";
        let kvlm = Kvlm::parse(data).unwrap();
        assert_eq!(kvlm.get(b"parent"), &[b"p1".to_vec(), b"p2".to_vec()]);
    }

    #[test]
    fn folded_continuation_unfolds() {
        let data = b"gpgsig line one\n line two\n line three\n\nmsg";
        let kvlm = Kvlm::parse(data).unwrap();
        assert_eq!(
            kvlm.get_one(b"gpgsig"),
            Some(&b"line one\nline two\nline three"[..])
        );
    }

    #[test]
    fn serialize_refolds_embedded_newlines() {
        let mut kvlm = Kvlm::new();
        kvlm.push("gpgsig", "line one\nline two".as_bytes());
        kvlm.message = b"m".to_vec();
        let out = kvlm.serialize();
        assert_eq!(out, b"gpgsig line one\n line two\n\nm");
    }

    #[test]
    fn empty_message_still_gets_trailing_blank_line() {
        let mut kvlm = Kvlm::new();
        kvlm.push("tree", "abc".as_bytes());
        let out = kvlm.serialize();
        assert_eq!(out, b"tree abc\n\n");
        assert_eq!(Kvlm::parse(&out).unwrap(), kvlm);
    }

    #[test]
    fn empty_header_value_is_legal() {
        let data = b"key \n\nmsg";
        let kvlm = Kvlm::parse(data).unwrap();
        assert_eq!(kvlm.get_one(b"key"), Some(&b""[..]));
    }

    #[test]
    fn message_may_contain_newlines() {
        let data = b"tree abc\n\nline one\nline two\n";
        let kvlm = Kvlm::parse(data).unwrap();
        assert_eq!(kvlm.message, b"line one\nline two\n");
        assert_eq!(kvlm.serialize(), data);
    }

    #[test]
    fn order_of_first_appearance_is_preserved() {
        let data = b"b 1\na 2\nb 3\n\nm";
        let kvlm = Kvlm::parse(data).unwrap();
        let keys: Vec<&[u8]> = kvlm.keys().collect();
        assert_eq!(keys, vec![&b"b"[..], &b"a"[..]]);
    }
}
