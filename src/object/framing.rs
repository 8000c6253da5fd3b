//! the object envelope: `<kind> <size>\0<payload>`, zlib-compressed at rest.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{Error, IoResultExt, Result};
use crate::layout;
use crate::oid::Oid;
use crate::repo::Repo;

use super::{Kind, Object};

/// concatenate `<kind> <size>\0<payload>`
pub fn encode(kind: Kind, payload: &[u8]) -> Vec<u8> {
    let mut framed = Vec::with_capacity(payload.len() + 32);
    framed.extend_from_slice(kind.as_str().as_bytes());
    framed.push(b' ');
    framed.extend_from_slice(payload.len().to_string().as_bytes());
    framed.push(0);
    framed.extend_from_slice(payload);
    framed
}

/// split an envelope into its kind and payload, validating the declared
/// size against the actual payload length
pub fn decode_envelope(framed: &[u8]) -> Result<(Kind, &[u8])> {
    let space = framed
        .iter()
        .position(|&b| b == b' ')
        .ok_or_else(|| Error::MalformedObject("missing kind delimiter".into()))?;
    let kind = Kind::from_bytes(&framed[..space])?;

    let nul = framed
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| Error::MalformedObject("missing header terminator".into()))?;
    let size_str = std::str::from_utf8(&framed[space + 1..nul])
        .map_err(|_| Error::MalformedObject("non-utf8 size field".into()))?;
    let size: usize = size_str
        .parse()
        .map_err(|_| Error::MalformedObject(format!("bad size field: {size_str}")))?;

    let payload = &framed[nul + 1..];
    if payload.len() != size {
        return Err(Error::MalformedObject(format!(
            "size mismatch: header says {size}, payload is {}",
            payload.len()
        )));
    }

    Ok((kind, payload))
}

/// compute the oid of a fully framed object, without touching disk
pub fn hash(kind: Kind, payload: &[u8]) -> Oid {
    Oid::of(&encode(kind, payload))
}

/// write an object to the store, returning its oid.
///
/// writes are idempotent: identical content hashes to the same oid and
/// overwrites the same path with identical bytes. `dry_run` computes the
/// oid without touching disk (used by `hash-object` without `-w`).
pub fn write(repo: &Repo, object: &Object, dry_run: bool) -> Result<Oid> {
    let payload = object.payload();
    let framed = encode(object.kind(), &payload);
    let oid = Oid::of(&framed);

    if dry_run {
        return Ok(oid);
    }

    let path = layout::object_path(repo.gitdir(), &oid, true)?;
    if path.exists() {
        tracing::debug!(oid = %oid, "object already present");
        return Ok(oid);
    }

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&framed).with_path(&path)?;
    let compressed = encoder.finish().with_path(&path)?;

    let tmp_path = repo.tmp_path().join(uuid::Uuid::new_v4().to_string());
    std::fs::write(&tmp_path, &compressed).with_path(&tmp_path)?;
    std::fs::rename(&tmp_path, &path).with_path(&path)?;
    tracing::debug!(oid = %oid, kind = object.kind().as_str(), "wrote object");

    Ok(oid)
}

/// read and decode an object by its oid
pub fn read(repo: &Repo, oid: &Oid) -> Result<Object> {
    let path = layout::object_path(repo.gitdir(), oid, false)?;
    let compressed = std::fs::read(&path).with_path(&path)?;

    let mut decoder = ZlibDecoder::new(&compressed[..]);
    let mut framed = Vec::new();
    decoder.read_to_end(&mut framed).with_path(&path)?;

    let (kind, payload) = decode_envelope(&framed)?;
    Object::decode(kind, payload)
}
