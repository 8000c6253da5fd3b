//! the staging-area index, version 2: packed binary records with a
//! trailing checksum and an optional cached-tree extension.

use sha1::{Digest, Sha1};

use crate::error::{Error, IoResultExt, Result};
use crate::oid::Oid;
use crate::repo::Repo;

const MAGIC: &[u8; 4] = b"DIRC";
const VERSION: u32 = 2;
const ENTRY_HEADER_LEN: usize = 62;
const TREE_SIGNATURE: &[u8; 4] = b"TREE";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexEntry {
    pub ctime_s: u32,
    pub ctime_ns: u32,
    pub mtime_s: u32,
    pub mtime_ns: u32,
    pub dev: u32,
    pub ino: u32,
    pub mode_type: u8,
    pub mode_perm: u16,
    pub uid: u32,
    pub gid: u32,
    pub size: u32,
    pub oid: Oid,
    pub path: Vec<u8>,
}

impl IndexEntry {
    fn encoded_len(&self) -> usize {
        let unpadded = ENTRY_HEADER_LEN + self.path.len() + 1;
        unpadded.div_ceil(8) * 8
    }

    fn encode(&self, out: &mut Vec<u8>) {
        let start = out.len();
        out.extend_from_slice(&self.ctime_s.to_be_bytes());
        out.extend_from_slice(&self.ctime_ns.to_be_bytes());
        out.extend_from_slice(&self.mtime_s.to_be_bytes());
        out.extend_from_slice(&self.mtime_ns.to_be_bytes());
        out.extend_from_slice(&self.dev.to_be_bytes());
        out.extend_from_slice(&self.ino.to_be_bytes());

        let mode: u32 = ((self.mode_type as u32 & 0xF) << 12) | (self.mode_perm as u32 & 0x1FF);
        out.extend_from_slice(&mode.to_be_bytes());

        out.extend_from_slice(&self.uid.to_be_bytes());
        out.extend_from_slice(&self.gid.to_be_bytes());
        out.extend_from_slice(&self.size.to_be_bytes());
        out.extend_from_slice(self.oid.as_bytes());

        let name_len = (self.path.len() as u16).min(0xFFF);
        out.extend_from_slice(&name_len.to_be_bytes());
        out.extend_from_slice(&self.path);
        out.push(0);

        let padded = self.encoded_len();
        while out.len() - start < padded {
            out.push(0);
        }
    }

    fn decode(data: &[u8], offset: usize) -> Result<(Self, usize)> {
        if offset + ENTRY_HEADER_LEN > data.len() {
            return Err(Error::BadIndex("truncated entry header".into()));
        }
        let u32_at = |off: usize| -> u32 {
            u32::from_be_bytes(data[offset + off..offset + off + 4].try_into().unwrap())
        };

        let ctime_s = u32_at(0);
        let ctime_ns = u32_at(4);
        let mtime_s = u32_at(8);
        let mtime_ns = u32_at(12);
        let dev = u32_at(16);
        let ino = u32_at(20);
        let mode = u32_at(24);
        let mode_type = ((mode >> 12) & 0xF) as u8;
        let mode_perm = (mode & 0x1FF) as u16;
        let uid = u32_at(28);
        let gid = u32_at(32);
        let size = u32_at(36);

        let oid_start = offset + 40;
        let mut raw = [0u8; 20];
        raw.copy_from_slice(&data[oid_start..oid_start + 20]);
        let oid = Oid::from_raw(raw);

        let flags_start = offset + 60;
        let flags = u16::from_be_bytes(data[flags_start..flags_start + 2].try_into().unwrap());
        let name_len = (flags & 0xFFF) as usize;

        let name_start = offset + ENTRY_HEADER_LEN;
        let path_end = if name_len < 0xFFF {
            name_start + name_len
        } else {
            data[name_start..]
                .iter()
                .position(|&b| b == 0)
                .map(|p| p + name_start)
                .ok_or_else(|| Error::BadIndex("unterminated entry path".into()))?
        };
        if path_end >= data.len() {
            return Err(Error::BadIndex("truncated entry path".into()));
        }
        let path = data[name_start..path_end].to_vec();

        let unpadded = ENTRY_HEADER_LEN + path.len() + 1;
        let total = unpadded.div_ceil(8) * 8;

        let entry = IndexEntry {
            ctime_s,
            ctime_ns,
            mtime_s,
            mtime_ns,
            dev,
            ino,
            mode_type,
            mode_perm,
            uid,
            gid,
            size,
            oid,
            path,
        };
        Ok((entry, offset + total))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexTreeEntry {
    pub path: Vec<u8>,
    /// -1 means invalidated: no oid follows and the subtree must be
    /// recomputed before it can be reused
    pub entry_count: i32,
    pub subtree_count: u32,
    pub oid: Option<Oid>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Index {
    pub entries: Vec<IndexEntry>,
    pub cached_tree: Vec<IndexTreeEntry>,
}

impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    /// serialize header, entries (sorted by path), optional TREE
    /// extension, and the trailing SHA-1 checksum
    pub fn serialize(&self) -> Vec<u8> {
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| a.path.cmp(&b.path));

        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&VERSION.to_be_bytes());
        out.extend_from_slice(&(entries.len() as u32).to_be_bytes());

        for entry in &entries {
            entry.encode(&mut out);
        }

        if !self.cached_tree.is_empty() {
            let mut data = Vec::new();
            for node in &self.cached_tree {
                data.extend_from_slice(&node.path);
                data.push(0);
                data.extend_from_slice(node.entry_count.to_string().as_bytes());
                data.push(b' ');
                data.extend_from_slice(node.subtree_count.to_string().as_bytes());
                data.push(b'\n');
                if node.entry_count != -1 {
                    if let Some(oid) = &node.oid {
                        data.extend_from_slice(oid.as_bytes());
                    }
                }
            }
            out.extend_from_slice(TREE_SIGNATURE);
            out.extend_from_slice(&(data.len() as u32).to_be_bytes());
            out.extend_from_slice(&data);
        }

        let checksum = Sha1::digest(&out);
        out.extend_from_slice(&checksum);
        out
    }

    /// parse an index file, validating the magic, version, and trailing
    /// checksum
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        if data.len() < 12 + 20 {
            return Err(Error::BadIndex("file too short".into()));
        }
        if &data[0..4] != MAGIC {
            return Err(Error::BadIndex("bad magic".into()));
        }
        let version = u32::from_be_bytes(data[4..8].try_into().unwrap());
        if version != VERSION {
            return Err(Error::BadIndex(format!("unsupported index version {version}")));
        }
        let count = u32::from_be_bytes(data[8..12].try_into().unwrap()) as usize;

        let trailer_start = data.len() - 20;
        let expected: [u8; 20] = Sha1::digest(&data[..trailer_start]).into();
        if data[trailer_start..] != expected {
            return Err(Error::BadIndex("checksum mismatch".into()));
        }

        let mut entries = Vec::with_capacity(count);
        let mut offset = 12;
        for _ in 0..count {
            let (entry, next) = IndexEntry::decode(data, offset)?;
            entries.push(entry);
            offset = next;
        }

        let mut cached_tree = Vec::new();
        // the trailer occupies the final 20 bytes; extensions end exactly
        // where the trailer begins, so that boundary (not a parse
        // failure) is what terminates the loop.
        while offset < trailer_start {
            if offset + 8 > trailer_start {
                return Err(Error::BadIndex("truncated extension header".into()));
            }
            let signature = &data[offset..offset + 4];
            let size = u32::from_be_bytes(data[offset + 4..offset + 8].try_into().unwrap()) as usize;
            let body_start = offset + 8;
            let body_end = body_start + size;
            if body_end > trailer_start {
                return Err(Error::BadIndex("truncated extension body".into()));
            }
            if signature == TREE_SIGNATURE {
                cached_tree = parse_tree_extension(&data[body_start..body_end])?;
            }
            offset = body_end;
        }

        Ok(Index { entries, cached_tree })
    }
}

/// read and parse `gitdir/index`; an absent file is treated as an empty index
pub fn read(repo: &Repo) -> Result<Index> {
    let path = repo.gitdir().join("index");
    match std::fs::read(&path) {
        Ok(data) => Index::deserialize(&data),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Index::new()),
        Err(source) => Err(Error::Io { path, source }),
    }
}

/// serialize and write `gitdir/index`, via a tmp file renamed into place
pub fn write(repo: &Repo, index: &Index) -> Result<()> {
    let path = repo.gitdir().join("index");
    let bytes = index.serialize();

    let tmp_path = repo.tmp_path().join(uuid::Uuid::new_v4().to_string());
    std::fs::write(&tmp_path, &bytes).with_path(&tmp_path)?;
    std::fs::rename(&tmp_path, &path).with_path(&path)?;
    tracing::debug!(entries = index.entries.len(), "wrote index");

    Ok(())
}

fn parse_tree_extension(data: &[u8]) -> Result<Vec<IndexTreeEntry>> {
    let mut nodes = Vec::new();
    let mut i = 0;
    while i < data.len() {
        let nul = data[i..]
            .iter()
            .position(|&b| b == 0)
            .map(|p| p + i)
            .ok_or_else(|| Error::BadIndex("TREE extension: missing path terminator".into()))?;
        let path = data[i..nul].to_vec();

        let nl = data[nul + 1..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|p| p + nul + 1)
            .ok_or_else(|| Error::BadIndex("TREE extension: missing newline".into()))?;
        let line = std::str::from_utf8(&data[nul + 1..nl])
            .map_err(|_| Error::BadIndex("TREE extension: non-utf8 counts".into()))?;
        let mut parts = line.split(' ');
        let entry_count: i32 = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| Error::BadIndex("TREE extension: bad entry count".into()))?;
        let subtree_count: u32 = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| Error::BadIndex("TREE extension: bad subtree count".into()))?;

        let mut next = nl + 1;
        let oid = if entry_count == -1 {
            None
        } else {
            if next + 20 > data.len() {
                return Err(Error::BadIndex("TREE extension: truncated oid".into()));
            }
            let mut raw = [0u8; 20];
            raw.copy_from_slice(&data[next..next + 20]);
            next += 20;
            Some(Oid::from_raw(raw))
        };

        nodes.push(IndexTreeEntry {
            path,
            entry_count,
            subtree_count,
            oid,
        });
        i = next;
    }
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str) -> IndexEntry {
        IndexEntry {
            ctime_s: 1,
            ctime_ns: 0,
            mtime_s: 2,
            mtime_ns: 0,
            dev: 1,
            ino: 1,
            mode_type: 0b1000,
            mode_perm: 0o644,
            uid: 1000,
            gid: 1000,
            size: 42,
            oid: Oid::ZERO,
            path: path.as_bytes().to_vec(),
        }
    }

    #[test]
    fn round_trips_and_checksum_validates() {
        let index = Index {
            entries: vec![entry("b"), entry("a")],
            cached_tree: vec![],
        };
        let bytes = index.serialize();
        let parsed = Index::deserialize(&bytes).unwrap();

        let paths: Vec<_> = parsed.entries.iter().map(|e| e.path.clone()).collect();
        assert_eq!(paths, vec![b"a".to_vec(), b"b".to_vec()]);
    }

    #[test]
    fn entries_are_8_byte_aligned() {
        let index = Index {
            entries: vec![entry("short"), entry("a-somewhat-longer-path.txt")],
            cached_tree: vec![],
        };
        let bytes = index.serialize();

        let mut offset = 12;
        for _ in 0..2 {
            let (_entry, next) = IndexEntry::decode(&bytes, offset).unwrap();
            assert_eq!((next - offset) % 8, 0);
            offset = next;
        }
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = Index::new().serialize();
        bytes[0] = b'X';
        assert!(matches!(Index::deserialize(&bytes), Err(Error::BadIndex(_))));
    }

    #[test]
    fn rejects_corrupted_checksum() {
        let mut bytes = Index {
            entries: vec![entry("a")],
            cached_tree: vec![],
        }
        .serialize();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        assert!(matches!(Index::deserialize(&bytes), Err(Error::BadIndex(_))));
    }

    #[test]
    fn tree_extension_round_trips_including_invalidated_entries() {
        let index = Index {
            entries: vec![entry("a")],
            cached_tree: vec![
                IndexTreeEntry {
                    path: b"".to_vec(),
                    entry_count: 1,
                    subtree_count: 1,
                    oid: Some(Oid::from_raw([9u8; 20])),
                },
                IndexTreeEntry {
                    path: b"sub".to_vec(),
                    entry_count: -1,
                    subtree_count: 0,
                    oid: None,
                },
            ],
        };
        let bytes = index.serialize();
        let parsed = Index::deserialize(&bytes).unwrap();
        assert_eq!(parsed.cached_tree, index.cached_tree);
    }

    #[test]
    fn empty_index_round_trips() {
        let index = Index::new();
        let bytes = index.serialize();
        assert_eq!(bytes.len(), 12 + 20);
        let parsed = Index::deserialize(&bytes).unwrap();
        assert!(parsed.entries.is_empty());
    }

    #[test]
    fn write_then_read_round_trips_through_gitdir() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repo::create(&dir.path().join("r")).unwrap();

        let index = Index {
            entries: vec![entry("b"), entry("a")],
            cached_tree: vec![],
        };
        write(&repo, &index).unwrap();

        let parsed = read(&repo).unwrap();
        let paths: Vec<_> = parsed.entries.iter().map(|e| e.path.clone()).collect();
        assert_eq!(paths, vec![b"a".to_vec(), b"b".to_vec()]);
    }

    #[test]
    fn read_with_no_index_file_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repo::create(&dir.path().join("r")).unwrap();

        let index = read(&repo).unwrap();
        assert!(index.entries.is_empty());
    }
}
