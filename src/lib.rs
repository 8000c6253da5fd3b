//! gitrs-core - content-addressed object database and repository layout
//! for a git-like version control system.
//!
//! # Core concepts
//!
//! - **Object**: a blob, tree, commit, or tag, framed as
//!   `<kind> <size>\0<payload>` and stored zlib-compressed, addressed by
//!   the SHA-1 of its framed bytes.
//! - **Ref**: a named pointer under `refs/`, either direct (an oid) or
//!   symbolic (`ref: <other ref>`).
//! - **Index**: the staging area, a packed binary file listing tracked
//!   paths with stat metadata and the oid of their staged content.
//!
//! # Example usage
//!
//! ```no_run
//! use gitrs_core::{object, Object, Blob, Repo};
//! use std::path::Path;
//!
//! let repo = Repo::create(Path::new("/path/to/repo")).unwrap();
//! let oid = object::write(&repo, &Object::Blob(Blob::new(b"hello\n".to_vec())), false).unwrap();
//! let read_back = object::read(&repo, &oid).unwrap();
//! assert_eq!(read_back, Object::Blob(Blob::new(b"hello\n".to_vec())));
//! ```

mod config;
mod error;
mod kvlm;
mod layout;
mod oid;
mod repo;

pub mod index;
pub mod object;
pub mod refs;
pub mod resolve;

pub use config::Config;
pub use error::{Error, IoResultExt, Result};
pub use index::{Index, IndexEntry, IndexTreeEntry};
pub use object::{Blob, Commit, Kind, Object, Tag, Tree, TreeEntry};
pub use oid::Oid;
pub use refs::RefNode;
pub use repo::{Repo, RepoLock};
pub use resolve::object_find;
