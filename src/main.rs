//! gitrs - thin plumbing CLI over gitrs_core

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use std::os::unix::fs::MetadataExt;

use gitrs_core::{index, object, refs, Blob, IndexEntry, Kind, Object, Repo, Result};

#[derive(Parser)]
#[command(name = "gitrs")]
#[command(about = "plumbing commands over a content-addressed object store")]
#[command(version)]
struct Cli {
    /// repository path
    #[arg(short, long, default_value = ".")]
    repo: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// initialize a new repository
    Init {
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// compute an object's oid, optionally writing it to the store
    HashObject {
        path: PathBuf,

        #[arg(short = 't', long = "type", default_value = "blob")]
        object_type: String,

        #[arg(short, long)]
        write: bool,
    },

    /// print the contents of an object
    CatFile {
        object_type: String,
        object: String,
    },

    /// list the entries of a tree
    LsTree {
        tree_ish: String,

        #[arg(short, long)]
        recursive: bool,
    },

    /// walk first-parent history from a commit
    Log {
        #[arg(default_value = "HEAD")]
        commit_ish: String,

        #[arg(short = 'n', long)]
        max_count: Option<usize>,
    },

    /// resolve a name to an oid
    RevParse {
        name: String,
    },

    /// list every ref and the oid it resolves to
    ShowRef,

    /// create a lightweight tag, or list tags if no name is given
    Tag {
        name: Option<String>,
        object: Option<String>,
    },

    /// stage a path's current content, replacing any existing entry for it
    UpdateIndex {
        path: PathBuf,
    },

    /// list paths tracked in the index
    LsFiles,
}

fn main() -> ExitCode {
    #[cfg(feature = "cli")]
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { path } => {
            Repo::create(&path)?;
            println!("initialized repository at {}", path.display());
        }

        Commands::HashObject { path, object_type, write } => {
            let repo = Repo::find(&cli.repo)?;
            let kind = Kind::from_bytes(object_type.as_bytes())?;
            let data = std::fs::read(&path).map_err(|source| gitrs_core::Error::Io {
                path: path.clone(),
                source,
            })?;
            let object = decode_for_kind(kind, data)?;
            let oid = object::write(&repo, &object, !write)?;
            println!("{oid}");
        }

        Commands::CatFile { object_type, object: name } => {
            let repo = Repo::find(&cli.repo)?;
            let want = Kind::from_bytes(object_type.as_bytes())?;
            let oid = gitrs_core::object_find(&repo, &name, Some(want))?;
            let object = object::read(&repo, &oid)?;
            print_object(&object);
        }

        Commands::LsTree { tree_ish, recursive } => {
            let repo = Repo::find(&cli.repo)?;
            let oid = gitrs_core::object_find(&repo, &tree_ish, Some(Kind::Tree))?;
            print_tree(&repo, &oid, recursive, b"")?;
        }

        Commands::Log { commit_ish, max_count } => {
            let repo = Repo::find(&cli.repo)?;
            let mut oid = gitrs_core::object_find(&repo, &commit_ish, Some(Kind::Commit))?;
            let mut shown = 0;
            loop {
                if let Some(max) = max_count {
                    if shown >= max {
                        break;
                    }
                }
                let Object::Commit(commit) = object::read(&repo, &oid)? else {
                    break;
                };
                println!("commit {oid}");
                println!("    {}", String::from_utf8_lossy(commit.headline()));
                shown += 1;

                match commit.parents()?.first() {
                    Some(parent) => oid = *parent,
                    None => break,
                }
            }
        }

        Commands::RevParse { name } => {
            let repo = Repo::find(&cli.repo)?;
            let oid = gitrs_core::object_find(&repo, &name, None)?;
            println!("{oid}");
        }

        Commands::ShowRef => {
            let repo = Repo::find(&cli.repo)?;
            let tree = refs::find_all(&repo)?;
            print_refs(&tree, "refs");
        }

        Commands::Tag { name, object } => {
            let repo = Repo::find(&cli.repo)?;
            match (name, object) {
                (Some(name), Some(object_name)) => {
                    let oid = gitrs_core::object_find(&repo, &object_name, None)?;
                    refs::create_lightweight_tag(&repo, &name, &oid)?;
                }
                (Some(name), None) => {
                    let oid = gitrs_core::object_find(&repo, "HEAD", None)?;
                    refs::create_lightweight_tag(&repo, &name, &oid)?;
                }
                _ => {
                    let tree = refs::find_all(&repo)?;
                    if let Some(gitrs_core::RefNode::Tree(tags)) = tree.get("tags") {
                        for name in tags.keys() {
                            println!("{name}");
                        }
                    }
                }
            }
        }

        Commands::UpdateIndex { path } => {
            let repo = Repo::find(&cli.repo)?;
            let data = std::fs::read(&path).map_err(|source| gitrs_core::Error::Io {
                path: path.clone(),
                source,
            })?;
            let oid = object::write(&repo, &Object::Blob(Blob::new(data)), false)?;
            let metadata = std::fs::metadata(&path).map_err(|source| gitrs_core::Error::Io {
                path: path.clone(),
                source,
            })?;

            let relative = path
                .strip_prefix(repo.worktree())
                .unwrap_or(&path)
                .to_string_lossy()
                .into_owned()
                .into_bytes();

            let mut staged = index::read(&repo)?;
            staged.entries.retain(|e| e.path != relative);
            staged.entries.push(IndexEntry {
                ctime_s: metadata.ctime() as u32,
                ctime_ns: metadata.ctime_nsec() as u32,
                mtime_s: metadata.mtime() as u32,
                mtime_ns: metadata.mtime_nsec() as u32,
                dev: metadata.dev() as u32,
                ino: metadata.ino() as u32,
                mode_type: ((metadata.mode() >> 12) & 0xF) as u8,
                mode_perm: (metadata.mode() & 0x1FF) as u16,
                uid: metadata.uid(),
                gid: metadata.gid(),
                size: metadata.size() as u32,
                oid,
                path: relative,
            });
            index::write(&repo, &staged)?;
            println!("staged {} as {oid}", path.display());
        }

        Commands::LsFiles => {
            let repo = Repo::find(&cli.repo)?;
            let index = index::read(&repo)?;
            for entry in &index.entries {
                println!("{}", String::from_utf8_lossy(&entry.path));
            }
        }
    }

    Ok(())
}

fn decode_for_kind(kind: Kind, data: Vec<u8>) -> Result<Object> {
    Object::decode(kind, &data)
}

fn print_object(object: &Object) {
    match object {
        Object::Blob(blob) => {
            io::stdout().write_all(&blob.data).ok();
        }
        Object::Tree(tree) => {
            for entry in &tree.entries {
                println!(
                    "{} {}",
                    String::from_utf8_lossy(&entry.mode),
                    String::from_utf8_lossy(&entry.path)
                );
            }
        }
        Object::Commit(commit) => {
            io::stdout().write_all(&commit.serialize()).ok();
        }
        Object::Tag(tag) => {
            io::stdout().write_all(&tag.serialize()).ok();
        }
    }
}

fn print_tree(repo: &Repo, oid: &gitrs_core::Oid, recursive: bool, prefix: &[u8]) -> Result<()> {
    let Object::Tree(tree) = object::read(repo, oid)? else {
        return Err(gitrs_core::Error::TypeMismatch(*oid, "?", "tree"));
    };
    for entry in &tree.entries {
        let mut full_path = prefix.to_vec();
        full_path.extend_from_slice(&entry.path);

        if recursive && entry.is_tree() {
            print_tree(repo, &entry.oid, recursive, {
                full_path.push(b'/');
                &full_path
            })?;
        } else {
            println!(
                "{} {} {}",
                String::from_utf8_lossy(&entry.mode),
                entry.oid,
                String::from_utf8_lossy(&full_path)
            );
        }
    }
    Ok(())
}

fn print_refs(tree: &std::collections::BTreeMap<String, gitrs_core::RefNode>, prefix: &str) {
    for (name, node) in tree {
        match node {
            gitrs_core::RefNode::Leaf(oid) => println!("{oid} {prefix}/{name}"),
            gitrs_core::RefNode::Tree(subtree) => {
                print_refs(subtree, &format!("{prefix}/{name}"));
            }
        }
    }
}
