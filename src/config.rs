use std::path::Path;

use crate::error::{Error, IoResultExt, Result};

/// parsed `[core]` section of the repository's `config` file
///
/// the grammar supported here is the small INI subset git itself uses for
/// this section: `[section]` headers and `key=value` lines. Includes,
/// conditional includes, and subsections are out of scope.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Config {
    pub repository_format_version: u32,
    pub filemode: bool,
    pub bare: bool,
}

impl Config {
    /// load and validate `core.repositoryformatversion == 0`
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_path(path)?;
        let config = Self::parse(&content)?;
        if config.repository_format_version != 0 {
            return Err(Error::UnsupportedFormat(config.repository_format_version));
        }
        Ok(config)
    }

    fn parse(content: &str) -> Result<Self> {
        let mut config = Config::default();
        let mut section = String::new();

        for raw_line in content.lines() {
            let line = raw_line.split(';').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('[') && line.ends_with(']') {
                section = line[1..line.len() - 1].trim().to_lowercase();
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(Error::Config(format!("malformed config line: {raw_line}")));
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            if section == "core" {
                match key.as_str() {
                    "repositoryformatversion" => {
                        config.repository_format_version = value
                            .parse()
                            .map_err(|_| Error::Config(format!("bad version: {value}")))?;
                    }
                    "filemode" => config.filemode = parse_bool(value)?,
                    "bare" => config.bare = parse_bool(value)?,
                    _ => {}
                }
            }
        }

        Ok(config)
    }

    /// serialize in the layout `create` writes at init time
    pub fn to_ini(&self) -> String {
        format!(
            "[core]\n\trepositoryformatversion = {}\n\tfilemode = {}\n\tbare = {}\n",
            self.repository_format_version, self.filemode, self.bare
        )
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_ini()).with_path(path)
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(Error::Config(format!("not a boolean: {other}"))),
    }
}
