//! Data sources and the rendering context built from them.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use url::Url;

/// Provides values for context aliases.
pub trait DataSource {
    /// Fetches the value registered under `alias`.
    fn resolve(&mut self, alias: &str) -> Result<serde_json::Value>;

    /// Releases anything held open. Called once at the end of a run.
    fn cleanup(&mut self) {}
}

/// Location of a data source.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceUrl {
    /// A JSON or YAML file.
    File(PathBuf),
    /// A single environment variable.
    Env(String),
}

impl SourceUrl {
    /// Parses a data source location. Anything that is not a URL is taken as a
    /// file path.
    pub fn parse(s: &str) -> Result<Self> {
        let url = match Url::parse(s) {
            Ok(url) => url,
            // bare paths, and single-letter schemes which are drive letters
            Err(_) => return Ok(Self::File(PathBuf::from(s))),
        };
        match url.scheme() {
            "file" => url
                .to_file_path()
                .map(Self::File)
                .map_err(|_| Error::ConfigError(format!("invalid file URL '{s}'"))),
            "env" => {
                let name = url.path().trim_start_matches('/');
                if name.is_empty() {
                    return Err(Error::ConfigError(format!("missing variable name in '{s}'")));
                }
                Ok(Self::Env(name.to_string()))
            }
            scheme if scheme.len() == 1 => Ok(Self::File(PathBuf::from(s))),
            scheme => Err(Error::ConfigError(format!(
                "unsupported datasource scheme '{scheme}' in '{s}'"
            ))),
        }
    }
}

/// Data sources declared as `alias=url` pairs. Each one is read at most once.
#[derive(Debug, Default)]
pub struct Sources {
    sources: IndexMap<String, SourceUrl>,
    cache: HashMap<String, serde_json::Value>,
}

impl Sources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds sources from an alias to URL map.
    pub fn from_map(map: &IndexMap<String, String>) -> Result<Self> {
        let mut sources = Self::new();
        for (alias, url) in map {
            sources.add(alias, SourceUrl::parse(url)?);
        }
        Ok(sources)
    }

    pub fn add<S: Into<String>>(&mut self, alias: S, url: SourceUrl) {
        self.sources.insert(alias.into(), url);
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    fn read(alias: &str, url: &SourceUrl) -> Result<serde_json::Value> {
        let source_error = |reason: String| Error::DataSourceError {
            alias: alias.to_string(),
            reason,
        };
        match url {
            SourceUrl::File(path) => {
                let content = std::fs::read_to_string(path)
                    .map_err(|e| source_error(format!("{}: {}", path.display(), e)))?;
                if is_yaml(path) {
                    serde_yaml::from_str(&content).map_err(|e| source_error(e.to_string()))
                } else {
                    serde_json::from_str(&content).map_err(|e| source_error(e.to_string()))
                }
            }
            SourceUrl::Env(name) => std::env::var(name)
                .map(serde_json::Value::String)
                .map_err(|e| source_error(format!("{name}: {e}"))),
        }
    }
}

impl DataSource for Sources {
    fn resolve(&mut self, alias: &str) -> Result<serde_json::Value> {
        if let Some(value) = self.cache.get(alias) {
            return Ok(value.clone());
        }
        let url = self.sources.get(alias).ok_or_else(|| Error::DataSourceError {
            alias: alias.to_string(),
            reason: "undefined datasource".to_string(),
        })?;
        debug!("Reading datasource '{alias}' from {url:?}");
        let value = Self::read(alias, url)?;
        self.cache.insert(alias.to_string(), value.clone());
        Ok(value)
    }

    fn cleanup(&mut self) {
        self.cache.clear();
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some("yaml") | Some("yml"))
}

/// Builds the rendering context.
///
/// # Arguments
/// * `aliases` - Context aliases, each resolved once through `source`
/// * `source` - Provider of alias values
/// * `env` - Environment variables, exposed as the `Env` map
///
/// # Returns
/// * The value of alias `.` alone when it is present, otherwise an object with
///   `Env` and one key per alias
pub fn create_context<'a, I, E>(
    aliases: I,
    source: &mut dyn DataSource,
    env: E,
) -> Result<serde_json::Value>
where
    I: IntoIterator<Item = &'a str>,
    E: IntoIterator<Item = (String, String)>,
{
    let mut ctx = serde_json::Map::new();
    let env: serde_json::Map<String, serde_json::Value> =
        env.into_iter().map(|(k, v)| (k, serde_json::Value::String(v))).collect();
    ctx.insert("Env".to_string(), serde_json::Value::Object(env));

    for alias in aliases {
        if alias == "." {
            return source.resolve(alias);
        }
        ctx.insert(alias.to_string(), source.resolve(alias)?);
    }
    Ok(serde_json::Value::Object(ctx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source_url() {
        assert_eq!(
            SourceUrl::parse("data/config.json").unwrap(),
            SourceUrl::File(PathBuf::from("data/config.json"))
        );
        assert_eq!(SourceUrl::parse("env:HOME").unwrap(), SourceUrl::Env("HOME".to_string()));
        assert_eq!(
            SourceUrl::parse("env:///HOME").unwrap(),
            SourceUrl::Env("HOME".to_string())
        );
        assert!(SourceUrl::parse("http://example.com/data.json").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_parse_file_url() {
        assert_eq!(
            SourceUrl::parse("file:///tmp/data.yaml").unwrap(),
            SourceUrl::File(PathBuf::from("/tmp/data.yaml"))
        );
    }
}
