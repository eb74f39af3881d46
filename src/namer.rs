//! Output path naming for directory inputs.
//! A namer maps a path relative to the input directory to the path of the
//! file that will be written.

use crate::constants::OUTPUT_MAP_NAME;
use crate::error::{Error, Result};
use minijinja::Environment;
use std::path::{Component, Path, PathBuf};

/// Computes the output path for an input-relative path.
pub trait OutputNamer {
    fn name(&self, in_path: &Path) -> Result<PathBuf>;
}

/// Joins input paths onto a fixed output directory.
pub struct StaticNamer {
    output_dir: PathBuf,
}

impl StaticNamer {
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self { output_dir: output_dir.into() }
    }
}

impl OutputNamer for StaticNamer {
    fn name(&self, in_path: &Path) -> Result<PathBuf> {
        Ok(clean_path(self.output_dir.join(in_path)))
    }
}

/// Evaluates a user-supplied mapping template for every input path.
///
/// The template sees `in` (the input-relative path) and `ctx` (the outer
/// rendering context). Top-level keys of the outer context are also exposed
/// directly, except `in` and `ctx`.
pub struct TemplatedNamer {
    env: Environment<'static>,
    mapping: String,
    context: serde_json::Value,
}

impl TemplatedNamer {
    pub fn new<S: Into<String>>(
        env: Environment<'static>,
        mapping: S,
        context: serde_json::Value,
    ) -> Self {
        Self { env, mapping: mapping.into(), context }
    }

    fn mapping_context(&self, in_path: &str) -> serde_json::Value {
        let mut ctx = serde_json::Map::new();
        if let serde_json::Value::Object(outer) = &self.context {
            for (key, value) in outer {
                if key != "in" && key != "ctx" {
                    ctx.insert(key.clone(), value.clone());
                }
            }
        }
        ctx.insert("ctx".to_string(), self.context.clone());
        ctx.insert("in".to_string(), serde_json::Value::String(in_path.to_string()));
        serde_json::Value::Object(ctx)
    }
}

impl OutputNamer for TemplatedNamer {
    fn name(&self, in_path: &Path) -> Result<PathBuf> {
        let in_path = in_path.to_string_lossy();
        let ctx = self.mapping_context(&in_path);
        let rendered = self
            .env
            .render_named_str(OUTPUT_MAP_NAME, &self.mapping, &ctx)
            .map_err(|source| Error::NamingError {
                context: ctx.to_string(),
                in_path: in_path.to_string(),
                source,
            })?;
        Ok(clean_path(rendered.trim()))
    }
}

/// Lexically normalizes a path: drops `.` segments and resolves `..` against
/// preceding segments. Leading `..` segments of a relative path are kept.
pub fn clean_path<P: AsRef<Path>>(path: P) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();
    for component in path.as_ref().components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            _ => parts.push(component),
        }
    }
    if parts.is_empty() {
        return PathBuf::from(".");
    }
    parts.iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path("a/./b/../c"), PathBuf::from("a/c"));
        assert_eq!(clean_path("./a"), PathBuf::from("a"));
        assert_eq!(clean_path("../a/.."), PathBuf::from(".."));
        assert_eq!(clean_path("a/.."), PathBuf::from("."));
        assert_eq!(clean_path(""), PathBuf::from("."));
    }

    #[cfg(unix)]
    #[test]
    fn test_clean_absolute_path() {
        assert_eq!(clean_path("/../a//b/"), PathBuf::from("/a/b"));
        assert_eq!(clean_path("/out/./one/foo"), PathBuf::from("/out/one/foo"));
    }
}
