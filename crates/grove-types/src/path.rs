//! Repository-relative paths.
//!
//! A [`RepoPath`] always uses `/` as separator, whatever the host platform,
//! and is validated on construction:
//! - Must be non-empty
//! - Must not start or end with `/`
//! - Components must be non-empty and must not be `.` or `..`
//! - Must not contain `\` or NUL

use std::borrow::Borrow;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A validated, `/`-separated path relative to the repository root.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoPath(String);

impl RepoPath {
    /// Validate and wrap a `/`-separated path.
    pub fn new(path: impl Into<String>) -> Result<Self, TypeError> {
        let path = path.into();
        validate(&path)?;
        Ok(Self(path))
    }

    /// Build a repo path from a host path below `root`.
    ///
    /// Host separators are normalized to `/`.
    pub fn from_host(root: &Path, path: &Path) -> Result<Self, TypeError> {
        let relative = path.strip_prefix(root).map_err(|_| TypeError::InvalidPath {
            path: path.display().to_string(),
            reason: format!("not below {}", root.display()),
        })?;

        let mut parts = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    let part = part.to_str().ok_or_else(|| TypeError::InvalidPath {
                        path: relative.display().to_string(),
                        reason: "not valid UTF-8".into(),
                    })?;
                    parts.push(part);
                }
                Component::CurDir => {}
                other => {
                    return Err(TypeError::InvalidPath {
                        path: relative.display().to_string(),
                        reason: format!("unsupported component {other:?}"),
                    })
                }
            }
        }
        Self::new(parts.join("/"))
    }

    /// Join a single component onto this path.
    pub fn join(&self, name: &str) -> Result<Self, TypeError> {
        Self::new(format!("{}/{}", self.0, name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The last component.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// The containing directory, or `None` for top-level paths.
    pub fn parent(&self) -> Option<RepoPath> {
        self.0
            .rsplit_once('/')
            .map(|(parent, _)| RepoPath(parent.to_string()))
    }

    /// Iterate over the `/`-separated components.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Whether `self` lies strictly below the directory `dir`.
    pub fn starts_with_dir(&self, dir: &RepoPath) -> bool {
        self.0.len() > dir.0.len()
            && self.0.starts_with(dir.0.as_str())
            && self.0.as_bytes()[dir.0.len()] == b'/'
    }

    /// Resolve against a host root directory.
    pub fn to_host(&self, root: &Path) -> PathBuf {
        let mut out = root.to_path_buf();
        out.extend(self.components());
        out
    }
}

fn validate(path: &str) -> Result<(), TypeError> {
    let fail = |reason: &str| {
        Err(TypeError::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        })
    };

    if path.is_empty() {
        return fail("path must not be empty");
    }
    if path.starts_with('/') || path.ends_with('/') {
        return fail("must not start or end with '/'");
    }
    if path.contains('\\') || path.contains('\0') {
        return fail("must not contain '\\' or NUL");
    }
    for component in path.split('/') {
        match component {
            "" => return fail("components must not be empty"),
            "." | ".." => return fail("components must not be '.' or '..'"),
            _ => {}
        }
    }
    Ok(())
}

impl fmt::Debug for RepoPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RepoPath({:?})", self.0)
    }
}

impl fmt::Display for RepoPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RepoPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for RepoPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RepoPath {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for RepoPath {
    type Error = TypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RepoPath> for String {
    fn from(path: RepoPath) -> Self {
        path.0
    }
}
