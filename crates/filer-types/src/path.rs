use std::fmt;

use serde::{Deserialize, Serialize};

use crate::result::{Result, make_error_msg};
use crate::status_code::MetaCode;

pub const MAX_NAME_LEN: usize = 255;

/// An absolute, slash-separated namespace path.
///
/// Always starts with `/`, never ends with `/` (except the root itself) and
/// never contains empty, `.` or `..` components.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FullPath(String);

impl FullPath {
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Parse and normalise a path. Repeated and trailing slashes are dropped.
    pub fn new(path: &str) -> Result<Self> {
        if !path.starts_with('/') {
            return make_error_msg(MetaCode::INVALID_PATH, format!("not absolute: {path:?}"));
        }
        let mut normalized = String::with_capacity(path.len());
        for component in path.split('/').filter(|c| !c.is_empty()) {
            validate_name(component)?;
            normalized.push('/');
            normalized.push_str(component);
        }
        if normalized.is_empty() {
            normalized.push('/');
        }
        Ok(Self(normalized))
    }

    /// Join a directory path and a single child name.
    pub fn from_dir_and_name(dir: &str, name: &str) -> Result<Self> {
        validate_name(name)?;
        Self::new(dir)?.child(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Split into the parent directory and the base name. The root splits
    /// into `("/", "")`.
    pub fn dir_and_name(&self) -> (&str, &str) {
        if self.is_root() {
            return ("/", "");
        }
        // Normalised non-root paths always contain a leading slash.
        let idx = self.0.rfind('/').unwrap_or(0);
        let dir = if idx == 0 { "/" } else { &self.0[..idx] };
        (dir, &self.0[idx + 1..])
    }

    pub fn name(&self) -> &str {
        self.dir_and_name().1
    }

    pub fn parent(&self) -> Option<FullPath> {
        if self.is_root() {
            None
        } else {
            Some(Self(self.dir_and_name().0.to_string()))
        }
    }

    pub fn child(&self, name: &str) -> Result<FullPath> {
        validate_name(name)?;
        if self.is_root() {
            Ok(Self(format!("/{name}")))
        } else {
            Ok(Self(format!("{}/{name}", self.0)))
        }
    }

    /// Proper ancestors from the top down, excluding the root.
    /// `/a/b/c` yields `/a`, `/a/b`.
    pub fn ancestors(&self) -> Vec<FullPath> {
        let mut out = Vec::new();
        let mut cur = self.parent();
        while let Some(p) = cur {
            if p.is_root() {
                break;
            }
            cur = p.parent();
            out.push(p);
        }
        out.reverse();
        out
    }
}

/// Reject names that cannot be a single path component.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." {
        return make_error_msg(MetaCode::INVALID_PATH, format!("invalid name {name:?}"));
    }
    if name.contains('/') || name.contains('\0') {
        return make_error_msg(MetaCode::INVALID_PATH, format!("invalid name {name:?}"));
    }
    if name.len() > MAX_NAME_LEN {
        return make_error_msg(MetaCode::NAME_TOO_LONG, format!("{} bytes", name.len()));
    }
    Ok(())
}

impl fmt::Debug for FullPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FullPath({})", self.0)
    }
}

impl fmt::Display for FullPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for FullPath {
    type Error = crate::Status;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<FullPath> for String {
    fn from(p: FullPath) -> Self {
        p.0
    }
}

impl AsRef<str> for FullPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
