//! Virtual asset-store paths.
//!
//! Store paths are forward-slash, absolute, and usually live under the
//! `/Game/...` namespace. They never refer to the local filesystem.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ModelError, ModelResult};

/// Absolute, normalized path inside the asset store.
///
/// Normalization collapses repeated separators, converts `\` to `/`, and
/// drops trailing separators, so `"/Game/FacialCapture/"` and
/// `"/Game//FacialCapture"` name the same location.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(try_from = "String", into = "String")]
pub struct AssetPath(String);

impl AssetPath {
    /// Parse and normalize a store path.
    pub fn new(path: impl AsRef<str>) -> ModelResult<Self> {
        let raw = path.as_ref();
        let unified = raw.replace('\\', "/");
        if !unified.starts_with('/') {
            return Err(ModelError::InvalidAssetPath(raw.to_string()));
        }

        let segments: Vec<&str> = unified.split('/').filter(|s| !s.is_empty()).collect();
        Ok(Self(format!("/{}", segments.join("/"))))
    }

    /// Append one or more segments.
    ///
    /// `segment` may itself contain separators or a trailing slash
    /// (`"Fretlyn_CaptureSource_Ingested/"`).
    pub fn join(&self, segment: &str) -> Self {
        let unified = segment.replace('\\', "/");
        let mut out = self.0.clone();
        for part in unified.split('/').filter(|s| !s.is_empty()) {
            if !out.ends_with('/') {
                out.push('/');
            }
            out.push_str(part);
        }
        Self(out)
    }

    /// Asset name: the final segment with any `.Object` suffix removed.
    pub fn name(&self) -> &str {
        let last = self.0.rsplit('/').next().unwrap_or_default();
        match last.split_once('.') {
            Some((name, _)) => name,
            None => last,
        }
    }

    /// Location containing this asset, `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.0 == "/" {
            return None;
        }
        let idx = self.0.rfind('/')?;
        if idx == 0 {
            Some(Self("/".to_string()))
        } else {
            Some(Self(self.0[..idx].to_string()))
        }
    }

    /// Engine object path form: `/Game/Dir/Name.Name`.
    pub fn object_path(&self) -> String {
        let name = self.name();
        match self.parent() {
            Some(parent) if parent.0 != "/" => format!("{}/{}.{}", parent.0, name, name),
            _ => format!("/{}.{}", name, name),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for AssetPath {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AssetPath> for String {
    fn from(path: AssetPath) -> Self {
        path.0
    }
}

impl std::str::FromStr for AssetPath {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
