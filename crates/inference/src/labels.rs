use crate::config::InferenceConfig;
use crate::error::ClassIndexError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Class index to human-readable label.
///
/// Parsed from a JSON object keyed by stringified indices:
/// `{"0": "daisy", "1": "dandelion"}`. Keys must be canonical decimals, so
/// `"02"`, `"+2"` or `" 2"` are rejected and no two keys share an index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassIndex {
    labels: BTreeMap<usize, String>,
}

impl ClassIndex {
    pub fn from_json_str(json: &str) -> Result<Self, ClassIndexError> {
        let raw: BTreeMap<String, String> = serde_json::from_str(json)?;

        let labels = raw
            .into_iter()
            .map(|(key, label)| match key.parse::<usize>() {
                Ok(index) if index.to_string() == key => Ok((index, label)),
                _ => Err(ClassIndexError::InvalidKey(key)),
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(Self { labels })
    }

    pub async fn load(path: &Path) -> Result<Self, ClassIndexError> {
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ClassIndexError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        Self::from_json_str(&json)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(&index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ClassIndex {
    /// Index labels by position.
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            labels: iter.into_iter().map(Into::into).enumerate().collect(),
        }
    }
}

/// Where predictions get their label table from.
#[derive(Debug, Clone)]
pub enum LabelSource {
    /// Loaded once at startup
    Cached(Arc<ClassIndex>),
    /// Re-read on every request so labels can be edited without a restart
    PerRequest(PathBuf),
}

impl LabelSource {
    pub async fn from_config(config: &InferenceConfig) -> Result<Self, ClassIndexError> {
        if config.reload_labels {
            tracing::info!(
                path = %config.labels_path.display(),
                "Class index table will be re-read on every prediction"
            );
            return Ok(Self::PerRequest(config.labels_path.clone()));
        }

        let table = ClassIndex::load(&config.labels_path).await?;
        tracing::info!(
            path = %config.labels_path.display(),
            classes = table.len(),
            "Class index table loaded"
        );
        Ok(Self::Cached(Arc::new(table)))
    }

    pub async fn table(&self) -> Result<Arc<ClassIndex>, ClassIndexError> {
        match self {
            LabelSource::Cached(table) => Ok(Arc::clone(table)),
            LabelSource::PerRequest(path) => ClassIndex::load(path).await.map(Arc::new),
        }
    }
}
