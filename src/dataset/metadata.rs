use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::parse::canonical_id;
use crate::explore::PointId;

/// Auxiliary metadata for one point, as served by an enrichment source.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub creator: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default, alias = "imageUrl")]
    pub image_url: Option<String>,
    #[serde(default, alias = "publicUrl")]
    pub public_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Batch metadata lookup keyed by point id.
///
/// Ids the source knows nothing about are left out of the returned map.
pub trait MetadataSource: Send + Sync {
    fn fetch(&self, ids: &[PointId]) -> Result<HashMap<PointId, ItemMetadata>>;
}

/// Source used when no enrichment is configured.
pub struct NoMetadata;

impl MetadataSource for NoMetadata {
    fn fetch(&self, _ids: &[PointId]) -> Result<HashMap<PointId, ItemMetadata>> {
        Ok(HashMap::new())
    }
}

/// Metadata served from a JSON object mapping id to metadata object.
pub struct JsonFileMetadata {
    items: HashMap<PointId, ItemMetadata>,
}

impl JsonFileMetadata {
    pub fn open(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read metadata file {}", path.display()))?;
        Self::from_json(&raw)
            .with_context(|| format!("failed to parse metadata file {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let parsed: Value = serde_json::from_str(raw).context("invalid JSON in metadata")?;
        let object = parsed
            .as_object()
            .ok_or_else(|| anyhow!("metadata must be a JSON object keyed by id"))?;

        let mut items = HashMap::with_capacity(object.len());
        for (key, value) in object {
            let Some(id) = canonical_id(&Value::String(key.clone())) else {
                continue;
            };
            let item = ItemMetadata::deserialize(value)
                .with_context(|| format!("invalid metadata entry for id {key}"))?;
            items.insert(id, item);
        }
        Ok(Self { items })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl MetadataSource for JsonFileMetadata {
    fn fetch(&self, ids: &[PointId]) -> Result<HashMap<PointId, ItemMetadata>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.items.get(id).map(|item| (id.clone(), item.clone())))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const SAMPLE: &str = r#"{
        "12": {"title": "Memorial", "imageUrl": "https://example.org/a.jpg", "year": 1946},
        "doc-b": {"text": "body", "public_url": "https://example.org/b"}
    }"#;

    #[test]
    fn fetch_returns_partial_results() {
        let source = JsonFileMetadata::from_json(SAMPLE).unwrap();
        let found = source
            .fetch(&[PointId::new("12"), PointId::new("missing")])
            .unwrap();

        assert_eq!(found.len(), 1);
        let item = &found[&PointId::new("12")];
        assert_eq!(item.title.as_deref(), Some("Memorial"));
        assert_eq!(item.image_url.as_deref(), Some("https://example.org/a.jpg"));
        assert_eq!(item.extra.get("year"), Some(&Value::from(1946)));
    }

    #[test]
    fn ids_are_canonicalized_on_load() {
        let source = JsonFileMetadata::from_json(r#"{" 7 ": {"title": "seven"}}"#).unwrap();
        assert!(source.fetch(&[PointId::new("7")]).unwrap().contains_key("7"));
    }

    #[test]
    fn opens_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let source = JsonFileMetadata::open(file.path()).unwrap();
        assert_eq!(source.len(), 2);
    }

    #[test]
    fn rejects_non_object_documents() {
        assert!(JsonFileMetadata::from_json("[1, 2, 3]").is_err());
    }

    #[test]
    fn no_metadata_is_always_empty() {
        assert!(NoMetadata.fetch(&[PointId::new("1")]).unwrap().is_empty());
    }
}
