use serde::Serialize;

use super::point::{Point, PointId};
use crate::dataset::ItemMetadata;
use crate::util::{round3, shorten};

pub const RESULT_SOURCE: &str = "Explore";

const TITLE_MAX_CHARS: usize = 80;
const NO_TITLE: &str = "(No title)";

/// Display fields for one result, remote metadata layered over local fallbacks.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ResultPayload {
    pub title: String,
    pub text: Option<String>,
    pub topic: String,
    pub creator: Option<String>,
    pub image_url: Option<String>,
    pub public_url: Option<String>,
    pub enriched: bool,
}

impl ResultPayload {
    pub fn from_point(point: &Point, metadata: Option<&ItemMetadata>) -> Self {
        let non_empty = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_owned)
        };

        let meta_title = metadata.and_then(|meta| non_empty(&meta.title));
        let title = meta_title
            .or_else(|| point.text.as_deref().map(|text| shorten(text, TITLE_MAX_CHARS)))
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| {
                let name = point.display_name();
                if name.is_empty() {
                    NO_TITLE.to_owned()
                } else {
                    name.to_owned()
                }
            });

        Self {
            title,
            text: metadata
                .and_then(|meta| non_empty(&meta.text))
                .or_else(|| point.text.clone()),
            topic: metadata
                .and_then(|meta| non_empty(&meta.topic))
                .unwrap_or_else(|| point.display_name().to_owned()),
            creator: metadata.and_then(|meta| non_empty(&meta.creator)),
            image_url: metadata.and_then(|meta| non_empty(&meta.image_url)),
            public_url: metadata.and_then(|meta| non_empty(&meta.public_url)),
            enriched: metadata.is_some(),
        }
    }
}

/// One row handed to the results list.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResultRecord {
    pub id: PointId,
    pub score: f32,
    pub payload: ResultPayload,
    pub source: &'static str,
}

impl ResultRecord {
    pub fn new(point: &Point, distance: f32, metadata: Option<&ItemMetadata>) -> Self {
        Self {
            id: point.id.clone(),
            score: round3(distance),
            payload: ResultPayload::from_point(point, metadata),
            source: RESULT_SOURCE,
        }
    }
}
