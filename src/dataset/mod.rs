mod load;
mod metadata;
mod parse;

pub use load::{Dataset, LoadReport, dataset_from_str, load_dataset};
pub use metadata::{ItemMetadata, JsonFileMetadata, MetadataSource, NoMetadata};
pub use parse::{ParsedRecords, PointRecord, canonical_id, parse_point_records};
