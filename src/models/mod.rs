pub mod attributes;
pub mod listing;
pub mod loaders;

pub use attributes::ItemAttributes;
pub use listing::{item_name_of, BatchSummary, ItemResult, ListingOutputs, PipelineState, Stage};
pub use loaders::{discover_images, load_metadata, load_optional_metadata, MetadataIndex};
