pub mod image_discovery;
pub mod metadata_loader;

pub use image_discovery::{discover_images, is_supported_image, IMAGE_EXTENSIONS};
pub use metadata_loader::{load_metadata, load_optional_metadata, MetadataIndex};
