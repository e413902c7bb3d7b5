pub mod description_generator;
pub mod image_stage;
pub mod section_builder;
pub mod summary_writer;
pub mod template_resolver;
pub mod title_generator;

pub use description_generator::DescriptionGenerator;
pub use image_stage::ImageStage;
pub use section_builder::SectionKind;
pub use summary_writer::SummaryWriter;
pub use title_generator::TitleGenerator;
