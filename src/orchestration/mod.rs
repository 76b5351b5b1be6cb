pub mod batch_publisher;
pub mod curseforge_publisher;
pub mod metadata_generator;
pub mod resolver;

#[cfg(test)]
pub(crate) mod test_support;

pub use batch_publisher::{BatchPublishOptions, BatchPublishResult, BatchPublisher};
pub use curseforge_publisher::CurseForgePublisher;
pub use metadata_generator::{generate_metadata_files, metadata_path};
pub use resolver::{TagResolution, resolve_version_tags};
