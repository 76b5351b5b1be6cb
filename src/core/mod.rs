pub mod config;
pub mod config_loader;
pub mod error;
pub mod minecraft;
pub mod model;
pub mod report;

pub use config::*;
pub use config_loader::*;
pub use error::*;
pub use minecraft::*;
pub use model::*;
pub use report::*;
