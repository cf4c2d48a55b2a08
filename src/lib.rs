pub mod capture;
pub mod config;
pub mod models;
pub mod image;
pub mod utils;

// 重新导出主要类型
pub use capture::{CaptureScreen, DisplayCommand};
pub use config::Config;
pub use models::{Classifier, ImageClassifier, Recognition};
pub use utils::error::ClassifyError;

pub type Result<T> = std::result::Result<T, ClassifyError>;
