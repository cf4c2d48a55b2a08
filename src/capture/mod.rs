pub mod messages;
pub mod screen;
pub mod types;

pub use messages::recognition_message;
pub use screen::CaptureScreen;
pub use types::DisplayCommand;
