//! Built-in handler implementations

pub mod async_queue;
pub mod console;
pub mod file;
pub mod null;
pub mod rotating_file;
pub mod stream;

pub use async_queue::AsyncHandler;
pub use console::ConsoleHandler;
pub use file::FileHandler;
pub use null::NullHandler;
pub use rotating_file::RotatingFileHandler;
pub use stream::StreamHandler;
