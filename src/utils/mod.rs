pub mod directory;
pub mod filesystem;
pub mod logger;
pub mod progress;
