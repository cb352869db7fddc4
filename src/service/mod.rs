pub mod backup;
pub mod scanner;
