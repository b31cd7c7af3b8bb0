pub mod mime;
pub mod scanner;
