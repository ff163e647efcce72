pub mod console;
pub mod file;
pub mod json;
pub mod similarity;
pub mod time;
