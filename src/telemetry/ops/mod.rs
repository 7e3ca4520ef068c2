pub mod feed;
pub mod submit;
pub mod tasks;
