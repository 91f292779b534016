pub mod jpeg;
pub mod png;
