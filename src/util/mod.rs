pub mod buffer;
pub mod location;
