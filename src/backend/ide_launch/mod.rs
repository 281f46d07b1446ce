pub mod launcher;
pub mod probe;
