pub mod engine;
pub mod locks;
pub mod progress;
pub mod repos;
