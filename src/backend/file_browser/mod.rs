pub mod browser;
pub mod preview;
