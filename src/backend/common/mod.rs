pub mod clock;
pub mod dtos;
pub mod paths;
