pub mod capabilities;
pub mod driver;
pub mod pacing;
pub mod session;
