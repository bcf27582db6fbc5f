pub mod capabilities;
pub mod service;
pub mod traits;
