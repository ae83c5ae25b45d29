pub mod client;
pub mod error;
pub mod inspect;
pub mod model;
