pub mod domain;
pub mod http;
pub mod switchboard_api;

pub use switchboard_api::*;
