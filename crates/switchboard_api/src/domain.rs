mod channel_service;
mod device_service;
mod user_service;

pub use channel_service::*;
pub use device_service::*;
pub use user_service::*;
