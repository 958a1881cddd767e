pub mod channel_handler;
pub mod device_handler;
pub mod error;
pub mod gate;
pub mod server;
pub mod user_handler;

pub use error::*;
pub use gate::*;
pub use server::*;
