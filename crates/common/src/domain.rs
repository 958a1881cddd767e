mod device;
mod device_id;
mod result;
mod schedule;
mod user;

pub use device::*;
pub use device_id::*;
pub use result::*;
pub use schedule::*;
pub use user::*;
