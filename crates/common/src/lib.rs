pub mod auth;
pub mod domain;
pub mod garde;
pub mod telemetry;

// Re-export mocks when the testing feature is enabled
#[cfg(any(test, feature = "testing"))]
pub use auth::{MockAuthTokenProvider, MockPasswordService};
#[cfg(any(test, feature = "testing"))]
pub use domain::{MockDeviceRepository, MockUserRepository};
