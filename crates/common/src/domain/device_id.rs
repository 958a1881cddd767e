use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::{DomainError, DomainResult};

// Canonical device id format: UUIDv4 with the version nibble fixed to 4 and
// the variant nibble in [89ab]. The historical brace-wrapped GUID form is
// deprecated and rejected.
static DEVICE_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        "^[a-fA-F0-9]{8}-[a-fA-F0-9]{4}-4[a-fA-F0-9]{3}-[89aAbB][a-fA-F0-9]{3}-[a-fA-F0-9]{12}$",
    )
    .expect("valid device id pattern")
});

/// Validate an externally supplied device id against the canonical UUIDv4
/// format.
pub fn validate_device_id(device_id: &str) -> DomainResult<()> {
    if DEVICE_ID_PATTERN.is_match(device_id) {
        Ok(())
    } else {
        Err(DomainError::InvalidDeviceId(device_id.to_string()))
    }
}
