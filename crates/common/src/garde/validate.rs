//! Garde validation utilities.

use crate::domain::DomainError;
use garde::{Report, Validate};

/// Validate a request struct, converting the garde report to a DomainError
pub fn validate<T>(value: &T) -> Result<(), DomainError>
where
    T: Validate,
    T::Context: Default,
{
    value
        .validate()
        .map_err(|report| DomainError::ValidationError(format_validation_errors(&report)))
}

/// Format validation errors from garde Report into a human-readable string
fn format_validation_errors(report: &Report) -> String {
    report
        .iter()
        .map(|(path, error)| {
            if path.to_string().is_empty() {
                error.message().to_string()
            } else {
                format!("{}: {}", path, error.message())
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use garde::Validate;

    #[derive(Validate)]
    struct TestRequest {
        #[garde(length(min = 1))]
        device_id: String,
    }

    #[test]
    fn test_validate_success() {
        let request = TestRequest {
            device_id: "9f1c6f0e-2d3a-4b5c-8d7e-1f2a3b4c5d6e".to_string(),
        };
        assert!(validate(&request).is_ok());
    }

    #[test]
    fn test_validate_failure_names_the_field() {
        let request = TestRequest {
            device_id: "".to_string(),
        };
        match validate(&request) {
            Err(DomainError::ValidationError(msg)) => assert!(msg.contains("device_id")),
            other => panic!("expected ValidationError, got {:?}", other.err()),
        }
    }
}
