use std::fmt;

/// Static API key guarding machine-to-machine routes
#[derive(Clone)]
pub struct StaticApiKey {
    key: String,
}

impl StaticApiKey {
    pub fn new(key: String) -> Self {
        Self { key }
    }

    /// Constant-time comparison to prevent timing attacks
    pub fn matches(&self, candidate: &str) -> bool {
        if candidate.len() != self.key.len() {
            return false;
        }

        let mut result = 0u8;
        for (a, b) in candidate.bytes().zip(self.key.bytes()) {
            result |= a ^ b;
        }
        result == 0
    }
}

impl fmt::Debug for StaticApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StaticApiKey([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_exact_key_only() {
        let key = StaticApiKey::new("service-key-123".to_string());
        assert!(key.matches("service-key-123"));
        assert!(!key.matches("service-key-124"));
        assert!(!key.matches("service-key-123-extra"));
        assert!(!key.matches(""));
    }

    #[test]
    fn test_debug_redacts_key() {
        let key = StaticApiKey::new("secret".to_string());
        assert_eq!(format!("{:?}", key), "StaticApiKey([REDACTED])");
    }
}
