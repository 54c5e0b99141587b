/// Shared-secret check for incoming slash commands
#[derive(Debug, Clone, Default)]
pub struct TokenGate {
    expected: Option<String>,
}

impl TokenGate {
    /// `None` or an empty token leaves the endpoint open
    pub fn new(expected: Option<String>) -> Self {
        Self {
            expected: expected.filter(|token| !token.is_empty()),
        }
    }

    pub fn is_open(&self) -> bool {
        self.expected.is_none()
    }

    /// Whether the token sent with a request is acceptable
    pub fn verify(&self, presented: &str) -> bool {
        match &self.expected {
            None => true,
            Some(expected) => constant_time_eq(expected.as_bytes(), presented.as_bytes()),
        }
    }
}

/// Compare without bailing out at the first differing byte
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_gate_accepts_everything() {
        let gate = TokenGate::new(None);
        assert!(gate.is_open());
        assert!(gate.verify("anything"));
        assert!(gate.verify(""));

        assert!(TokenGate::new(Some(String::new())).verify("whatever"));
    }

    #[test]
    fn test_configured_token() {
        let gate = TokenGate::new(Some("abc".to_string()));
        assert!(!gate.is_open());
        assert!(gate.verify("abc"));
        assert!(!gate.verify("xyz"));
        assert!(!gate.verify(""));
        assert!(!gate.verify("abcd"));
        assert!(!gate.verify("ABC"));
    }
}
