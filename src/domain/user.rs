// User domain model
use serde::{Deserialize, Serialize};

/// A registered dashboard publisher.
///
/// `userid` keeps the name as it was submitted; the registry key is
/// [`canonical_name`] of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub userid: String,
    pub count: i64,
}

impl User {
    pub fn new(userid: impl Into<String>, count: i64) -> Self {
        Self {
            userid: userid.into(),
            count,
        }
    }
}

/// Lookup key for a user: trimmed and lower-cased
pub fn canonical_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Sequence number for the next user given the current maximum
pub fn next_count(max_count: Option<i64>) -> i64 {
    max_count.unwrap_or(0) + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_name() {
        assert_eq!(canonical_name("Alice"), "alice");
        assert_eq!(canonical_name("  BOB "), "bob");
    }

    #[test]
    fn test_next_count() {
        assert_eq!(next_count(None), 1);
        assert_eq!(next_count(Some(7)), 8);
    }

    #[test]
    fn test_serializes_as_record() {
        let json = serde_json::to_value(User::new("Alice", 1)).unwrap();
        assert_eq!(json, serde_json::json!({"userid": "Alice", "count": 1}));
    }
}
