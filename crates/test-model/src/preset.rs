use serde::{Deserialize, Serialize};

/// The preset reply for one user turn.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetReply {
    /// Text returned when the request succeeds.
    pub text: String,
    /// If set, the request will fail in the first `failures` attempts.
    /// `Some(0)` means the request will fail infinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failures: Option<u64>,
}

impl PresetReply {
    /// Creates a `PresetReply` that always succeeds with `text`.
    #[inline]
    pub fn with_text<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            failures: None,
        }
    }

    /// Creates a `PresetReply` that always fails.
    #[inline]
    pub fn failing() -> Self {
        Self {
            text: String::new(),
            failures: Some(0),
        }
    }

    /// Sets failure times before a successful reply. `0` means the reply
    /// will always be a failure.
    #[inline]
    pub fn with_failures(mut self, failures: u64) -> Self {
        self.failures = Some(failures);
        self
    }

    pub(crate) fn should_fail(&self, attempt: u64) -> bool {
        match self.failures {
            None => false,
            Some(0) => true,
            Some(failures) => attempt < failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_deserialize_script() {
        let script: Vec<PresetReply> = serde_json::from_value(json!([
            { "text": "Hello there" },
            { "text": "Second try works", "failures": 1 },
        ]))
        .unwrap();

        assert_eq!(script[0], PresetReply::with_text("Hello there"));
        assert_eq!(
            script[1],
            PresetReply::with_text("Second try works").with_failures(1)
        );
    }

    #[test]
    fn test_failure_policy() {
        let reply = PresetReply::with_text("ok").with_failures(2);
        assert!(reply.should_fail(0));
        assert!(reply.should_fail(1));
        assert!(!reply.should_fail(2));

        assert!(PresetReply::failing().should_fail(100));
        assert!(!PresetReply::with_text("ok").should_fail(0));
    }
}
