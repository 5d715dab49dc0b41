//! Username syntax validation
//!
//! Pure checks on a candidate string, independent of any stored state.
//! Availability is layered on top by the registry.

/// Minimum username length in characters
pub const MIN_USERNAME_LENGTH: usize = 6;

/// Maximum username length in characters
pub const MAX_USERNAME_LENGTH: usize = 30;

/// Reported when the candidate is empty or whitespace only
pub const EMPTY_MESSAGE: &str = "Username cannot be null or empty";

/// Reported when the candidate is outside the length bounds
pub const LENGTH_MESSAGE: &str = "Username must be between 6 and 30 characters";

/// Reported when the candidate contains anything but ASCII letters and digits
pub const PATTERN_MESSAGE: &str = "Username must contain only alphanumeric characters";

/// Reported by the registry when the candidate is bound to another account
pub const TAKEN_MESSAGE: &str = "Username is already taken";

/// Outcome of validating a candidate username
///
/// Violations are kept in check order and never repeated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    violations: Vec<String>,
}

impl ValidationResult {
    /// A result with no violations
    pub fn valid() -> Self {
        Self::default()
    }

    /// True iff no violation was recorded
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Violation messages in check order
    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    /// Record a violation, ignoring repeats
    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        if !self.violations.contains(&message) {
            self.violations.push(message);
        }
    }

    /// Consume the result, yielding the violation list
    pub fn into_violations(self) -> Vec<String> {
        self.violations
    }
}

/// Validate a candidate username
///
/// Rules:
/// - empty or whitespace-only input reports [`EMPTY_MESSAGE`] and nothing else
/// - length must be within [`MIN_USERNAME_LENGTH`]..=[`MAX_USERNAME_LENGTH`]
/// - every character must be an ASCII letter or digit
///
/// The length and character checks are independent; both may be reported.
pub fn validate(candidate: &str) -> ValidationResult {
    let mut result = ValidationResult::valid();

    if candidate.trim().is_empty() {
        result.push(EMPTY_MESSAGE);
        return result;
    }

    let length = candidate.chars().count();
    if !(MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&length) {
        result.push(LENGTH_MESSAGE);
    }

    if !candidate.chars().all(|c| c.is_ascii_alphanumeric()) {
        result.push(PATTERN_MESSAGE);
    }

    result
}
