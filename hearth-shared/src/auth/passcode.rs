/// Sign-up passcode check
///
/// New accounts can only be created by someone who knows the organization's
/// registration passcode. When no passcode is configured, sign-up is closed.

/// Result of checking a submitted passcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasscodeCheck {
    /// Passcode matches
    Accepted,

    /// Passcode is wrong or missing
    Rejected,

    /// No passcode configured on the server
    SignupDisabled,
}

/// Compares a submitted passcode with the configured one
///
/// ```
/// use hearth_shared::auth::passcode::{check_passcode, PasscodeCheck};
///
/// assert_eq!(check_passcode(Some("open-door"), "open-door"), PasscodeCheck::Accepted);
/// assert_eq!(check_passcode(Some("open-door"), "guess"), PasscodeCheck::Rejected);
/// assert_eq!(check_passcode(None, "anything"), PasscodeCheck::SignupDisabled);
/// ```
pub fn check_passcode(configured: Option<&str>, submitted: &str) -> PasscodeCheck {
    match configured {
        None => PasscodeCheck::SignupDisabled,
        Some(expected) if expected.is_empty() => PasscodeCheck::SignupDisabled,
        Some(expected) => {
            if constant_time_eq(expected.as_bytes(), submitted.trim().as_bytes()) {
                PasscodeCheck::Accepted
            } else {
                PasscodeCheck::Rejected
            }
        }
    }
}

/// Byte comparison whose running time does not depend on where inputs differ
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
