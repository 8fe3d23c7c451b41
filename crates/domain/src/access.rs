//! Keypad PIN buffer and secret verification.

use crate::error::ValidationError;

/// Maximum number of buffered digits.
pub const PIN_LENGTH: usize = 4;

/// Default secret for a fresh installation.
pub const DEFAULT_PIN: &str = "1234";

/// What a keypad token did to the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeypadInput {
    /// Not a digit, `*` or `#`, or `#` on an empty buffer.
    Ignored,
    /// A digit was appended.
    Buffered,
    /// `*` emptied the buffer.
    Cleared,
    /// A code is ready to be verified.
    Candidate(String),
}

/// Check that `pin` is exactly [`PIN_LENGTH`] ASCII digits.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidPin`] otherwise.
pub fn validate_pin(pin: &str) -> Result<(), ValidationError> {
    if pin.len() == PIN_LENGTH && is_digits(pin) {
        Ok(())
    } else {
        Err(ValidationError::InvalidPin)
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Right-truncating digit buffer plus the configured secret.
#[derive(Debug, Clone)]
pub struct PinPad {
    buffer: String,
    secret: String,
}

impl Default for PinPad {
    fn default() -> Self {
        Self {
            buffer: String::new(),
            secret: DEFAULT_PIN.to_string(),
        }
    }
}

impl PinPad {
    /// Create a pad with a custom secret.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidPin`] if the secret is not four digits.
    pub fn with_secret(secret: &str) -> Result<Self, ValidationError> {
        validate_pin(secret)?;
        Ok(Self {
            buffer: String::new(),
            secret: secret.to_string(),
        })
    }

    /// Digits typed so far.
    #[must_use]
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// Feed one keypad token.
    ///
    /// A four-digit token is a complete code on its own and leaves the
    /// buffer untouched.
    pub fn accept(&mut self, token: &str) -> KeypadInput {
        let token = token.trim();
        if token.len() == PIN_LENGTH && is_digits(token) {
            return KeypadInput::Candidate(token.to_string());
        }
        match token {
            "*" => {
                self.buffer.clear();
                KeypadInput::Cleared
            }
            "#" => {
                let candidate = std::mem::take(&mut self.buffer);
                if candidate.is_empty() {
                    KeypadInput::Ignored
                } else {
                    KeypadInput::Candidate(candidate)
                }
            }
            digit if digit.len() == 1 && is_digits(digit) => {
                self.buffer.push_str(digit);
                if self.buffer.len() > PIN_LENGTH {
                    self.buffer.remove(0);
                }
                KeypadInput::Buffered
            }
            _ => KeypadInput::Ignored,
        }
    }

    /// Whether `candidate` equals the secret.
    #[must_use]
    pub fn verify(&self, candidate: &str) -> bool {
        candidate == self.secret
    }
}
