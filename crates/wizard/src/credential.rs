use std::fmt;

use zeroize::Zeroize;

use crate::WizardError;

/// Secret that authorizes calls to the generation provider.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    /// Only a presence check: the provider is the judge of validity.
    pub fn parse(raw: &str) -> Result<Self, WizardError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(WizardError::EmptyCredential);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

impl Drop for Credential {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_input_is_rejected() {
        assert_eq!(
            Credential::parse("   ").expect_err("blank"),
            WizardError::EmptyCredential
        );
    }

    #[test]
    fn surrounding_whitespace_is_trimmed_and_debug_is_redacted() {
        let credential = Credential::parse("  AIza-secret\n").expect("credential");
        assert_eq!(credential.expose(), "AIza-secret");
        assert_eq!(format!("{credential:?}"), "Credential(***)");
    }
}
