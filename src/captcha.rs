//! Captcha gate shown before the wizard

use rand::Rng;
use std::fmt;

pub const CAPTCHA_LEN: usize = 6;
const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptchaError {
    Empty,
    Mismatch,
}

impl fmt::Display for CaptchaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Please enter the captcha code"),
            Self::Mismatch => write!(f, "Incorrect captcha. Please try again."),
        }
    }
}

impl std::error::Error for CaptchaError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptchaChallenge {
    code: String,
}

impl CaptchaChallenge {
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let code = (0..CAPTCHA_LEN)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
            .collect();
        Self { code }
    }

    /// Fixed challenge, mainly for tests
    pub fn from_code(code: impl Into<String>) -> Self {
        Self {
            code: code.into().to_uppercase(),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Case-insensitive, surrounding whitespace ignored
    pub fn verify(&self, input: &str) -> Result<(), CaptchaError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(CaptchaError::Empty);
        }
        if !input.eq_ignore_ascii_case(&self.code) {
            return Err(CaptchaError::Mismatch);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_code_shape() {
        for _ in 0..200 {
            let challenge = CaptchaChallenge::generate();
            assert_eq!(challenge.code().len(), CAPTCHA_LEN);
            assert!(challenge
                .code()
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
        }
    }

    #[test]
    fn test_verify() {
        let challenge = CaptchaChallenge::from_code("AB12CD");

        assert_eq!(challenge.verify(""), Err(CaptchaError::Empty));
        assert_eq!(challenge.verify("   "), Err(CaptchaError::Empty));
        assert_eq!(challenge.verify("AB12CE"), Err(CaptchaError::Mismatch));
        assert!(challenge.verify("ab12cd").is_ok());
        assert!(challenge.verify(" AB12CD ").is_ok());
    }
}
