use std::fmt::Write;

use atlasgate_core::{AppError, AppResult};

/// Generates a random anti-forgery token encoded as 64 hex characters.
pub fn generate_csrf_token() -> AppResult<String> {
    let mut bytes = [0u8; 32];
    getrandom::fill(&mut bytes)
        .map_err(|error| AppError::Internal(format!("failed to generate csrf token: {error}")))?;

    Ok(bytes
        .iter()
        .fold(String::with_capacity(64), |mut acc, byte| {
            let _ = write!(acc, "{byte:02x}");
            acc
        }))
}

#[cfg(test)]
mod tests {
    use super::generate_csrf_token;

    #[test]
    fn csrf_tokens_are_hex_encoded() {
        let token = generate_csrf_token().unwrap_or_default();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|character| character.is_ascii_hexdigit()));
    }

    #[test]
    fn csrf_tokens_are_not_repeated() {
        let first = generate_csrf_token().unwrap_or_default();
        let second = generate_csrf_token().unwrap_or_default();
        assert_ne!(first, second);
    }
}
