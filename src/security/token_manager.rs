//! Secure token manager with memory-safe handling and masking capabilities
//!
//! This module resolves the CurseForge API token, using the `secrecy` crate
//! to prevent accidental token exposure in logs or error messages.

use crate::core::error::PublishError;
use secrecy::{ExposeSecret, SecretString};
use std::env;

/// Environment variable holding the API token
pub const TOKEN_ENV_VAR: &str = "CURSEFORGE_API_TOKEN";

/// Environment variable overriding the API base URL
pub const URL_ENV_VAR: &str = "CURSEFORGE_API_URL";

/// Secure token manager for CurseForge authentication
///
/// # Examples
///
/// ```
/// use curseforge_publisher::security::SecureTokenManager;
///
/// let manager = SecureTokenManager::new();
/// let token = manager.resolve(Some("explicit-token"), None).unwrap();
/// # use secrecy::ExposeSecret;
/// assert_eq!(token.expose_secret(), "explicit-token");
/// ```
#[derive(Debug, Clone)]
pub struct SecureTokenManager {
    env_var: String,
}

impl Default for SecureTokenManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SecureTokenManager {
    /// Creates a manager reading [`TOKEN_ENV_VAR`]
    pub fn new() -> Self {
        Self::with_env_var(TOKEN_ENV_VAR)
    }

    /// Creates a manager reading a custom environment variable
    pub fn with_env_var(env_var: impl Into<String>) -> Self {
        Self {
            env_var: env_var.into(),
        }
    }

    /// Retrieves the token from the environment, ignoring empty values
    pub fn get_token(&self) -> Option<SecretString> {
        let token_value = env::var(&self.env_var).ok()?;
        non_empty(&token_value)
    }

    /// Resolves the token to use.
    ///
    /// Priority (high to low):
    /// 1. Explicitly passed token (CLI)
    /// 2. Environment variable
    /// 3. Token from the configuration file
    pub fn resolve(
        &self,
        explicit: Option<&str>,
        configured: Option<&str>,
    ) -> Result<SecretString, PublishError> {
        explicit
            .and_then(non_empty)
            .or_else(|| self.get_token())
            .or_else(|| configured.and_then(non_empty))
            .ok_or(PublishError::TokenMissing)
    }

    /// Masks a token for safe display
    ///
    /// Shows only the first 3 and last 3 characters for identification purposes.
    /// Tokens shorter than 10 characters are fully masked as "****".
    ///
    /// # Examples
    ///
    /// ```
    /// use curseforge_publisher::security::SecureTokenManager;
    ///
    /// assert_eq!(SecureTokenManager::mask_token("abcdef123456"), "abc...456");
    /// assert_eq!(SecureTokenManager::mask_token("short"), "****");
    /// ```
    pub fn mask_token(token: &str) -> String {
        if token.chars().count() < 10 {
            return "****".to_string();
        }

        let prefix: String = token.chars().take(3).collect();
        let suffix: String = token
            .chars()
            .rev()
            .take(3)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("{}...{}", prefix, suffix)
    }

    /// Replaces every occurrence of `token` in `text` with its masked form
    pub fn mask_token_in_string(text: &str, token: &SecretString) -> String {
        let token_str = token.expose_secret();
        if token_str.is_empty() {
            return text.to_string();
        }

        text.replace(token_str, &Self::mask_token(token_str))
    }
}

fn non_empty(value: &str) -> Option<SecretString> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(SecretString::new(trimmed.into()))
    }
}
