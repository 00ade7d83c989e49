// Catalog credentials
//
// Spotify access is either a pre-issued bearer token or an app's
// client id / secret pair exchanged for a token on demand.
// The client secret can live in the OS keychain:
// - macOS: Keychain
// - Windows: Credential Manager
// - Linux: Secret Service (GNOME/KDE)

use keyring::Entry;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

const SERVICE_NAME: &str = "com.emotune.app";
const CLIENT_SECRET_NAME: &str = "spotify_client_secret";
const CLIENT_SECRET_LEN: usize = 32;

/// How the catalog client authenticates.
#[derive(Clone, PartialEq, Eq)]
pub enum CatalogAuth {
    /// Pre-issued bearer token, sent as-is.
    Token(String),
    /// Exchanged for a bearer token before each search.
    ClientCredentials {
        client_id: String,
        client_secret: String,
    },
}

// Never print secrets
impl fmt::Debug for CatalogAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogAuth::Token(_) => f.write_str("Token(***)"),
            CatalogAuth::ClientCredentials { client_id, .. } => f
                .debug_struct("ClientCredentials")
                .field("client_id", client_id)
                .field("client_secret", &"***")
                .finish(),
        }
    }
}

impl CatalogAuth {
    /// Pick the credentials to use from whatever is configured.
    ///
    /// A bearer token wins over a client id. A client id without a secret
    /// looks the secret up in the keychain.
    pub fn resolve(
        token: Option<String>,
        client_id: Option<String>,
        client_secret: Option<String>,
    ) -> Option<CatalogAuth> {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        if let Some(token) = non_empty(token) {
            return Some(CatalogAuth::Token(token));
        }

        let client_id = non_empty(client_id)?;
        let client_secret = match non_empty(client_secret) {
            Some(secret) => secret,
            None => match CredentialManager::retrieve_client_secret() {
                Ok(Some(secret)) => secret,
                Ok(None) => {
                    warn!("Spotify client id configured but no client secret found");
                    return None;
                }
                Err(e) => {
                    warn!("Could not read Spotify client secret from keychain: {}", e);
                    return None;
                }
            },
        };

        Some(CatalogAuth::ClientCredentials {
            client_id,
            client_secret,
        })
    }
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("{0}")]
    InvalidFormat(String),

    #[error("keychain error: {0}")]
    Keychain(#[from] keyring::Error),
}

pub struct CredentialManager;

impl CredentialManager {
    /// Spotify client secrets are 32 alphanumeric characters.
    pub fn validate_client_secret(secret: &str) -> Result<(), CredentialError> {
        let secret = secret.trim();
        if secret.is_empty() {
            return Err(CredentialError::InvalidFormat(
                "Client secret cannot be empty".to_string(),
            ));
        }
        if secret.len() != CLIENT_SECRET_LEN || !secret.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CredentialError::InvalidFormat(format!(
                "Invalid client secret format. Spotify client secrets are {} alphanumeric characters",
                CLIENT_SECRET_LEN
            )));
        }
        Ok(())
    }

    /// Store the Spotify client secret in the OS keychain
    pub fn store_client_secret(secret: &str) -> Result<(), CredentialError> {
        Self::validate_client_secret(secret)?;

        let entry = Entry::new(SERVICE_NAME, CLIENT_SECRET_NAME)?;
        entry.set_password(secret.trim())?;

        info!("Client secret stored in keychain");
        Ok(())
    }

    /// Retrieve the Spotify client secret from the OS keychain
    pub fn retrieve_client_secret() -> Result<Option<String>, CredentialError> {
        let entry = Entry::new(SERVICE_NAME, CLIENT_SECRET_NAME)?;

        match entry.get_password() {
            Ok(secret) => {
                debug!("Client secret retrieved from keychain");
                Ok(Some(secret))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the Spotify client secret from the OS keychain
    pub fn delete_client_secret() -> Result<(), CredentialError> {
        let entry = Entry::new(SERVICE_NAME, CLIENT_SECRET_NAME)?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Check if a client secret is stored (without exposing it)
    pub fn has_client_secret() -> Result<bool, CredentialError> {
        Ok(Self::retrieve_client_secret()?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_secret_validation() {
        assert!(CredentialManager::validate_client_secret("0123456789abcdef0123456789ABCDEF").is_ok());

        assert!(CredentialManager::validate_client_secret("").is_err());
        assert!(CredentialManager::validate_client_secret("too-short").is_err());
        assert!(CredentialManager::validate_client_secret("0123456789abcdef0123456789abcde!").is_err());
    }

    #[test]
    fn test_store_rejects_invalid_secret_before_keychain() {
        let result = CredentialManager::store_client_secret("invalid");
        assert!(matches!(result, Err(CredentialError::InvalidFormat(_))));
    }

    #[test]
    fn test_token_takes_precedence() {
        let auth = CatalogAuth::resolve(
            Some("BQD-token".to_string()),
            Some("id".to_string()),
            Some("secret".to_string()),
        );
        assert_eq!(auth, Some(CatalogAuth::Token("BQD-token".to_string())));
    }

    #[test]
    fn test_client_credentials_from_explicit_values() {
        let auth = CatalogAuth::resolve(None, Some("my-id".to_string()), Some("my-secret".to_string()));
        assert_eq!(
            auth,
            Some(CatalogAuth::ClientCredentials {
                client_id: "my-id".to_string(),
                client_secret: "my-secret".to_string(),
            })
        );
    }

    #[test]
    fn test_nothing_configured_resolves_to_none() {
        assert_eq!(CatalogAuth::resolve(None, None, None), None);
        assert_eq!(CatalogAuth::resolve(Some("  ".to_string()), None, Some("s".to_string())), None);
    }

    #[test]
    fn test_debug_hides_secrets() {
        let auth = CatalogAuth::ClientCredentials {
            client_id: "visible-id".to_string(),
            client_secret: "hidden-secret".to_string(),
        };
        let printed = format!("{:?}", auth);
        assert!(printed.contains("visible-id"));
        assert!(!printed.contains("hidden-secret"));
        assert!(!format!("{:?}", CatalogAuth::Token("abc".to_string())).contains("abc"));
    }
}
