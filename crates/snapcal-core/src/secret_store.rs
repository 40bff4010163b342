//! Credential storage: OS keyring first, encrypted file fallback.
//!
//! The config file only ever holds a [`SecretReference`]; the secret itself
//! lives in the platform keyring, or, when no keyring is available, in a
//! ChaCha20-Poly1305 sealed blob whose master key sits next to the config
//! with owner-only permissions.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use keyring::Entry;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::config::config_directory;

const SERVICE_NAME: &str = "com.snapcal.app";
const MASTER_KEY_FILE: &str = "secret.key";
const ACCOUNT_PREFIX: &str = "snapcal-";

/// Reference to a persisted secret, allowing retrieval from the backing store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "backend", rename_all = "kebab-case")]
pub enum SecretReference {
    /// Secret lives in the host operating system's secure keyring.
    Keyring { account: String },
    /// Secret is stored inline, encrypted with the local master key.
    LocalEncrypted { nonce: String, ciphertext: String },
}

#[derive(Debug, Error)]
pub enum SecretStoreError {
    #[error("keyring operation failed: {0}")]
    Keyring(String),
    #[error("local encryption failed: {0}")]
    Crypto(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("base64 error: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Persist a secret using the most secure backend available.
pub fn store(label: &str, secret: &str) -> Result<SecretReference, SecretStoreError> {
    let trimmed = secret.trim();
    if trimmed.is_empty() {
        return Err(SecretStoreError::Crypto(
            "cannot store empty secret".to_string(),
        ));
    }

    let account = format!("{ACCOUNT_PREFIX}{label}");
    match Entry::new(SERVICE_NAME, &account) {
        Ok(entry) => match entry.set_password(trimmed) {
            Ok(()) => return Ok(SecretReference::Keyring { account }),
            Err(err) => {
                warn!(label, %err, "keyring write failed; using encrypted fallback");
            }
        },
        Err(err) => {
            warn!(label, %err, "keyring unavailable; using encrypted fallback");
        }
    }

    let (nonce, ciphertext) = seal(trimmed.as_bytes())?;
    Ok(SecretReference::LocalEncrypted {
        nonce: STANDARD.encode(nonce),
        ciphertext: STANDARD.encode(ciphertext),
    })
}

/// Retrieve a secret based on the stored reference.
pub fn load(reference: &SecretReference) -> Result<Option<String>, SecretStoreError> {
    match reference {
        SecretReference::Keyring { account } => match Entry::new(SERVICE_NAME, account) {
            Ok(entry) => match entry.get_password() {
                Ok(value) if !value.trim().is_empty() => Ok(Some(value)),
                Ok(_) | Err(keyring::Error::NoEntry) => Ok(None),
                Err(err) => Err(SecretStoreError::Keyring(err.to_string())),
            },
            Err(err) => Err(SecretStoreError::Keyring(err.to_string())),
        },
        SecretReference::LocalEncrypted { nonce, ciphertext } => {
            let nonce = STANDARD.decode(nonce)?;
            let ciphertext = STANDARD.decode(ciphertext)?;
            let plaintext = unseal(&nonce, &ciphertext)?;
            Ok(Some(String::from_utf8_lossy(&plaintext).to_string()))
        }
    }
}

/// Remove a secret from its backing store.
pub fn forget(reference: &SecretReference) -> Result<(), SecretStoreError> {
    match reference {
        SecretReference::Keyring { account } => match Entry::new(SERVICE_NAME, account) {
            Ok(entry) => match entry.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
                Err(err) => Err(SecretStoreError::Keyring(err.to_string())),
            },
            Err(err) => Err(SecretStoreError::Keyring(err.to_string())),
        },
        // The ciphertext lives inside the config entry being dropped.
        SecretReference::LocalEncrypted { .. } => Ok(()),
    }
}

fn seal(plaintext: &[u8]) -> Result<([u8; 12], Vec<u8>), SecretStoreError> {
    let cipher = local_cipher()?;

    let mut nonce_bytes = [0u8; 12];
    rand::rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from(nonce_bytes);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|err| SecretStoreError::Crypto(err.to_string()))?;
    Ok((nonce_bytes, ciphertext))
}

fn unseal(nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, SecretStoreError> {
    if nonce.len() != 12 {
        return Err(SecretStoreError::Crypto(
            "invalid nonce length for chacha20poly1305".to_string(),
        ));
    }
    let cipher = local_cipher()?;
    let mut nonce_array = [0u8; 12];
    nonce_array.copy_from_slice(nonce);
    cipher
        .decrypt(&Nonce::from(nonce_array), ciphertext)
        .map_err(|err| SecretStoreError::Crypto(err.to_string()))
}

fn local_cipher() -> Result<ChaCha20Poly1305, SecretStoreError> {
    let key = get_or_create_master_key()?;
    ChaCha20Poly1305::new_from_slice(&key).map_err(|err| SecretStoreError::Crypto(err.to_string()))
}

fn get_or_create_master_key() -> Result<[u8; 32], SecretStoreError> {
    let path = master_key_path();
    if path.exists() {
        let bytes = fs::read(&path)?;
        if bytes.len() == 32 {
            let mut key = [0u8; 32];
            key.copy_from_slice(&bytes);
            return Ok(key);
        }
        warn!(
            path = %path.display(),
            length = bytes.len(),
            "master key had unexpected length; regenerating"
        );
    }

    let mut key = [0u8; 32];
    rand::rng().fill_bytes(&mut key);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    write_key_file(&path, &key)?;
    Ok(key)
}

fn write_key_file(path: &PathBuf, key: &[u8]) -> Result<(), SecretStoreError> {
    let mut file = fs::File::create(path)?;
    file.write_all(key)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
    }
    Ok(())
}

fn master_key_path() -> PathBuf {
    config_directory().join(MASTER_KEY_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_rejects_empty_secret() {
        let err = store("api_key", "   ").unwrap_err();
        assert!(matches!(err, SecretStoreError::Crypto(_)));
    }

    #[test]
    fn test_seal_unseal_round_trip() {
        let (nonce, ciphertext) = seal(b"sk-test-credential").expect("seal");
        let plaintext = unseal(&nonce, &ciphertext).expect("unseal");
        assert_eq!(plaintext, b"sk-test-credential");
    }

    #[test]
    fn test_unseal_rejects_bad_nonce_length() {
        let err = unseal(&[0u8; 5], b"irrelevant").unwrap_err();
        assert!(matches!(err, SecretStoreError::Crypto(_)));
    }

    #[test]
    fn test_local_reference_survives_serde() {
        let reference = SecretReference::LocalEncrypted {
            nonce: STANDARD.encode([0u8; 12]),
            ciphertext: STANDARD.encode(b"blob"),
        };
        let json = serde_json::to_string(&reference).expect("serialize");
        assert!(json.contains("local-encrypted"));
        let parsed: SecretReference = serde_json::from_str(&json).expect("parse");
        assert_eq!(parsed, reference);
    }
}
