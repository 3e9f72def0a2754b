//! AEAD envelope for session identifiers
//!
//! A token is `hex(nonce ‖ ciphertext ‖ tag)` with a 12-byte nonce drawn from
//! the OS RNG per call and a 16-byte GCM authentication tag. Decryption fails
//! closed: malformed input and tampered input both come back as `None`.

use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes128Gcm, Aes256Gcm};
use async_trait::async_trait;
use std::fmt;

use crate::error::SessionError;

/// Nonce length in bytes
pub const NONCE_LEN: usize = 12;

/// Authentication tag length in bytes
pub const TAG_LEN: usize = 16;

/// Environment variable read by [`Encryption::from_default_env`]
pub const DEFAULT_KEY_VAR: &str = "ENCRYPTION_KEY";

/// Encrypt/decrypt pair used by the session manager.
///
/// [`Encryption`] is the built-in implementation. Anything else with the same
/// contract (a KMS client, an HSM) can be plugged in instead, as long as
/// `decrypt` reports every invalid input as `None` rather than failing.
#[async_trait]
pub trait TokenCipher: Send + Sync + 'static {
    /// Wrap a plaintext into a token that is safe to hand to a client
    async fn encrypt(&self, plaintext: &str) -> Result<String, SessionError>;

    /// Unwrap a token, or `None` if it is malformed or was tampered with
    async fn decrypt(&self, token: &str) -> Option<String>;
}

/// Supported AEAD ciphers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Algorithm {
    /// AES-128-GCM, 16-byte key
    Aes128Gcm,
    /// AES-256-GCM, 32-byte key
    #[default]
    Aes256Gcm,
}

impl Algorithm {
    /// Required key length in bytes
    pub fn key_len(self) -> usize {
        match self {
            Algorithm::Aes128Gcm => 16,
            Algorithm::Aes256Gcm => 32,
        }
    }
}

/// Why a token could not be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecryptError {
    /// Not hex, too short, or not UTF-8 once opened
    Malformed,
    /// The authentication tag did not verify
    Authentication,
}

impl fmt::Display for DecryptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecryptError::Malformed => f.write_str("malformed token"),
            DecryptError::Authentication => f.write_str("token failed authentication"),
        }
    }
}

impl std::error::Error for DecryptError {}

#[derive(Clone)]
enum Cipher {
    Aes128(Aes128Gcm),
    Aes256(Box<Aes256Gcm>),
}

/// Built-in AES-GCM token cipher
#[derive(Clone)]
pub struct Encryption {
    cipher: Cipher,
    algorithm: Algorithm,
}

impl Encryption {
    /// Create an engine from raw key bytes.
    ///
    /// Fails with [`SessionError::Configuration`] when the key length does not
    /// match `algorithm`.
    pub fn new(key: &[u8], algorithm: Algorithm) -> Result<Self, SessionError> {
        if key.len() != algorithm.key_len() {
            return Err(SessionError::Configuration(format!(
                "{:?} requires a {}-byte key, got {} bytes",
                algorithm,
                algorithm.key_len(),
                key.len()
            )));
        }
        let cipher = match algorithm {
            Algorithm::Aes128Gcm => Aes128Gcm::new_from_slice(key).map(Cipher::Aes128),
            Algorithm::Aes256Gcm => {
                Aes256Gcm::new_from_slice(key).map(|c| Cipher::Aes256(Box::new(c)))
            }
        }
        .map_err(|_| SessionError::Configuration("invalid key length".to_string()))?;
        Ok(Self { cipher, algorithm })
    }

    /// Create an engine from a hex-encoded key
    pub fn from_hex(key_hex: &str, algorithm: Algorithm) -> Result<Self, SessionError> {
        let key = hex::decode(key_hex.trim())?;
        Self::new(&key, algorithm)
    }

    /// Load a hex-encoded AES-256 key from the environment variable `var`.
    ///
    /// A `.env` file in the working directory is consulted as well.
    pub fn from_env(var: &str) -> Result<Self, SessionError> {
        let key_hex = dotenvy::var(var).map_err(|_| {
            SessionError::Configuration(format!("environment variable {} is not set", var))
        })?;
        if key_hex.trim().is_empty() {
            return Err(SessionError::Configuration(format!(
                "environment variable {} is empty",
                var
            )));
        }
        Self::from_hex(&key_hex, Algorithm::Aes256Gcm)
    }

    /// [`Encryption::from_env`] with `ENCRYPTION_KEY`
    pub fn from_default_env() -> Result<Self, SessionError> {
        Self::from_env(DEFAULT_KEY_VAR)
    }

    /// The configured cipher
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Seal `plaintext` into a hex token
    pub fn seal(&self, plaintext: &str) -> Result<String, SessionError> {
        let (nonce, sealed) = match &self.cipher {
            Cipher::Aes128(c) => {
                let nonce = Aes128Gcm::generate_nonce(&mut OsRng);
                (nonce, c.encrypt(&nonce, plaintext.as_bytes()))
            }
            Cipher::Aes256(c) => {
                let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
                (nonce, c.encrypt(&nonce, plaintext.as_bytes()))
            }
        };
        // aes-gcm appends the tag to the ciphertext
        let sealed = sealed.map_err(|e| SessionError::Encryption(e.to_string()))?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(nonce.as_slice());
        out.extend_from_slice(&sealed);
        Ok(hex::encode(out))
    }

    /// Open a token, reporting why it was rejected
    pub fn open(&self, token: &str) -> Result<String, DecryptError> {
        let bytes = hex::decode(token).map_err(|_| DecryptError::Malformed)?;
        if bytes.len() < NONCE_LEN + TAG_LEN {
            return Err(DecryptError::Malformed);
        }

        let (nonce, sealed) = bytes.split_at(NONCE_LEN);
        let nonce = GenericArray::from_slice(nonce);
        let opened = match &self.cipher {
            Cipher::Aes128(c) => c.decrypt(nonce, sealed),
            Cipher::Aes256(c) => c.decrypt(nonce, sealed),
        }
        .map_err(|_| DecryptError::Authentication)?;

        String::from_utf8(opened).map_err(|_| DecryptError::Malformed)
    }
}

impl fmt::Debug for Encryption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encryption")
            .field("algorithm", &self.algorithm)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl TokenCipher for Encryption {
    async fn encrypt(&self, plaintext: &str) -> Result<String, SessionError> {
        self.seal(plaintext)
    }

    async fn decrypt(&self, token: &str) -> Option<String> {
        match self.open(token) {
            Ok(plaintext) => Some(plaintext),
            Err(reason) => {
                tracing::debug!(%reason, token_len = token.len(), "rejected session token");
                None
            }
        }
    }
}
