// ABOUTME: RSA signing key for RS256 access tokens and its JWKS publication
// ABOUTME: Loads a PKCS#8 PEM key from disk or generates one at startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Signing key management
//!
//! The server signs every access token with a single RSA key. Resource servers
//! fetch the public half from `/.well-known/jwks.json` and match it by `kid`.
//!
//! ```rust,no_run
//! use oauth2_entitlements::keys::SigningKey;
//!
//! # fn example() -> oauth2_entitlements::errors::AppResult<()> {
//! let key = SigningKey::generate("key_2025_01", 2048)?;
//! let jwks = key.jwks();
//! assert_eq!(jwks.keys[0].kid, "key_2025_01");
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::Path;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{DecodingKey, EncodingKey};
use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::{AppError, AppResult};

/// Smallest modulus accepted for RS256
const MIN_RSA_KEY_SIZE: usize = 2048;

/// JWK (JSON Web Key) representation for JWKS endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonWebKey {
    /// Key type (always "RSA" for RS256)
    pub kty: String,
    /// Public key use (always "sig" for signature)
    #[serde(rename = "use")]
    pub key_use: String,
    /// Key ID matched against the token header
    pub kid: String,
    /// Algorithm (RS256)
    pub alg: String,
    /// RSA modulus (base64url encoded)
    pub n: String,
    /// RSA exponent (base64url encoded)
    pub e: String,
}

/// JWKS (JSON Web Key Set) container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonWebKeySet {
    /// Array of public keys
    pub keys: Vec<JsonWebKey>,
}

/// RSA key pair used to sign access tokens
#[derive(Clone)]
pub struct SigningKey {
    kid: String,
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("bits", &(self.public_key.size() * 8))
            .finish_non_exhaustive()
    }
}

impl SigningKey {
    /// Generate a fresh key pair
    ///
    /// # Errors
    ///
    /// Returns an error if the size is below 2048 bits or generation fails
    pub fn generate(kid: &str, key_size_bits: usize) -> AppResult<Self> {
        if key_size_bits < MIN_RSA_KEY_SIZE {
            return Err(AppError::config(format!(
                "RSA key size {key_size_bits} is below the {MIN_RSA_KEY_SIZE}-bit minimum"
            )));
        }
        let private_key = RsaPrivateKey::new(&mut OsRng, key_size_bits)
            .map_err(|e| AppError::crypto(format!("Failed to generate RSA private key: {e}")))?;
        Self::from_private_key(kid, private_key)
    }

    /// Import a PKCS#8 PEM private key
    ///
    /// # Errors
    ///
    /// Returns an error if the PEM cannot be parsed
    pub fn from_pkcs8_pem(kid: &str, pem: &str) -> AppResult<Self> {
        let private_key = RsaPrivateKey::from_pkcs8_pem(pem)
            .map_err(|e| AppError::crypto(format!("Failed to parse private key PEM: {e}")))?;
        Self::from_private_key(kid, private_key)
    }

    /// Read the key at `path`, or generate one when no path is configured
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or generation fails
    pub async fn load_or_generate(
        path: Option<&Path>,
        kid: &str,
        key_size_bits: usize,
    ) -> AppResult<Self> {
        if let Some(path) = path {
            let pem = tokio::fs::read_to_string(path).await.map_err(|e| {
                AppError::config(format!("Failed to read signing key {}", path.display()))
                    .with_source(e)
            })?;
            let key = Self::from_pkcs8_pem(kid, &pem)?;
            info!(kid = %kid, path = %path.display(), "Loaded signing key");
            return Ok(key);
        }

        warn!(
            kid = %kid,
            bits = key_size_bits,
            "SIGNING_KEY_PATH not set, generating an ephemeral signing key"
        );
        // RSA generation is CPU bound
        let kid = kid.to_owned();
        tokio::task::spawn_blocking(move || Self::generate(&kid, key_size_bits))
            .await
            .map_err(|e| AppError::internal(format!("Key generation task failed: {e}")))?
    }

    fn from_private_key(kid: &str, private_key: RsaPrivateKey) -> AppResult<Self> {
        let public_key = RsaPublicKey::from(&private_key);

        let private_pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| AppError::crypto(format!("Failed to export private key as PEM: {e}")))?;
        let encoding_key = EncodingKey::from_rsa_pem(private_pem.as_bytes())
            .map_err(|e| AppError::crypto(format!("Failed to create encoding key: {e}")))?;

        let public_pem = public_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| AppError::crypto(format!("Failed to export public key as PEM: {e}")))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_pem.as_bytes())
            .map_err(|e| AppError::crypto(format!("Failed to create decoding key: {e}")))?;

        Ok(Self {
            kid: kid.to_owned(),
            private_key,
            public_key,
            encoding_key,
            decoding_key,
        })
    }

    /// Key identifier written to the JWT `kid` header
    #[must_use]
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// Key for signing tokens
    #[must_use]
    pub const fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    /// Key for verifying tokens this server signed
    #[must_use]
    pub const fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }

    /// Export the private key as PKCS#8 PEM
    ///
    /// # Errors
    ///
    /// Returns an error if PEM encoding fails
    pub fn export_private_key_pem(&self) -> AppResult<String> {
        self.private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map(|pem| pem.to_string())
            .map_err(|e| AppError::crypto(format!("Failed to export private key as PEM: {e}")))
    }

    /// Export the public key as SPKI PEM
    ///
    /// # Errors
    ///
    /// Returns an error if PEM encoding fails
    pub fn export_public_key_pem(&self) -> AppResult<String> {
        self.public_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| AppError::crypto(format!("Failed to export public key as PEM: {e}")))
    }

    /// Public key in JWK form
    #[must_use]
    pub fn to_jwk(&self) -> JsonWebKey {
        let n = URL_SAFE_NO_PAD.encode(self.public_key.n().to_bytes_be());
        let e = URL_SAFE_NO_PAD.encode(self.public_key.e().to_bytes_be());

        JsonWebKey {
            kty: "RSA".to_owned(),
            key_use: "sig".to_owned(),
            kid: self.kid.clone(),
            alg: "RS256".to_owned(),
            n,
            e,
        }
    }

    /// Key set published at `/.well-known/jwks.json`
    #[must_use]
    pub fn jwks(&self) -> JsonWebKeySet {
        JsonWebKeySet {
            keys: vec![self.to_jwk()],
        }
    }
}
