//! Agent credential: service-account identity and signing key, plus the signed assertion
//! exchanged for an access token.
//!
//! Assertion format is a compact RS256 JWT: base64url(header).base64url(claims).base64url(sig).

use base64::Engine;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Lifetime requested for each assertion; the token endpoint caps it at one hour anyway.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("reading credentials from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing credentials: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("credentials missing field: {0}")]
    MissingField(&'static str),
    #[error("invalid private key: {0}")]
    InvalidKey(String),
}

/// Service-account JSON as downloaded from the cloud console. Extra fields are ignored.
#[derive(Deserialize)]
struct ServiceAccountFile {
    #[serde(default)]
    client_email: Option<String>,
    #[serde(default)]
    private_key: Option<SecretString>,
    #[serde(default)]
    project_id: Option<String>,
    #[serde(default)]
    token_uri: Option<String>,
}

/// Identity plus signing key for one agent. Immutable once loaded; the key never leaves this value.
#[derive(Clone)]
pub struct AgentCredential {
    client_email: String,
    project_id: Option<String>,
    token_uri: String,
    signing_key: SigningKey<Sha256>,
}

impl fmt::Debug for AgentCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentCredential")
            .field("client_email", &self.client_email)
            .field("project_id", &self.project_id)
            .field("token_uri", &self.token_uri)
            .field("signing_key", &"<redacted>")
            .finish()
    }
}

#[derive(Serialize)]
struct AssertionHeader<'a> {
    alg: &'a str,
    typ: &'a str,
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

impl AgentCredential {
    /// Build from identity and a PKCS#8 PEM private key. The key is parsed (and so validated) here.
    pub fn new(
        client_email: impl Into<String>,
        private_key_pem: &SecretString,
        token_uri: Option<String>,
    ) -> Result<Self, CredentialError> {
        let client_email = client_email.into();
        if client_email.trim().is_empty() {
            return Err(CredentialError::MissingField("client_email"));
        }
        let key = RsaPrivateKey::from_pkcs8_pem(private_key_pem.expose_secret())
            .map_err(|e| CredentialError::InvalidKey(e.to_string()))?;
        let token_uri = token_uri
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string());
        Ok(Self {
            client_email,
            project_id: None,
            token_uri,
            signing_key: SigningKey::<Sha256>::new(key),
        })
    }

    /// Parse a service-account JSON document.
    pub fn from_json(s: &str) -> Result<Self, CredentialError> {
        let file: ServiceAccountFile = serde_json::from_str(s)?;
        let client_email = file
            .client_email
            .ok_or(CredentialError::MissingField("client_email"))?;
        let private_key = file
            .private_key
            .ok_or(CredentialError::MissingField("private_key"))?;
        let mut credential = Self::new(client_email, &private_key, file.token_uri)?;
        credential.project_id = file.project_id.filter(|p| !p.trim().is_empty());
        Ok(credential)
    }

    /// Load a service-account JSON file.
    pub fn load(path: &Path) -> Result<Self, CredentialError> {
        let s = std::fs::read_to_string(path).map_err(|source| CredentialError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&s)
    }

    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    pub fn token_uri(&self) -> &str {
        &self.token_uri
    }

    /// Sign an assertion for `scope`, issued at `issued_at` (Unix seconds), addressed to the token uri.
    pub fn sign_assertion(&self, scope: &str, issued_at: i64) -> Result<String, CredentialError> {
        let engine = &base64::engine::general_purpose::URL_SAFE_NO_PAD;
        let header = serde_json::to_vec(&AssertionHeader {
            alg: "RS256",
            typ: "JWT",
        })?;
        let claims = serde_json::to_vec(&AssertionClaims {
            iss: &self.client_email,
            scope,
            aud: &self.token_uri,
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        })?;
        let signing_input = format!("{}.{}", engine.encode(header), engine.encode(claims));
        let sig = self.signing_key.sign(signing_input.as_bytes());
        Ok(format!("{}.{}", signing_input, engine.encode(sig.to_vec())))
    }
}
