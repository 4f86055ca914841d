use std::time::Duration;

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::config::TokenConfig;

/// Purpose baked into every token so a session token can never stand in
/// for a reset token, even if the two secrets are configured identically.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenPurpose {
    Session,
    Reset,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,             // user ID
    pub exp: usize,            // expiration time
    pub iat: usize,            // issued at
    pub iss: String,           // issuer
    pub aud: String,           // audience
    pub purpose: TokenPurpose, // session or reset
}

/// Signing and verification keys, one pair per token purpose.
#[derive(Clone)]
pub struct TokenKeys {
    pub session_encoding: EncodingKey,
    pub session_decoding: DecodingKey,
    pub reset_encoding: EncodingKey,
    pub reset_decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub session_ttl: Duration,
    pub reset_ttl: Duration,
}

impl TokenKeys {
    pub fn from_config(cfg: &TokenConfig) -> Self {
        Self {
            session_encoding: EncodingKey::from_secret(cfg.session_secret.as_bytes()),
            session_decoding: DecodingKey::from_secret(cfg.session_secret.as_bytes()),
            reset_encoding: EncodingKey::from_secret(cfg.reset_secret.as_bytes()),
            reset_decoding: DecodingKey::from_secret(cfg.reset_secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            session_ttl: Duration::from_secs((cfg.session_ttl_hours as u64) * 3600),
            reset_ttl: Duration::from_secs((cfg.reset_ttl_minutes as u64) * 60),
        }
    }

    fn sign_with_purpose(&self, user_id: Uuid, purpose: TokenPurpose) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let (encoding, ttl) = match purpose {
            TokenPurpose::Session => (&self.session_encoding, self.session_ttl),
            TokenPurpose::Reset => (&self.reset_encoding, self.reset_ttl),
        };
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            purpose,
        };
        let token = encode(&Header::default(), &claims, encoding)?;
        debug!(user_id = %user_id, purpose = ?purpose, "token signed");
        Ok(token)
    }

    pub fn sign_session(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.sign_with_purpose(user_id, TokenPurpose::Session)
    }
    pub fn sign_reset(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.sign_with_purpose(user_id, TokenPurpose::Reset)
    }

    fn verify_with_purpose(&self, token: &str, purpose: TokenPurpose) -> anyhow::Result<Claims> {
        let decoding = match purpose {
            TokenPurpose::Session => &self.session_decoding,
            TokenPurpose::Reset => &self.reset_decoding,
        };
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, decoding, &validation)?;
        if data.claims.purpose != purpose {
            anyhow::bail!("token purpose mismatch");
        }
        debug!(user_id = %data.claims.sub, purpose = ?purpose, "token verified");
        Ok(data.claims)
    }

    pub fn verify_session(&self, token: &str) -> anyhow::Result<Claims> {
        self.verify_with_purpose(token, TokenPurpose::Session)
    }
    pub fn verify_reset(&self, token: &str) -> anyhow::Result<Claims> {
        self.verify_with_purpose(token, TokenPurpose::Reset)
    }
}
