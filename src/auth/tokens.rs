use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use super::claims::ResetClaims;
use crate::{config::ResetTokenConfig, state::AppState};

/// Signing and verification keys for password-reset tokens.
#[derive(Clone)]
pub struct ResetKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

impl From<&ResetTokenConfig> for ResetKeys {
    fn from(cfg: &ResetTokenConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::seconds(cfg.ttl_seconds),
        }
    }
}

impl FromRef<AppState> for ResetKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::from(&state.config.reset)
    }
}

impl ResetKeys {
    pub fn sign(&self, user_id: i64) -> anyhow::Result<String> {
        self.sign_at(user_id, OffsetDateTime::now_utc())
    }

    pub fn sign_at(&self, user_id: i64, issued_at: OffsetDateTime) -> anyhow::Result<String> {
        let exp = issued_at + self.ttl;
        let claims = ResetClaims {
            user_id,
            iat: issued_at.unix_timestamp().max(0) as usize,
            exp: exp.unix_timestamp().max(0) as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id, "reset token signed");
        Ok(token)
    }

    /// Rejects bad signatures, foreign issuer/audience and anything past `exp`.
    pub fn verify(&self, token: &str) -> anyhow::Result<ResetClaims> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<ResetClaims>(token, &self.decoding, &validation)?;
        debug!(user_id = data.claims.user_id, "reset token verified");
        Ok(data.claims)
    }
}
