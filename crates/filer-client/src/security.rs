//! Delete tokens: short-lived HS256 JWTs scoped to a single file id.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use filer_types::Status;
use filer_types::status_code::{StatusCode, StorageClientCode};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::SecurityConfig;
use crate::error::ClientResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct FileIdClaims {
    fid: String,
    exp: u64,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

/// Generate the token accompanying a delete of `file_id`. An empty signing
/// key yields an empty token.
pub fn gen_delete_token(config: &SecurityConfig, file_id: &str) -> ClientResult<String> {
    gen_delete_token_until(
        &config.signing_key,
        file_id,
        unix_now() + config.expires_after.as_secs(),
    )
}

pub fn gen_delete_token_until(
    signing_key: &str,
    file_id: &str,
    expires_at: u64,
) -> ClientResult<String> {
    if signing_key.is_empty() {
        return Ok(String::new());
    }
    let claims = FileIdClaims {
        fid: file_id.to_string(),
        exp: expires_at,
    };
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key.as_bytes()),
    )
    .map_err(|e| Status::with_message(StorageClientCode::TOKEN_SIGN_FAILED, e.to_string()).into())
}

/// Check a delete token on the receiving side. Any token is accepted when the
/// signing key is empty.
pub fn verify_delete_token(signing_key: &str, file_id: &str, token: &str) -> Result<(), Status> {
    if signing_key.is_empty() {
        return Ok(());
    }
    let data = jsonwebtoken::decode::<FileIdClaims>(
        token,
        &DecodingKey::from_secret(signing_key.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| Status::with_message(StatusCode::AUTHENTICATION_FAIL, e.to_string()))?;
    if data.claims.fid != file_id {
        return Err(Status::with_message(
            StatusCode::AUTHENTICATION_FAIL,
            format!("token issued for {}, not {file_id}", data.claims.fid),
        ));
    }
    Ok(())
}
