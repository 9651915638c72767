//! Cosmos DB master-key request signing.
//!
//! The REST API authorizes each request with a URL-encoded
//! `type=master&ver=1.0&sig=<signature>` token, where the signature is an
//! HMAC-SHA256 over `{verb}\n{resource type}\n{resource link}\n{date}\n\n`
//! (verb and date lowercased) keyed with the account's master key.

use crate::error::{MigrateError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// RFC-1123 date string for the `x-ms-date` header, e.g.
/// `Mon, 24 Aug 2026 12:00:00 GMT`.
pub fn request_date() -> String {
    Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Build the authorization token for one request.
///
/// `resource_link` is the path of the addressed resource without a leading
/// slash, e.g. `dbs/appdb/colls/records`; `resource_type` its last segment
/// kind (`docs`, `colls`). `date` must match the `x-ms-date` header sent
/// with the request.
pub fn master_key_token(
    verb: &str,
    resource_type: &str,
    resource_link: &str,
    date: &str,
    key: &[u8],
) -> Result<String> {
    let payload = format!(
        "{}\n{}\n{}\n{}\n\n",
        verb.to_lowercase(),
        resource_type,
        resource_link,
        date.to_lowercase()
    );

    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| MigrateError::Config(format!("Invalid master key: {}", e)))?;
    mac.update(payload.as_bytes());
    let signature = STANDARD.encode(mac.finalize().into_bytes());

    Ok(urlencoding::encode(&format!("type=master&ver=1.0&sig={}", signature)).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_signature_vector() {
        // Key is base64("topsecretmasterkey"); expected value computed with
        // a reference implementation of the Cosmos signing scheme.
        let key = STANDARD.decode("dG9wc2VjcmV0bWFzdGVya2V5").unwrap();
        let token = master_key_token(
            "POST",
            "docs",
            "dbs/appdb/colls/records",
            "Mon, 24 Aug 2026 12:00:00 GMT",
            &key,
        )
        .unwrap();
        assert_eq!(
            token,
            "type%3Dmaster%26ver%3D1.0%26sig%3Db5fiGLUMRHWCkcsvxeUCGqZX7SMSq7D046HXpj1ZMR4%3D"
        );
    }

    #[test]
    fn test_verb_case_does_not_matter() {
        let key = b"0123456789abcdef";
        let date = "Mon, 24 Aug 2026 12:00:00 GMT";
        let upper = master_key_token("GET", "colls", "dbs/a/colls/b", date, key).unwrap();
        let lower = master_key_token("get", "colls", "dbs/a/colls/b", date, key).unwrap();
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_request_date_is_rfc1123_gmt() {
        let date = request_date();
        assert!(date.ends_with(" GMT"));
        assert_eq!(date.matches(':').count(), 2);
    }
}
