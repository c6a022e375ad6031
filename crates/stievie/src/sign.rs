//! Request signing for the Vinson API.
//!
//! Every authenticated call carries a `sig` parameter: the lowercase hex
//! SHA-1 of the form body, the endpoint path and a shared salt. The salt must
//! match the backend byte for byte; any deviation invalidates every call.

use sha1::{Digest, Sha1};

const SIGNING_SALT: &str = "g6TTAK7kiL6tusOEfwje";

/// Lowercase hex SHA-1 of `input`.
pub fn sha1_hex(input: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Sign a form body for an API endpoint.
///
/// The signature covers the body without its trailing separator, followed by
/// `&`, the endpoint path (relative, e.g. `User/LogOn`) and the salt. It is
/// appended to the body as a final `sig` parameter.
pub fn sign_request_data(endpoint: &str, body: &str) -> String {
    let body = body.trim_end_matches('&');
    let signature = sha1_hex(&format!("{body}&{endpoint}{SIGNING_SALT}"));
    format!("{body}&sig={signature}")
}
