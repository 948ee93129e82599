//! Access-key verification for the batch endpoint.

use hyper::http::header::AUTHORIZATION;
use hyper::http::HeaderMap;

/// Extract the bearer token from the Authorization header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Constant-time access-key comparison.
///
/// Lengths are compared first; content comparison then touches every byte
/// so timing does not depend on the position of the first mismatch.
pub fn verify_access_key(supplied: &str, expected: &str) -> bool {
    let supplied = supplied.as_bytes();
    let expected = expected.as_bytes();
    if supplied.len() != expected.len() {
        return false;
    }

    let mut diff = 0u8;
    for (a, b) in supplied.iter().zip(expected) {
        diff |= a ^ b;
    }
    diff == 0
}
