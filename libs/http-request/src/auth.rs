//! `Authorization` header normalization.

const BEARER_PREFIX: &str = "Bearer ";
const BASIC_PREFIX: &str = "Basic ";

/// Turn a caller-supplied credential into an `Authorization` header value.
///
/// Values already carrying a `Bearer ` or `Basic ` prefix (exact, case
/// sensitive) pass through untouched. Anything else is treated as a bearer
/// token.
#[must_use]
pub fn normalize_authorization(value: &str) -> String {
    if value.starts_with(BEARER_PREFIX) || value.starts_with(BASIC_PREFIX) {
        value.to_owned()
    } else {
        format!("{BEARER_PREFIX}{value}")
    }
}
