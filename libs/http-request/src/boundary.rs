use uuid::Uuid;

/// Generate a multipart boundary token.
///
/// The token is derived from a random v4 UUID, so collisions with field
/// content are not a practical concern.
#[must_use]
pub fn generate_boundary() -> String {
    format!("--------------------------{}", Uuid::new_v4().simple())
}
