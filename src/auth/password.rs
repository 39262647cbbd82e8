/// Work factor for the salted hash. High enough to resist offline brute
/// force while keeping registration latency acceptable.
pub const HASH_COST: u32 = 10;

/// Hash a password with a per-call random salt
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    bcrypt::hash(password, HASH_COST).map_err(|_| PasswordError::HashingFailed)
}

/// Verify a password against a stored hash.
///
/// Returns false on a plain mismatch; errors only when the stored hash
/// itself is malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    bcrypt::verify(password, hash).map_err(|_| PasswordError::InvalidHash)
}

/// Password errors
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Password hashing failed")]
    HashingFailed,
    #[error("Invalid hash format")]
    InvalidHash,
}
