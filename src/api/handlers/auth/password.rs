//! Password hashing for stored credentials.

use bcrypt::BcryptError;

/// Work factor matching the stored hashes.
pub(crate) const HASH_COST: u32 = 10;

pub(crate) fn hash_senha(senha: &str) -> Result<String, BcryptError> {
    bcrypt::hash(senha, HASH_COST)
}

pub(crate) fn verify_senha(senha: &str, hashed: &str) -> bool {
    bcrypt::verify(senha, hashed).unwrap_or(false)
}

/// Credential for roster-only members (no login possible).
///
/// The hash of the empty string is unsatisfiable in practice: login
/// rejects empty passwords before comparing, and no non-empty password
/// matches it.
pub(crate) fn roster_only_credential() -> Result<String, BcryptError> {
    bcrypt::hash("", HASH_COST)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hashed = hash_senha("Abcdef1!").unwrap();
        assert!(verify_senha("Abcdef1!", &hashed));
        assert!(!verify_senha("Abcdef1?", &hashed));
    }

    #[test]
    fn roster_credential_rejects_any_password() {
        let hashed = roster_only_credential().unwrap();
        for attempt in ["Abcdef1!", "password", " "] {
            assert!(!verify_senha(attempt, &hashed));
        }
    }

    #[test]
    fn verify_tolerates_garbage_hashes() {
        assert!(!verify_senha("Abcdef1!", "not-a-bcrypt-hash"));
    }
}
