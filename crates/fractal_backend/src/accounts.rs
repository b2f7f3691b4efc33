use fractal_domain::OwnerId;
use rand::{RngCore as _, rngs::OsRng};

const PASSWORD_KEY_CONTEXT: &str = "fractal 2026-10-19 account password v1";

/// A registered user. `owner_id` is the key every project row is scoped to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Account {
    pub owner_id: OwnerId,
    pub email: String,
}

pub(crate) struct PasswordHash {
    pub(crate) salt: String,
    pub(crate) hash: String,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

pub(crate) fn hash_password(password: &str) -> PasswordHash {
    let mut salt = [0u8; 16];
    OsRng.fill_bytes(&mut salt);
    let salt = salt.iter().map(|b| format!("{b:02x}")).collect::<String>();
    let hash = derive_password_key(&salt, password).to_hex().to_string();
    PasswordHash { salt, hash }
}

pub(crate) fn verify_password(salt: &str, expected_hash: &str, password: &str) -> bool {
    let Ok(expected) = blake3::Hash::from_hex(expected_hash) else {
        return false;
    };
    // `blake3::Hash` equality is constant time.
    derive_password_key(salt, password) == expected
}

fn derive_password_key(salt: &str, password: &str) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new_derive_key(PASSWORD_KEY_CONTEXT);
    hasher.update(salt.as_bytes());
    hasher.update(&[0]);
    hasher.update(password.as_bytes());
    hasher.finalize()
}
