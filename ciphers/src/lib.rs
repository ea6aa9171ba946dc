//! libsodium algorithm bindings on top of guarded memory.
//!
//! Every binding holds the [LibSodium] binding object and reads its size constants from
//! libsodium at call time. Public operations validate their arguments first, hand secrets
//! to libsodium only inside [SecureKey](sodalock_secret_memory::SecureKey) unlock scopes and
//! release temporary guarded memory on every exit path.

pub use sodalock_sodium::LibSodium;

/// Calls a libsodium function returning a status and maps failure to
/// [CryptoError::Native]
macro_rules! sodium_call {
    ($name:ident, $($args:expr),*) => {{
        let status = unsafe { ::libsodium_sys::$name($($args),*) };
        match status {
            0 => Ok(()),
            status => {
                ::log::error!("Error in libsodium's {}.", stringify!($name));
                Err($crate::CryptoError::Native {
                    operation: stringify!($name),
                    status,
                })
            }
        }
    }};
}

pub mod validate;

mod error;
pub use error::CryptoError;

pub mod aead;
pub mod generichash;
pub mod kdf;
pub mod pwhash;
pub mod sign;

pub use aead::XChaCha20Poly1305Ietf;
pub use generichash::GenericHash;
pub use kdf::Kdf;
pub use pwhash::Pwhash;
pub use sign::{KeyPair, Sign};

#[cfg(test)]
pub(crate) fn setup_logging() {
    let mut log_builder = env_logger::Builder::from_default_env();
    log_builder.is_test(true);
    let _ = log_builder.try_init();
}
