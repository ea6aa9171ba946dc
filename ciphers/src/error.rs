use std::os::raw::c_int;

use thiserror::Error;

use sodalock_secret_memory::GuardedError;

use crate::validate::ValidationError;

/// Errors raised by the algorithm bindings
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoError {
    /// An argument had the wrong length; nothing was allocated or called
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Guarded memory could not be allocated or (un)protected
    #[error(transparent)]
    Memory(#[from] GuardedError),

    /// libsodium rejected valid arguments, e.g. a forged ciphertext
    #[error("Error in libsodium's {operation} (status {status}).")]
    Native {
        operation: &'static str,
        status: c_int,
    },
}
