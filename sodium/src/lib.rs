//! The native binding object for libsodium.
//!
//! Everything above this crate talks to libsodium through the [Sodium] trait: the guarded
//! allocator, the memory guard calls and the random number generator. [LibSodium] is the
//! production implementation; it can only be obtained through [LibSodium::init], which makes
//! sure `sodium_init` ran before any other libsodium function is used.
//!
//! Algorithm bindings additionally use [LibSodium] as the token proving initialisation.

use libsodium_sys as libsodium;

use log::{error, trace};
use thiserror::Error;

mod native;
pub use native::{Sodium, Status};

/// Errors raised while initialising libsodium
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SodiumError {
    #[error("Error in libsodium's sodium_init (status {0}).")]
    Init(Status),
}

/// [Sodium] implementation that calls into the linked libsodium
#[derive(Clone, Copy, Debug)]
pub struct LibSodium {
    _initialized: (),
}

impl LibSodium {
    /// Initialize libsodium and return a handle to it.
    ///
    /// Calling this multiple times is fine; libsodium keeps track of its own initialisation.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use sodalock_sodium::{LibSodium, Sodium};
    /// let sodium = LibSodium::init()?;
    /// let mut buf = [0u8; 16];
    /// sodium.randombytes_buf(&mut buf);
    /// # Ok::<(), sodalock_sodium::SodiumError>(())
    /// ```
    pub fn init() -> Result<Self, SodiumError> {
        trace!("initializing libsodium");
        // 0 on success, 1 if already initialized, -1 on failure
        let status = unsafe { libsodium::sodium_init() };
        if status < 0 {
            error!("Error in libsodium's sodium_init.");
            return Err(SodiumError::Init(status));
        }
        Ok(Self { _initialized: () })
    }

    /// The version string of the linked libsodium
    pub fn version(&self) -> &'static str {
        let raw = unsafe { std::ffi::CStr::from_ptr(libsodium::sodium_version_string()) };
        raw.to_str().unwrap_or("<unknown>")
    }

    /// Returns `len` bytes from libsodium's CSPRNG
    pub fn random_bytes(&self, len: usize) -> Vec<u8> {
        let mut buf = vec![0u8; len];
        self.randombytes_buf(&mut buf);
        buf
    }
}
