//! BLAKE2b hashing, optionally keyed

use std::ffi::c_ulonglong;
use std::ptr::null;

use libsodium_sys as libsodium;

use sodalock_secret_memory::SecureKey;

use crate::validate::check_in_range;
use crate::{CryptoError, LibSodium};

#[derive(Debug, Clone, Copy)]
pub struct GenericHash {
    sodium: LibSodium,
}

impl GenericHash {
    pub fn new(sodium: LibSodium) -> Self {
        Self { sodium }
    }

    /// Default output length
    pub fn bytes(&self) -> usize {
        unsafe { libsodium::crypto_generichash_bytes() }
    }

    pub fn bytes_min(&self) -> usize {
        unsafe { libsodium::crypto_generichash_bytes_min() }
    }

    pub fn bytes_max(&self) -> usize {
        unsafe { libsodium::crypto_generichash_bytes_max() }
    }

    /// Default key length
    pub fn key_bytes(&self) -> usize {
        unsafe { libsodium::crypto_generichash_keybytes() }
    }

    pub fn key_bytes_min(&self) -> usize {
        unsafe { libsodium::crypto_generichash_keybytes_min() }
    }

    pub fn key_bytes_max(&self) -> usize {
        unsafe { libsodium::crypto_generichash_keybytes_max() }
    }

    pub fn keygen(&self) -> Result<SecureKey, CryptoError> {
        let mut key = SecureKey::alloc(self.sodium, self.key_bytes())?;
        key.run_unlocked_mut(|k| {
            unsafe { libsodium::crypto_generichash_keygen(k.as_mut_ptr()) };
            Ok::<_, CryptoError>(())
        })?;
        Ok(key)
    }

    /// Hashes `message` into `out_len` bytes, [Self::bytes] if not given.
    ///
    /// With a key the result is a MAC; the key is only readable while libsodium uses it.
    pub fn hash(
        &self,
        message: &[u8],
        out_len: Option<usize>,
        key: Option<&mut SecureKey>,
    ) -> Result<Vec<u8>, CryptoError> {
        let out_len = out_len.unwrap_or_else(|| self.bytes());
        check_in_range(out_len, self.bytes_min(), self.bytes_max(), "outLen")?;
        if let Some(key) = &key {
            check_in_range(key.len(), self.key_bytes_min(), self.key_bytes_max(), "key")?;
        }

        let mut digest = vec![0u8; out_len];
        let mut digest_into = |key_ptr: *const u8, key_len: usize| {
            sodium_call!(
                crypto_generichash,
                digest.as_mut_ptr(),
                digest.len(),
                message.as_ptr(),
                message.len() as c_ulonglong,
                key_ptr,
                key_len
            )
        };
        match key {
            Some(key) => key.run_unlocked(|k| digest_into(k.as_ptr(), k.len()))?,
            None => digest_into(null(), 0)?,
        }
        Ok(digest)
    }
}
