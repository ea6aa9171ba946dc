//! Subkey derivation from a master key

use libsodium_sys as libsodium;

use sodalock_secret_memory::SecureKey;

use crate::validate::{check_in_range, check_is_same};
use crate::{CryptoError, LibSodium};

#[derive(Debug, Clone, Copy)]
pub struct Kdf {
    sodium: LibSodium,
}

impl Kdf {
    pub fn new(sodium: LibSodium) -> Self {
        Self { sodium }
    }

    pub fn bytes_min(&self) -> usize {
        unsafe { libsodium::crypto_kdf_bytes_min() }
    }

    pub fn bytes_max(&self) -> usize {
        unsafe { libsodium::crypto_kdf_bytes_max() }
    }

    pub fn context_bytes(&self) -> usize {
        unsafe { libsodium::crypto_kdf_contextbytes() }
    }

    pub fn key_bytes(&self) -> usize {
        unsafe { libsodium::crypto_kdf_keybytes() }
    }

    /// Generates a fresh random master key
    pub fn keygen(&self) -> Result<SecureKey, CryptoError> {
        let mut key = SecureKey::alloc(self.sodium, self.key_bytes())?;
        key.run_unlocked_mut(|k| {
            unsafe { libsodium::crypto_kdf_keygen(k.as_mut_ptr()) };
            Ok::<_, CryptoError>(())
        })?;
        Ok(key)
    }

    /// Derives subkey number `subkey_id` of `master_key` under `context`.
    ///
    /// The context is exactly [Self::context_bytes] bytes long. The subkey is written
    /// straight into guarded memory and returned inaccessible.
    pub fn derive_from_key(
        &self,
        master_key: &mut SecureKey,
        subkey_len: usize,
        subkey_id: u64,
        context: &str,
    ) -> Result<SecureKey, CryptoError> {
        check_in_range(subkey_len, self.bytes_min(), self.bytes_max(), "subkeyLen")?;
        check_is_same(context.len(), self.context_bytes(), "context")?;
        check_is_same(master_key.len(), self.key_bytes(), "key")?;

        let mut subkey = SecureKey::alloc(self.sodium, subkey_len)?;
        master_key.run_unlocked(|master| {
            subkey.run_unlocked_mut(|sub| {
                sodium_call!(
                    crypto_kdf_derive_from_key,
                    sub.as_mut_ptr(),
                    sub.len(),
                    subkey_id,
                    context.as_ptr().cast(),
                    master.as_ptr()
                )
            })
        })?;
        Ok(subkey)
    }
}
