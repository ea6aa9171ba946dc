//! Authenticated encryption with associated data.
//! XChaCha20-Poly1305 (IETF construction) is used.

use std::ffi::c_ulonglong;
use std::ptr::{null, null_mut};

use libsodium_sys as libsodium;

use sodalock_secret_memory::{GuardedPtr, Protection, SecureKey};

use crate::validate::{check_at_least, check_at_most, check_is_same};
use crate::{CryptoError, LibSodium};

/// Combined mode XChaCha20-Poly1305: the tag is appended to the ciphertext
#[derive(Debug, Clone, Copy)]
pub struct XChaCha20Poly1305Ietf {
    sodium: LibSodium,
}

impl XChaCha20Poly1305Ietf {
    pub fn new(sodium: LibSodium) -> Self {
        Self { sodium }
    }

    pub fn key_bytes(&self) -> usize {
        unsafe { libsodium::crypto_aead_xchacha20poly1305_ietf_keybytes() }
    }

    pub fn nonce_bytes(&self) -> usize {
        unsafe { libsodium::crypto_aead_xchacha20poly1305_ietf_npubbytes() }
    }

    /// Length of the authentication tag
    pub fn a_bytes(&self) -> usize {
        unsafe { libsodium::crypto_aead_xchacha20poly1305_ietf_abytes() }
    }

    pub fn message_bytes_max(&self) -> usize {
        unsafe { libsodium::crypto_aead_xchacha20poly1305_ietf_messagebytes_max() }
    }

    /// Generates a fresh random key
    pub fn keygen(&self) -> Result<SecureKey, CryptoError> {
        let mut key = SecureKey::alloc(self.sodium, self.key_bytes())?;
        key.run_unlocked_mut(|k| {
            unsafe { libsodium::crypto_aead_xchacha20poly1305_ietf_keygen(k.as_mut_ptr()) };
            Ok::<_, CryptoError>(())
        })?;
        Ok(key)
    }

    /// Encrypts `message`; the result is `a_bytes()` longer than the message
    pub fn encrypt(
        &self,
        message: &[u8],
        nonce: &[u8],
        key: &mut SecureKey,
        additional_data: Option<&[u8]>,
    ) -> Result<Vec<u8>, CryptoError> {
        check_at_most(message.len(), self.message_bytes_max(), "message")?;
        check_is_same(nonce.len(), self.nonce_bytes(), "nonce")?;
        check_is_same(key.len(), self.key_bytes(), "key")?;

        let ad = additional_data.unwrap_or_default();
        let mut ciphertext = vec![0u8; message.len() + self.a_bytes()];
        let mut clen: c_ulonglong = 0;
        key.run_unlocked(|k| {
            sodium_call!(
                crypto_aead_xchacha20poly1305_ietf_encrypt,
                ciphertext.as_mut_ptr(),
                &mut clen,
                message.as_ptr(),
                message.len() as c_ulonglong,
                ad.as_ptr(),
                ad.len() as c_ulonglong,
                null(), // nsec is not used
                nonce.as_ptr(),
                k.as_ptr()
            )
        })?;
        debug_assert_eq!(clen as usize, ciphertext.len());
        Ok(ciphertext)
    }

    /// Verifies and decrypts `ciphertext` into a fresh read-write guarded region
    pub fn decrypt(
        &self,
        ciphertext: &[u8],
        nonce: &[u8],
        key: &mut SecureKey,
        additional_data: Option<&[u8]>,
    ) -> Result<GuardedPtr<'static, u8>, CryptoError> {
        check_at_least(ciphertext.len(), self.a_bytes(), "ciphertext")?;
        check_is_same(nonce.len(), self.nonce_bytes(), "nonce")?;
        check_is_same(key.len(), self.key_bytes(), "key")?;

        let ad = additional_data.unwrap_or_default();
        // Freed on drop if decryption fails
        let mut plaintext = GuardedPtr::<u8>::alloc(
            self.sodium,
            ciphertext.len() - self.a_bytes(),
            Protection::ReadWrite,
            false,
        )?;
        let mut mlen: c_ulonglong = 0;
        key.run_unlocked(|k| {
            sodium_call!(
                crypto_aead_xchacha20poly1305_ietf_decrypt,
                plaintext.as_mut_ptr(),
                &mut mlen,
                null_mut(), // nsec is not used
                ciphertext.as_ptr(),
                ciphertext.len() as c_ulonglong,
                ad.as_ptr(),
                ad.len() as c_ulonglong,
                nonce.as_ptr(),
                k.as_ptr()
            )
        })?;
        debug_assert_eq!(mlen as usize, plaintext.len());
        Ok(plaintext)
    }
}
