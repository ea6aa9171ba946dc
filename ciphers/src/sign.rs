//! Ed25519 detached signatures

use std::ffi::c_ulonglong;
use std::ptr::null_mut;

use libsodium_sys as libsodium;

use sodalock_secret_memory::SecureKey;

use crate::validate::check_is_same;
use crate::{CryptoError, LibSodium};

/// An Ed25519 key pair; the secret half lives in guarded memory
#[derive(Debug)]
pub struct KeyPair {
    pub public_key: Vec<u8>,
    pub secret_key: SecureKey,
}

#[derive(Debug, Clone, Copy)]
pub struct Sign {
    sodium: LibSodium,
}

impl Sign {
    pub fn new(sodium: LibSodium) -> Self {
        Self { sodium }
    }

    pub fn public_key_bytes(&self) -> usize {
        unsafe { libsodium::crypto_sign_publickeybytes() }
    }

    pub fn secret_key_bytes(&self) -> usize {
        unsafe { libsodium::crypto_sign_secretkeybytes() }
    }

    /// Length of a detached signature
    pub fn bytes(&self) -> usize {
        unsafe { libsodium::crypto_sign_bytes() }
    }

    pub fn seed_bytes(&self) -> usize {
        unsafe { libsodium::crypto_sign_seedbytes() }
    }

    /// Generates a random key pair
    pub fn keypair(&self) -> Result<KeyPair, CryptoError> {
        let mut public_key = vec![0u8; self.public_key_bytes()];
        let mut secret_key = SecureKey::alloc(self.sodium, self.secret_key_bytes())?;
        secret_key.run_unlocked_mut(|sk| {
            sodium_call!(crypto_sign_keypair, public_key.as_mut_ptr(), sk.as_mut_ptr())
        })?;
        Ok(KeyPair {
            public_key,
            secret_key,
        })
    }

    /// Derives the key pair belonging to `seed`
    pub fn seed_keypair(&self, seed: &mut SecureKey) -> Result<KeyPair, CryptoError> {
        check_is_same(seed.len(), self.seed_bytes(), "seed")?;

        let mut public_key = vec![0u8; self.public_key_bytes()];
        let mut secret_key = SecureKey::alloc(self.sodium, self.secret_key_bytes())?;
        seed.run_unlocked(|seed| {
            secret_key.run_unlocked_mut(|sk| {
                sodium_call!(
                    crypto_sign_seed_keypair,
                    public_key.as_mut_ptr(),
                    sk.as_mut_ptr(),
                    seed.as_ptr()
                )
            })
        })?;
        Ok(KeyPair {
            public_key,
            secret_key,
        })
    }

    pub fn sign_detached(
        &self,
        message: &[u8],
        secret_key: &mut SecureKey,
    ) -> Result<Vec<u8>, CryptoError> {
        check_is_same(secret_key.len(), self.secret_key_bytes(), "secretKey")?;

        let mut signature = vec![0u8; self.bytes()];
        secret_key.run_unlocked(|sk| {
            sodium_call!(
                crypto_sign_detached,
                signature.as_mut_ptr(),
                null_mut(), // the length is always crypto_sign_bytes
                message.as_ptr(),
                message.len() as c_ulonglong,
                sk.as_ptr()
            )
        })?;
        Ok(signature)
    }

    /// Returns whether `signature` is valid for `message` under `public_key`.
    ///
    /// A wrong signature is `Ok(false)`, only malformed lengths are errors.
    pub fn verify_detached(
        &self,
        signature: &[u8],
        message: &[u8],
        public_key: &[u8],
    ) -> Result<bool, CryptoError> {
        check_is_same(signature.len(), self.bytes(), "signature")?;
        check_is_same(public_key.len(), self.public_key_bytes(), "publicKey")?;

        let status = unsafe {
            libsodium::crypto_sign_verify_detached(
                signature.as_ptr(),
                message.as_ptr(),
                message.len() as c_ulonglong,
                public_key.as_ptr(),
            )
        };
        Ok(status == 0)
    }
}
