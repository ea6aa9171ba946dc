//! Password hashing and key derivation with libsodium's default algorithm (Argon2id)

use std::ffi::c_ulonglong;

use libsodium_sys as libsodium;

use sodalock_secret_memory::SecureKey;

use crate::validate::{check_in_range, check_is_same};
use crate::{CryptoError, LibSodium};

#[derive(Debug, Clone, Copy)]
pub struct Pwhash {
    sodium: LibSodium,
}

impl Pwhash {
    pub fn new(sodium: LibSodium) -> Self {
        Self { sodium }
    }

    pub fn bytes_min(&self) -> usize {
        unsafe { libsodium::crypto_pwhash_bytes_min() }
    }

    pub fn bytes_max(&self) -> usize {
        unsafe { libsodium::crypto_pwhash_bytes_max() }
    }

    pub fn passwd_min(&self) -> usize {
        unsafe { libsodium::crypto_pwhash_passwd_min() }
    }

    pub fn passwd_max(&self) -> usize {
        unsafe { libsodium::crypto_pwhash_passwd_max() }
    }

    pub fn salt_bytes(&self) -> usize {
        unsafe { libsodium::crypto_pwhash_saltbytes() }
    }

    pub fn opslimit_min(&self) -> u64 {
        unsafe { libsodium::crypto_pwhash_opslimit_min() as u64 }
    }

    pub fn opslimit_max(&self) -> u64 {
        unsafe { libsodium::crypto_pwhash_opslimit_max() as u64 }
    }

    pub fn opslimit_interactive(&self) -> u64 {
        unsafe { libsodium::crypto_pwhash_opslimit_interactive() as u64 }
    }

    pub fn memlimit_min(&self) -> usize {
        unsafe { libsodium::crypto_pwhash_memlimit_min() }
    }

    pub fn memlimit_max(&self) -> usize {
        unsafe { libsodium::crypto_pwhash_memlimit_max() }
    }

    pub fn memlimit_interactive(&self) -> usize {
        unsafe { libsodium::crypto_pwhash_memlimit_interactive() }
    }

    /// Stretches `password` into an `out_len` byte key.
    ///
    /// The same password, salt and limits always give the same key.
    pub fn hash(
        &self,
        out_len: usize,
        password: &[u8],
        salt: &[u8],
        opslimit: u64,
        memlimit: usize,
    ) -> Result<SecureKey, CryptoError> {
        check_in_range(out_len, self.bytes_min(), self.bytes_max(), "outLen")?;
        check_in_range(password.len(), self.passwd_min(), self.passwd_max(), "password")?;
        check_is_same(salt.len(), self.salt_bytes(), "salt")?;
        check_in_range(
            usize::try_from(opslimit).unwrap_or(usize::MAX),
            self.opslimit_min() as usize,
            self.opslimit_max() as usize,
            "opslimit",
        )?;
        check_in_range(memlimit, self.memlimit_min(), self.memlimit_max(), "memlimit")?;

        let alg = unsafe { libsodium::crypto_pwhash_alg_default() };
        let mut key = SecureKey::alloc(self.sodium, out_len)?;
        key.run_unlocked_mut(|k| {
            sodium_call!(
                crypto_pwhash,
                k.as_mut_ptr(),
                k.len() as c_ulonglong,
                password.as_ptr().cast(),
                password.len() as c_ulonglong,
                salt.as_ptr(),
                opslimit as c_ulonglong,
                memlimit,
                alg
            )
        })?;
        Ok(key)
    }
}
