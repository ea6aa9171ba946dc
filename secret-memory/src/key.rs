//! Secret key material in guarded memory.
//!
//! A [SecureKey] keeps its bytes at [Protection::NoAccess]. The only way to reach them is
//! [SecureKey::run_unlocked] (or its mutable sibling), which raises the protection for the
//! duration of a closure and lowers it again on every way out of that closure: normal
//! return, error and panic.
//!
//! ```rust
//! # use sodalock_sodium::LibSodium;
//! # use sodalock_secret_memory::{Protection, SecureKey};
//! # fn main() -> anyhow::Result<()> {
//! let sodium = LibSodium::init()?;
//! let mut key = SecureKey::from_slice(sodium, b"attack at dawn")?;
//! assert_eq!(key.protection(), Protection::NoAccess);
//!
//! let first = key.run_unlocked(|bytes| bytes.get(0))?;
//! assert_eq!(first, b'a');
//! assert_eq!(key.protection(), Protection::NoAccess);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::ops::{Deref, DerefMut};

use zeroize::Zeroizing;

use sodalock_sodium::{LibSodium, Sodium};

use crate::error::GuardedError;
use crate::guarded::GuardedPtr;
use crate::policy::MemoryPolicy;
use crate::protection::Protection;

/// Storage for secret data
pub struct SecureKey<S: Sodium = LibSodium> {
    region: GuardedPtr<'static, u8, S>,
}

/// Keeps a key region unlocked; lowers it back to [Protection::NoAccess] when released or
/// dropped
struct UnlockGuard<'k, S: Sodium> {
    region: &'k mut GuardedPtr<'static, u8, S>,
    released: bool,
}

impl<'k, S: Sodium> UnlockGuard<'k, S> {
    fn acquire(
        region: &'k mut GuardedPtr<'static, u8, S>,
        level: Protection,
    ) -> Result<Self, GuardedError> {
        region.set_protection(level)?;
        Ok(Self {
            region,
            released: false,
        })
    }

    fn release(mut self) -> Result<(), GuardedError> {
        // Set first: a failed release is reported, not retried on drop
        self.released = true;
        self.region.set_protection(Protection::NoAccess)
    }
}

impl<'k, S: Sodium> Drop for UnlockGuard<'k, S> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.region.set_protection(Protection::NoAccess) {
            log::error!("Could not lock secure key after leaving its unlocked scope: {e}");
        }
    }
}

impl<'k, S: Sodium> Deref for UnlockGuard<'k, S> {
    type Target = GuardedPtr<'static, u8, S>;

    fn deref(&self) -> &Self::Target {
        self.region
    }
}

impl<'k, S: Sodium> DerefMut for UnlockGuard<'k, S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.region
    }
}

impl<S: Sodium> SecureKey<S> {
    /// Returns a new zero initialized key of `len` bytes
    pub fn alloc(sodium: S, len: usize) -> Result<Self, GuardedError> {
        Self::alloc_with(sodium, len, &MemoryPolicy::default())
    }

    pub fn alloc_with(sodium: S, len: usize, policy: &MemoryPolicy) -> Result<Self, GuardedError> {
        // Keys are always zeroed, whatever the policy says about other regions
        Self::build(sodium, len, policy.lock_keys, |region| region.zero_memory())
    }

    /// Returns a new key holding a copy of `bytes`
    pub fn from_slice(sodium: S, bytes: &[u8]) -> Result<Self, GuardedError> {
        Self::from_slice_with(sodium, bytes, &MemoryPolicy::default())
    }

    pub fn from_slice_with(
        sodium: S,
        bytes: &[u8],
        policy: &MemoryPolicy,
    ) -> Result<Self, GuardedError> {
        Self::build(sodium, bytes.len(), policy.lock_keys, |region| region.fill(bytes, 0))
    }

    /// Returns a new key of `len` bytes from the native CSPRNG
    pub fn random(sodium: S, len: usize) -> Result<Self, GuardedError> {
        Self::random_with(sodium, len, &MemoryPolicy::default())
    }

    pub fn random_with(sodium: S, len: usize, policy: &MemoryPolicy) -> Result<Self, GuardedError> {
        let rng = sodium.clone();
        Self::build(sodium, len, policy.lock_keys, |region| {
            rng.randombytes_buf(region.as_mut_slice()?);
            Ok(())
        })
    }

    /// Allocates a read-write region, locks it if asked to, lets `init` write the key and
    /// seals the region at [Protection::NoAccess].
    ///
    /// Locking happens before any key material is written; pages at
    /// [Protection::NoAccess] can not be locked.
    fn build<F>(sodium: S, len: usize, lock: bool, init: F) -> Result<Self, GuardedError>
    where
        F: FnOnce(&mut GuardedPtr<'static, u8, S>) -> Result<(), GuardedError>,
    {
        let mut region = GuardedPtr::alloc(sodium, len, Protection::ReadWrite, false)?;
        region.set_locked(lock)?;
        init(&mut region)?;
        region.set_protection(Protection::NoAccess)?;
        Ok(Self { region })
    }

    /// Length of the key in bytes
    pub fn len(&self) -> usize {
        self.region.len()
    }

    pub fn is_empty(&self) -> bool {
        self.region.is_empty()
    }

    /// [Protection::NoAccess] unless a release failed
    pub fn protection(&self) -> Protection {
        self.region.protection()
    }

    pub fn locked(&self) -> bool {
        self.region.locked()
    }

    /// Runs `f` with read-only access to the key bytes.
    ///
    /// The key is back at [Protection::NoAccess] when this returns or unwinds. If
    /// unlocking fails, `f` is not run. If locking again fails afterwards, that failure is
    /// returned in place of the result of `f`.
    pub fn run_unlocked<R, E, F>(&mut self, f: F) -> Result<R, E>
    where
        F: FnOnce(&GuardedPtr<'static, u8, S>) -> Result<R, E>,
        E: From<GuardedError>,
    {
        let guard = UnlockGuard::acquire(&mut self.region, Protection::ReadOnly)?;
        let result = f(&*guard);
        guard.release()?;
        result
    }

    /// Runs `f` with read-write access to the key bytes; see [Self::run_unlocked]
    pub fn run_unlocked_mut<R, E, F>(&mut self, f: F) -> Result<R, E>
    where
        F: FnOnce(&mut GuardedPtr<'static, u8, S>) -> Result<R, E>,
        E: From<GuardedError>,
    {
        let mut guard = UnlockGuard::acquire(&mut self.region, Protection::ReadWrite)?;
        let result = f(&mut *guard);
        guard.release()?;
        result
    }

    /// Copies the key bytes out of guarded memory
    pub fn extract_bytes(&mut self) -> Result<Zeroizing<Vec<u8>>, GuardedError> {
        self.run_unlocked(|region| region.to_vec().map(Zeroizing::new))
    }

    /// Copies the key into a new guarded allocation with the same lock state
    pub fn try_clone(&mut self) -> Result<Self, GuardedError> {
        let sodium = self.region.sodium().clone();
        let locked = self.region.locked();
        self.run_unlocked(|src| {
            let bytes = src.as_slice()?;
            Self::build(sodium, bytes.len(), locked, |region| region.fill(bytes, 0))
        })
    }

    /// Frees the key's guarded allocation; dropping the key does the same
    pub fn dispose(self) {
        drop(self)
    }
}

/// The Debug implementation of [SecureKey] does not reveal the secret data,
/// instead a placeholder `<SECRET>` is used
impl<S: Sodium> fmt::Debug for SecureKey<S> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str("<SECRET>")
    }
}
