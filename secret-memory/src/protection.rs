//! Access protection of guarded regions.
//!
//! Guarded allocations can be switched between three protection levels. The tracked level
//! only ever changes after the native call reported success; requesting the current level
//! issues no native call at all.

use std::fmt;
use std::ptr::NonNull;

use serde::{Deserialize, Serialize};

use sodalock_sodium::Sodium;

use crate::error::GuardedError;

/// The protection level of a guarded region
///
/// Levels are ordered by the access they grant.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protection {
    /// Any access faults
    NoAccess,
    /// Reading is permitted, writing faults
    ReadOnly,
    /// Freshly allocated regions start out read-write
    #[default]
    ReadWrite,
}

impl Protection {
    pub fn permits_read(self) -> bool {
        self >= Protection::ReadOnly
    }

    pub fn permits_write(self) -> bool {
        self == Protection::ReadWrite
    }

    /// Fails with [GuardedError::Access] unless `self` grants at least `required`
    pub fn require(self, required: Protection) -> Result<(), GuardedError> {
        match self >= required {
            true => Ok(()),
            false => Err(GuardedError::Access {
                required,
                current: self,
            }),
        }
    }
}

impl fmt::Display for Protection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Protection::NoAccess => "no-access",
            Protection::ReadOnly => "read-only",
            Protection::ReadWrite => "read-write",
        })
    }
}

/// Moves the allocation at `base` from `current` to `requested`.
///
/// Returns the new level. On failure the allocation is still at `current` as far as the
/// caller is concerned; the error carries the native status.
///
/// # Safety
///
/// `base` must be the base address of a live allocation made by `sodium`.
pub(crate) unsafe fn transition<S: Sodium>(
    sodium: &S,
    base: NonNull<u8>,
    current: Protection,
    requested: Protection,
) -> Result<Protection, GuardedError> {
    if current == requested {
        return Ok(current);
    }

    let status = unsafe {
        match requested {
            Protection::NoAccess => sodium.mprotect_noaccess(base),
            Protection::ReadOnly => sodium.mprotect_readonly(base),
            Protection::ReadWrite => sodium.mprotect_readwrite(base),
        }
    };

    if status != 0 {
        log::error!(
            "Changing protection of {base:p} from {current} to {requested} failed with status {status}"
        );
        return Err(GuardedError::Protection {
            from: current,
            to: requested,
            status,
        });
    }

    log::trace!("Protection of {base:p} changed from {current} to {requested}");
    Ok(requested)
}
