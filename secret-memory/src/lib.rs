//! Guarded memory for secrets, on top of libsodium's guarded heap.
//!
//! - [GuardedPtr] is a typed region of guarded memory, or a view into one, with tracked
//!   [Protection] and lock state.
//! - [SecureKey] keeps secret bytes inaccessible except inside an explicit unlocked scope.
//! - [MemoryPolicy] configures how regions and keys are set up.
//!
//! Native calls go through a [Sodium](sodalock_sodium::Sodium) binding object that every
//! constructor takes as its first argument.

pub mod element;
pub mod policy;

mod error;
mod guarded;
mod key;
mod protection;

#[cfg(test)]
mod stub;

pub use crate::element::{Element, ElementKind};
pub use crate::error::GuardedError;
pub use crate::guarded::GuardedPtr;
pub use crate::key::SecureKey;
pub use crate::policy::MemoryPolicy;
pub use crate::protection::Protection;
