//! Typed regions of guarded native memory.
//!
//! A [GuardedPtr] either owns an allocation of the native guarded heap or is a view on a
//! sub-range of another region. Owning regions free their allocation when dropped (or
//! explicitly through [GuardedPtr::dispose]); views never free anything.
//!
//! All reads check that the tracked protection permits reading, all writes check that it
//! permits writing. No operation changes the protection implicitly.
//!
//! # Example
//!
//! ```rust
//! # use sodalock_sodium::LibSodium;
//! # use sodalock_secret_memory::{GuardedPtr, Protection};
//! # fn main() -> anyhow::Result<()> {
//! let sodium = LibSodium::init()?;
//! let mut region = GuardedPtr::<u8>::alloc(sodium, 5, Protection::ReadWrite, true)?;
//! region.fill(&[1, 2, 3], 1)?;
//! assert_eq!(region.as_slice()?, &[0, 1, 2, 3, 0]);
//!
//! region.set_protection(Protection::NoAccess)?;
//! assert!(region.as_slice().is_err());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use sodalock_sodium::{LibSodium, Sodium};

use crate::element::{Element, ElementKind};
use crate::error::GuardedError;
use crate::policy::MemoryPolicy;
use crate::protection::{transition, Protection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ownership {
    Owned,
    View,
}

/// A typed region of guarded memory.
///
/// `'a` is `'static` for owning regions; views borrow the region they were created from
/// mutably for `'a`, so the parent can neither be used nor dropped while a view exists.
///
/// A view copies the lock state and protection of its parent when it is created. Lock
/// changes made through a view are not reflected in the parent's tracked state.
///
/// Regions are not thread safe; they are neither [Send] nor [Sync].
pub struct GuardedPtr<'a, T: Element, S: Sodium = LibSodium> {
    ptr: NonNull<u8>,
    count: usize,
    kind: ElementKind,
    locked: bool,
    protection: Protection,
    ownership: Ownership,
    sodium: S,
    _lifetime: PhantomData<&'a mut [T]>,
}

impl<T: Element, S: Sodium> GuardedPtr<'static, T, S> {
    /// Allocates a region for `count` elements.
    ///
    /// A single element is allocated with `sodium_malloc`, everything else with
    /// `sodium_allocarray`. With `zeroed` the memory is cleared before `protection` is
    /// applied; otherwise it holds the allocator's fill pattern. If anything fails after the
    /// native allocation succeeded, the allocation is freed before the error is returned.
    pub fn alloc(
        sodium: S,
        count: usize,
        protection: Protection,
        zeroed: bool,
    ) -> Result<Self, GuardedError> {
        let mut region = Self::alloc_read_write(sodium, count)?;
        if zeroed {
            region.zero_memory()?;
        }
        region.set_protection(protection)?;
        Ok(region)
    }

    /// [Self::alloc] with initial protection and zeroing taken from `policy`
    pub fn alloc_with(
        sodium: S,
        count: usize,
        policy: &MemoryPolicy,
    ) -> Result<Self, GuardedError> {
        Self::alloc(sodium, count, policy.initial_protection, policy.zero_fill)
    }

    /// Allocates a region holding a copy of `values`, then applies `protection`
    pub fn from_values(
        sodium: S,
        values: &[T],
        protection: Protection,
    ) -> Result<Self, GuardedError> {
        let mut region = Self::alloc_read_write(sodium, values.len())?;
        region.fill(values, 0)?;
        region.set_protection(protection)?;
        Ok(region)
    }

    fn alloc_read_write(sodium: S, count: usize) -> Result<Self, GuardedError> {
        let kind = T::KIND;
        let failure = GuardedError::Allocation { kind, count };

        let Some(byte_len) = kind.byte_len(count) else {
            log::error!("Allocation of {count} elements of type {kind} overflows");
            return Err(failure);
        };

        let ptr = match count {
            1 => sodium.malloc(byte_len),
            _ => sodium.allocarray(count, kind.byte_width()),
        };
        let Some(ptr) = ptr else {
            log::error!(
                "Allocation of {count} elements of type {kind} was requested but the guarded allocator returned a null pointer"
            );
            return Err(failure);
        };

        let region = Self {
            ptr,
            count,
            kind,
            locked: false,
            protection: Protection::ReadWrite,
            ownership: Ownership::Owned,
            sodium,
            _lifetime: PhantomData,
        };

        let off = ptr.as_ptr().align_offset(std::mem::align_of::<T>());
        if off != 0 {
            log::error!(
                "Allocation of {count} elements of type {kind} was returned with offset {off} from the required alignment"
            );
            // Dropping the region frees the allocation
            return Err(GuardedError::Misaligned { kind });
        }

        Ok(region)
    }
}

impl<'a, T: Element, S: Sodium> GuardedPtr<'a, T, S> {
    /// Number of elements
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of bytes covered by the region
    pub fn byte_len(&self) -> usize {
        // Cannot overflow, the allocation already checked it
        self.count * self.kind.byte_width()
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn is_view(&self) -> bool {
        self.ownership == Ownership::View
    }

    pub fn locked(&self) -> bool {
        self.locked
    }

    pub fn protection(&self) -> Protection {
        self.protection
    }

    pub(crate) fn sodium(&self) -> &S {
        &self.sodium
    }

    /// Raw pointer to the first element, for passing the region to native code.
    ///
    /// No protection check is performed; the native callee faults if the region is not
    /// readable.
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr() as *const T
    }

    /// Raw mutable pointer to the first element, see [Self::as_ptr]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr() as *mut T
    }

    /// Changes the protection of the underlying allocation.
    ///
    /// Requesting the current level issues no native call. On failure the tracked
    /// protection keeps its previous value. Views can not change protection since the
    /// native calls act on whole allocations.
    pub fn set_protection(&mut self, protection: Protection) -> Result<(), GuardedError> {
        if protection == self.protection {
            return Ok(());
        }
        if self.is_view() {
            return Err(GuardedError::ViewProtection);
        }

        self.protection =
            unsafe { transition(&self.sodium, self.ptr, self.protection, protection)? };
        Ok(())
    }

    /// Locks (`true`) or unlocks (`false`) the region's pages in memory.
    ///
    /// Requesting the current state issues no native call. On failure the tracked state
    /// keeps its previous value.
    ///
    /// Locking requires at least [Protection::ReadOnly], since inaccessible pages can not be
    /// locked. Unlocking zeroes the region before releasing the pages and therefore
    /// requires [Protection::ReadWrite]. Both fail with [GuardedError::Access] without a
    /// native call otherwise.
    pub fn set_locked(&mut self, locked: bool) -> Result<(), GuardedError> {
        if locked == self.locked {
            return Ok(());
        }
        self.protection.require(match locked {
            true => Protection::ReadOnly,
            false => Protection::ReadWrite,
        })?;

        let len = self.byte_len();
        let status = unsafe {
            match locked {
                true => self.sodium.mlock(self.ptr, len),
                false => self.sodium.munlock(self.ptr, len),
            }
        };

        if status != 0 {
            log::error!(
                "Changing the lock state of {:p} ({len} bytes) to {locked} failed with status {status}",
                self.ptr
            );
            return Err(match locked {
                true => GuardedError::Lock { status },
                false => GuardedError::Unlock { status },
            });
        }

        self.locked = locked;
        Ok(())
    }

    /// Creates a view on the elements `[offset, offset + length)`.
    ///
    /// Never issues a native call.
    pub fn view(
        &mut self,
        offset: usize,
        length: usize,
    ) -> Result<GuardedPtr<'_, T, S>, GuardedError> {
        if offset > self.count || length > self.count - offset {
            return Err(GuardedError::Range {
                offset,
                length,
                count: self.count,
            });
        }

        // In bounds of the allocation (or one past its end for empty views)
        let byte_offset = offset * self.kind.byte_width();
        let ptr = unsafe { NonNull::new_unchecked(self.ptr.as_ptr().add(byte_offset)) };

        Ok(GuardedPtr {
            ptr,
            count: length,
            kind: self.kind,
            locked: self.locked,
            protection: self.protection,
            ownership: Ownership::View,
            sodium: self.sodium.clone(),
            _lifetime: PhantomData,
        })
    }

    /// Borrows the elements; requires at least [Protection::ReadOnly]
    pub fn as_slice(&self) -> Result<&[T], GuardedError> {
        self.protection.require(Protection::ReadOnly)?;
        // Aligned, in bounds and every bit pattern is a valid `T`
        Ok(unsafe { std::slice::from_raw_parts(self.as_ptr(), self.count) })
    }

    /// Borrows the elements mutably; requires [Protection::ReadWrite]
    pub fn as_mut_slice(&mut self) -> Result<&mut [T], GuardedError> {
        self.protection.require(Protection::ReadWrite)?;
        Ok(unsafe { std::slice::from_raw_parts_mut(self.as_mut_ptr(), self.count) })
    }

    /// Copies the elements out of guarded memory
    pub fn to_vec(&self) -> Result<Vec<T>, GuardedError> {
        Ok(self.as_slice()?.to_vec())
    }

    pub fn get(&self, index: usize) -> Result<T, GuardedError> {
        let count = self.count;
        self.as_slice()?
            .get(index)
            .copied()
            .ok_or(GuardedError::Index { index, count })
    }

    pub fn set(&mut self, index: usize, value: T) -> Result<(), GuardedError> {
        let count = self.count;
        let slot = self
            .as_mut_slice()?
            .get_mut(index)
            .ok_or(GuardedError::Index { index, count })?;
        *slot = value;
        Ok(())
    }

    /// Writes `values` starting at element `offset`; requires [Protection::ReadWrite]
    pub fn fill(&mut self, values: &[T], offset: usize) -> Result<(), GuardedError> {
        let range_error = GuardedError::Range {
            offset,
            length: values.len(),
            count: self.count,
        };
        let end = offset
            .checked_add(values.len())
            .filter(|end| *end <= self.count)
            .ok_or(range_error)?;

        self.as_mut_slice()?[offset..end].copy_from_slice(values);
        Ok(())
    }

    /// Overwrites every byte of the region with zero using `sodium_memzero`; requires
    /// [Protection::ReadWrite]
    pub fn zero_memory(&mut self) -> Result<(), GuardedError> {
        self.protection.require(Protection::ReadWrite)?;
        unsafe { self.sodium.memzero(self.ptr, self.byte_len()) };
        Ok(())
    }

    /// Frees the allocation; does nothing for views.
    ///
    /// Dropping the region has the same effect.
    pub fn dispose(self) {
        drop(self)
    }
}

impl<'a, T: Element, S: Sodium> Drop for GuardedPtr<'a, T, S> {
    fn drop(&mut self) {
        if self.ownership == Ownership::Owned {
            unsafe { self.sodium.free(self.ptr) };
        }
    }
}

/// The Debug implementation of [GuardedPtr] does not reveal the contents
impl<'a, T: Element, S: Sodium> fmt::Debug for GuardedPtr<'a, T, S> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("GuardedPtr")
            .field("kind", &self.kind)
            .field("len", &self.count)
            .field("locked", &self.locked)
            .field("protection", &self.protection)
            .field("view", &self.is_view())
            .finish_non_exhaustive()
    }
}
