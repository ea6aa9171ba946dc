use std::os::raw::{c_int, c_void};
use std::ptr::NonNull;

use libsodium_sys as libsodium;

use crate::LibSodium;

/// Status code returned by the native guard calls; `0` means success
pub type Status = c_int;

/// The native allocator and memory guard primitives.
///
/// Implementations must behave like libsodium's guarded heap: `malloc` and `allocarray`
/// return memory surrounded by guard pages, `mprotect_*` take the address returned by the
/// allocator and change the protection of the whole allocation, and `free` releases it
/// regardless of its current protection.
///
/// Functions taking a raw pointer are unsafe; the caller guarantees that the pointer was
/// produced by this implementation's allocator (or for `mlock`/`munlock`/`memzero`, lies
/// within such an allocation together with `len`) and has not been freed yet.
pub trait Sodium: Clone {
    /// `sodium_malloc`; `None` if the allocation failed
    fn malloc(&self, size: usize) -> Option<NonNull<u8>>;

    /// `sodium_allocarray`; `None` if the allocation failed or `count * size` overflows
    fn allocarray(&self, count: usize, size: usize) -> Option<NonNull<u8>>;

    /// `sodium_free`
    ///
    /// # Safety
    ///
    /// `ptr` must come from [Self::malloc] or [Self::allocarray] and must not be used
    /// afterwards.
    unsafe fn free(&self, ptr: NonNull<u8>);

    /// `sodium_mlock`
    ///
    /// # Safety
    ///
    /// `[ptr, ptr + len)` must be a live allocation of this implementation.
    unsafe fn mlock(&self, ptr: NonNull<u8>, len: usize) -> Status;

    /// `sodium_munlock`
    ///
    /// libsodium zeroes `[ptr, ptr + len)` before unlocking it, so the memory must be
    /// writable and its contents are lost.
    ///
    /// # Safety
    ///
    /// `[ptr, ptr + len)` must be a live, writable allocation of this implementation.
    unsafe fn munlock(&self, ptr: NonNull<u8>, len: usize) -> Status;

    /// `sodium_mprotect_noaccess`
    ///
    /// # Safety
    ///
    /// `ptr` must be the base address of a live allocation of this implementation.
    unsafe fn mprotect_noaccess(&self, ptr: NonNull<u8>) -> Status;

    /// `sodium_mprotect_readonly`
    ///
    /// # Safety
    ///
    /// `ptr` must be the base address of a live allocation of this implementation.
    unsafe fn mprotect_readonly(&self, ptr: NonNull<u8>) -> Status;

    /// `sodium_mprotect_readwrite`
    ///
    /// # Safety
    ///
    /// `ptr` must be the base address of a live allocation of this implementation.
    unsafe fn mprotect_readwrite(&self, ptr: NonNull<u8>) -> Status;

    /// `sodium_memzero`
    ///
    /// # Safety
    ///
    /// `[ptr, ptr + len)` must be writable memory.
    unsafe fn memzero(&self, ptr: NonNull<u8>, len: usize);

    /// `randombytes_buf`
    fn randombytes_buf(&self, buf: &mut [u8]);
}

impl Sodium for LibSodium {
    fn malloc(&self, size: usize) -> Option<NonNull<u8>> {
        NonNull::new(unsafe { libsodium::sodium_malloc(size) } as *mut u8)
    }

    fn allocarray(&self, count: usize, size: usize) -> Option<NonNull<u8>> {
        NonNull::new(unsafe { libsodium::sodium_allocarray(count, size) } as *mut u8)
    }

    unsafe fn free(&self, ptr: NonNull<u8>) {
        unsafe { libsodium::sodium_free(ptr.as_ptr() as *mut c_void) }
    }

    unsafe fn mlock(&self, ptr: NonNull<u8>, len: usize) -> Status {
        unsafe { libsodium::sodium_mlock(ptr.as_ptr() as *mut c_void, len) }
    }

    unsafe fn munlock(&self, ptr: NonNull<u8>, len: usize) -> Status {
        unsafe { libsodium::sodium_munlock(ptr.as_ptr() as *mut c_void, len) }
    }

    unsafe fn mprotect_noaccess(&self, ptr: NonNull<u8>) -> Status {
        unsafe { libsodium::sodium_mprotect_noaccess(ptr.as_ptr() as *mut c_void) }
    }

    unsafe fn mprotect_readonly(&self, ptr: NonNull<u8>) -> Status {
        unsafe { libsodium::sodium_mprotect_readonly(ptr.as_ptr() as *mut c_void) }
    }

    unsafe fn mprotect_readwrite(&self, ptr: NonNull<u8>) -> Status {
        unsafe { libsodium::sodium_mprotect_readwrite(ptr.as_ptr() as *mut c_void) }
    }

    unsafe fn memzero(&self, ptr: NonNull<u8>, len: usize) {
        unsafe { libsodium::sodium_memzero(ptr.as_ptr() as *mut c_void, len) }
    }

    fn randombytes_buf(&self, buf: &mut [u8]) {
        unsafe { libsodium::randombytes_buf(buf.as_mut_ptr() as *mut c_void, buf.len()) }
    }
}
