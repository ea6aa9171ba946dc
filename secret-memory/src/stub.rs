//! A [Sodium] stand-in for tests.
//!
//! Memory comes from the global allocator and stays accessible whatever its protection, so
//! the tests observe the bookkeeping of [GuardedPtr](crate::GuardedPtr) instead of page
//! faults. Every native call is counted and any call can be made to fail.

use std::alloc::{alloc, dealloc, Layout};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::ptr::NonNull;
use std::rc::Rc;

use sodalock_sodium::{Sodium, Status};

/// Routes `log` output through the test harness; `RUST_LOG` selects the level
pub fn setup_logging() {
    let mut log_builder = env_logger::Builder::from_default_env();
    log_builder.is_test(true);
    let _ = log_builder.try_init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeCall {
    Malloc,
    AllocArray,
    Free,
    Mlock,
    Munlock,
    MprotectNoAccess,
    MprotectReadOnly,
    MprotectReadWrite,
    Memzero,
    RandomBytes,
}

#[derive(Debug, Default)]
struct StubState {
    calls: HashMap<NativeCall, usize>,
    failing: HashSet<NativeCall>,
    live: HashMap<usize, Layout>,
    /// Shift applied to the next allocation to produce a misaligned pointer
    misalign: bool,
}

#[derive(Debug, Clone, Default)]
pub struct StubSodium {
    state: Rc<RefCell<StubState>>,
}

impl StubSodium {
    /// Status returned by failing calls
    pub const FAILURE: Status = -1;

    /// Fill byte of fresh allocations, mirroring libsodium's canary fill
    pub const GARBAGE: u8 = 0xdb;

    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `call` fail
    pub fn fail(&self, call: NativeCall) {
        self.state.borrow_mut().failing.insert(call);
    }

    pub fn heal(&self, call: NativeCall) {
        self.state.borrow_mut().failing.remove(&call);
    }

    /// Makes the next allocation return a pointer that is off by one byte
    pub fn misalign_next(&self) {
        self.state.borrow_mut().misalign = true;
    }

    pub fn calls(&self, call: NativeCall) -> usize {
        self.state.borrow().calls.get(&call).copied().unwrap_or(0)
    }

    /// Number of `mprotect_*` calls of any kind
    pub fn protection_calls(&self) -> usize {
        self.calls(NativeCall::MprotectNoAccess)
            + self.calls(NativeCall::MprotectReadOnly)
            + self.calls(NativeCall::MprotectReadWrite)
    }

    /// Number of native calls of any kind
    pub fn total_calls(&self) -> usize {
        self.state.borrow().calls.values().sum()
    }

    /// Number of allocations that have not been freed yet
    pub fn live_allocations(&self) -> usize {
        self.state.borrow().live.len()
    }

    fn record(&self, call: NativeCall) -> bool {
        let mut state = self.state.borrow_mut();
        *state.calls.entry(call).or_default() += 1;
        !state.failing.contains(&call)
    }

    fn status(&self, call: NativeCall) -> Status {
        match self.record(call) {
            true => 0,
            false => Self::FAILURE,
        }
    }

    fn allocate(&self, call: NativeCall, size: usize) -> Option<NonNull<u8>> {
        if !self.record(call) {
            return None;
        }

        let misalign = std::mem::take(&mut self.state.borrow_mut().misalign) as usize;
        let layout = Layout::from_size_align(size.checked_add(1)?, 16).ok()?;
        let base = NonNull::new(unsafe { alloc(layout) })?;
        unsafe { base.as_ptr().write_bytes(Self::GARBAGE, layout.size()) };

        let ptr = unsafe { NonNull::new_unchecked(base.as_ptr().add(misalign)) };
        self.state
            .borrow_mut()
            .live
            .insert(ptr.as_ptr() as usize, layout);
        Some(ptr)
    }
}

impl Sodium for StubSodium {
    fn malloc(&self, size: usize) -> Option<NonNull<u8>> {
        self.allocate(NativeCall::Malloc, size)
    }

    fn allocarray(&self, count: usize, size: usize) -> Option<NonNull<u8>> {
        let total = count.checked_mul(size);
        match total {
            Some(total) => self.allocate(NativeCall::AllocArray, total),
            None => {
                self.record(NativeCall::AllocArray);
                None
            }
        }
    }

    unsafe fn free(&self, ptr: NonNull<u8>) {
        self.record(NativeCall::Free);
        let addr = ptr.as_ptr() as usize;
        let layout = self
            .state
            .borrow_mut()
            .live
            .remove(&addr)
            .expect("free of a pointer the stub never handed out");
        let base = addr & !(layout.align() - 1);
        unsafe { dealloc(base as *mut u8, layout) };
    }

    unsafe fn mlock(&self, _ptr: NonNull<u8>, _len: usize) -> Status {
        self.status(NativeCall::Mlock)
    }

    /// Zeroes the range like `sodium_munlock` does, whether or not the call fails
    unsafe fn munlock(&self, ptr: NonNull<u8>, len: usize) -> Status {
        unsafe { ptr.as_ptr().write_bytes(0, len) };
        self.status(NativeCall::Munlock)
    }

    unsafe fn mprotect_noaccess(&self, _ptr: NonNull<u8>) -> Status {
        self.status(NativeCall::MprotectNoAccess)
    }

    unsafe fn mprotect_readonly(&self, _ptr: NonNull<u8>) -> Status {
        self.status(NativeCall::MprotectReadOnly)
    }

    unsafe fn mprotect_readwrite(&self, _ptr: NonNull<u8>) -> Status {
        self.status(NativeCall::MprotectReadWrite)
    }

    unsafe fn memzero(&self, ptr: NonNull<u8>, len: usize) {
        self.record(NativeCall::Memzero);
        unsafe { ptr.as_ptr().write_bytes(0, len) };
    }

    fn randombytes_buf(&self, buf: &mut [u8]) {
        self.record(NativeCall::RandomBytes);
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = (i as u8).wrapping_mul(31).wrapping_add(7);
        }
    }
}
