use thiserror::Error;

use sodalock_sodium::Status;

use crate::element::ElementKind;
use crate::protection::Protection;

/// Errors raised by guarded memory regions
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardedError {
    /// A sub-range does not fit into the region
    #[error("range of {length} elements at offset {offset} exceeds region of {count} elements")]
    Range {
        offset: usize,
        length: usize,
        count: usize,
    },

    #[error("index {index} is out of bounds for region of {count} elements")]
    Index { index: usize, count: usize },

    /// The native allocator returned a null pointer
    #[error("could not allocate {count} elements of type {kind}")]
    Allocation { kind: ElementKind, count: usize },

    /// The native allocator returned memory unsuitable for the element type
    #[error("guarded allocation is not aligned for elements of type {kind}")]
    Misaligned { kind: ElementKind },

    /// A native protection transition failed; the region is still at `from`
    #[error("changing protection from {from} to {to} failed with status {status}")]
    Protection {
        from: Protection,
        to: Protection,
        status: Status,
    },

    #[error("sodium_mlock failed with status {status}")]
    Lock { status: Status },

    #[error("sodium_munlock failed with status {status}")]
    Unlock { status: Status },

    /// The region was accessed while its protection forbids it
    #[error("region requires {required} access but is {current}")]
    Access {
        required: Protection,
        current: Protection,
    },

    #[error("the protection of a view can not be changed, change it on the owning region")]
    ViewProtection,
}
