//! Element descriptors for [GuardedPtr](crate::GuardedPtr).
//!
//! A region stores the [ElementKind] of its element type once, at construction. The descriptor
//! decides the byte width used for allocation, views and locking.

use std::fmt;

/// The closed set of numeric element types a guarded region can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
}

impl ElementKind {
    /// Size of one element in bytes
    pub const fn byte_width(self) -> usize {
        use ElementKind::*;
        match self {
            U8 | I8 => 1,
            U16 | I16 => 2,
            U32 | I32 | F32 => 4,
            U64 | I64 | F64 => 8,
        }
    }

    pub const fn is_signed(self) -> bool {
        use ElementKind::*;
        matches!(self, I8 | I16 | I32 | I64 | F32 | F64)
    }

    pub const fn is_float(self) -> bool {
        matches!(self, ElementKind::F32 | ElementKind::F64)
    }

    /// Byte length of `count` elements; `None` on overflow
    pub const fn byte_len(self, count: usize) -> Option<usize> {
        count.checked_mul(self.byte_width())
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ElementKind::*;
        f.write_str(match self {
            U8 => "u8",
            I8 => "i8",
            U16 => "u16",
            I16 => "i16",
            U32 => "u32",
            I32 => "i32",
            U64 => "u64",
            I64 => "i64",
            F32 => "f32",
            F64 => "f64",
        })
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Plain numeric types that may be stored in guarded memory.
///
/// Every bit pattern of `Self` must be a valid value, since guarded memory starts out with
/// garbage (libsodium fills fresh allocations with `0xdb`) unless it is zeroed. The trait is
/// sealed for that reason.
pub trait Element: Copy + Default + PartialEq + fmt::Debug + sealed::Sealed + 'static {
    const KIND: ElementKind;
}

macro_rules! impl_element {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}
            impl Element for $ty {
                const KIND: ElementKind = ElementKind::$kind;
            }
        )*
    };
}

impl_element! {
    u8 => U8,
    i8 => I8,
    u16 => U16,
    i16 => I16,
    u32 => U32,
    i32 => I32,
    u64 => U64,
    i64 => I64,
    f32 => F32,
    f64 => F64,
}
