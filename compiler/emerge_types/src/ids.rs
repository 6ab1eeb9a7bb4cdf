//! Registry handles.
//!
//! Base types and type parameters are referenced by dense 32-bit indices into
//! the [`TypeRegistry`](crate::TypeRegistry). Identity, not name, decides
//! whether two references denote the same parameter.

use std::fmt;

/// Handle to a base type (class, interface or builtin).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct BaseTypeId(u32);

impl BaseTypeId {
    // === Well-known base types ===
    // Registered by `TypeRegistry::new` in exactly this order.

    /// Top type of the nominal hierarchy.
    pub const ANY: Self = Self(0);
    /// Bottom type; subtype of everything.
    pub const NOTHING: Self = Self(1);
    pub const UNIT: Self = Self(2);
    pub const BOOL: Self = Self(3);
    pub const S8: Self = Self(4);
    pub const U8: Self = Self(5);
    pub const S16: Self = Self(6);
    pub const U16: Self = Self(7);
    pub const S32: Self = Self(8);
    pub const U32: Self = Self(9);
    pub const S64: Self = Self(10);
    pub const U64: Self = Self(11);
    pub const F32: Self = Self(12);
    pub const F64: Self = Self(13);
    pub const STRING: Self = Self(14);
    /// Builtin `Array<Element>`.
    pub const ARRAY: Self = Self(15);

    /// Number of pre-registered base types.
    pub const WELL_KNOWN_COUNT: u32 = 16;

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_well_known(self) -> bool {
        self.0 < Self::WELL_KNOWN_COUNT
    }
}

impl fmt::Debug for BaseTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BaseTypeId({})", self.0)
    }
}

/// Handle to a type parameter of a base type or a function.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct TypeParamId(u32);

impl TypeParamId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for TypeParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeParamId({})", self.0)
    }
}
