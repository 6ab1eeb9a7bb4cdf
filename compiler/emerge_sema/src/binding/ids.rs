//! Arena handles of bound entities.

use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            #[inline]
            pub fn from_index(index: usize) -> Self {
                Self(u32::try_from(index).unwrap_or(u32::MAX))
            }

            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }
    };
}

define_id!(
    /// A function, member function, constructor or destructor.
    FnId
);
define_id!(
    /// A global, member or local variable, or a parameter.
    VarId
);
define_id!(
    /// A class or interface declared in source.
    BaseId
);
define_id!(
    /// Functions sharing a name and parameter count.
    OverloadSetId
);
define_id!(
    /// An `import` declaration.
    ImportId
);
define_id!(ExprId);
define_id!(StmtId);
define_id!(
    /// A lexical scope; scopes form a tree rooted at the source files.
    ScopeId
);
define_id!(FileIdx);
