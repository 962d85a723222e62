//! Interned variable names.
//!
//! Every variable that appears in a model (declared name, statement target,
//! dependency) is represented by an [`Id`]. Ids are cheap to copy, hash and
//! compare, which keeps the dependency sets small and the graph operations
//! allocation-free.

use std::{
    fmt,
    sync::{Mutex, MutexGuard, OnceLock},
};

use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Global string interner backing [`Id`].
///
/// # Thread Safety
///
/// Access is serialized through a `Mutex`.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn interner() -> MutexGuard<'static, DefaultStringInterner> {
    INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .expect("Failed to acquire interner lock")
}

/// An interned variable name.
///
/// # Examples
///
/// ```
/// use stangraph_core::identifier::Id;
///
/// let mu = Id::new("mu");
/// assert_eq!(mu, Id::new("mu"));
/// assert_eq!(mu, "mu");
/// assert_eq!(mu.to_string(), "mu");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Creates an `Id` for `name`, interning it on first use.
    pub fn new(name: &str) -> Self {
        Self(interner().get_or_intern(name))
    }

    /// Returns the `Id` for `name` only if that name was interned before.
    ///
    /// Lookups against known-name sets use this so that scanning arbitrary
    /// expression tokens (numbers, function names) does not grow the interner.
    ///
    /// ```
    /// use stangraph_core::identifier::Id;
    ///
    /// let sigma = Id::new("sigma");
    /// assert_eq!(Id::lookup("sigma"), Some(sigma));
    /// assert_eq!(Id::lookup("never_interned_name_42"), None);
    /// ```
    pub fn lookup(name: &str) -> Option<Self> {
        interner().get(name).map(Self)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let interner = interner();
        let name = interner
            .resolve(self.0)
            .expect("Symbol should exist in interner");
        f.write_str(name)
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({:?})", self.to_string())
    }
}

impl From<&str> for Id {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for Id {
    fn eq(&self, other: &str) -> bool {
        let interner = interner();
        interner.resolve(self.0) == Some(other)
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}
