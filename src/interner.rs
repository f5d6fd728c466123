use once_cell::sync::Lazy;
use std::cmp::Ordering;
use std::fmt;
use std::sync::RwLock;
use string_interner::{DefaultBackend, DefaultSymbol, StringInterner};

static INTERNER: Lazy<RwLock<StringInterner<DefaultBackend>>> =
    Lazy::new(|| RwLock::new(StringInterner::default()));

/// A name interned in the global string interner.
///
/// Used for both variable names and keyword constants, so equality and
/// hashing are a single integer comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(DefaultSymbol);

impl Symbol {
    /// Intern a string and return its symbol
    pub fn new(s: &str) -> Self {
        if let Some(symbol) = Symbol::get(s) {
            return symbol;
        }
        let mut interner = INTERNER.write().unwrap_or_else(|e| e.into_inner());
        Symbol(interner.get_or_intern(s))
    }

    /// The symbol for `s` if it was ever interned. Takes only the read lock
    /// and never grows the interner.
    pub fn get(s: &str) -> Option<Self> {
        let interner = INTERNER.read().unwrap_or_else(|e| e.into_inner());
        interner.get(s).map(Symbol)
    }

    /// Resolve the symbol back to an owned string
    pub fn resolve(&self) -> String {
        self.with_str(str::to_string)
    }

    /// Resolve the symbol and run a function with the string slice.
    /// Avoids the allocation `resolve()` makes.
    pub fn with_str<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&str) -> R,
    {
        let interner = INTERNER.read().unwrap_or_else(|e| e.into_inner());
        // Symbols are only minted by `Symbol::new`, so resolution cannot miss.
        f(interner.resolve(self.0).unwrap_or_default())
    }

    /// Compare by spelling rather than interning order
    pub fn cmp_name(&self, other: &Symbol) -> Ordering {
        if self == other {
            return Ordering::Equal;
        }
        let interner = INTERNER.read().unwrap_or_else(|e| e.into_inner());
        let a = interner.resolve(self.0).unwrap_or_default();
        let b = interner.resolve(other.0).unwrap_or_default();
        a.cmp(b)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_str(|s| write!(f, "{s}"))
    }
}
