//! Interned strings ("atoms"), one table per thread.
//!
//! Every identifier the CSS engine handles — property names, keywords,
//! selector names, URIs, font-family names — is interned exactly once per
//! table. Two atoms are the same string if and only if they point at the
//! same allocation, so comparing atoms for equality is a pointer compare,
//! not a byte compare in the common case.
//!
//! # Lifecycle
//!
//! The table holds only [`Weak`] references. Interning a string that is
//! already live hands back a clone of the existing [`Atom`] (bumping its
//! `Rc` strong count, the reference-counted-atom behavior the engine's data
//! model requires); interning a string nobody holds anymore allocates a
//! fresh one and replaces the stale `Weak` slot. A lazily-run sweep on
//! insert drops slots whose `Weak` has expired, so the table doesn't grow
//! unboundedly across a long-lived process — this stands in for the
//! "teardown on final unref" lifecycle described for the atom table: there
//! is no explicit teardown because nothing outlives its last owner.
//!
//! # Why one table per thread
//!
//! The engine's concurrency model (§5) is single-threaded cooperative: a
//! client wanting parallel selection runs one engine per thread. `Atom`
//! wraps `Rc<str>` rather than `Arc<str>` to take the cheaper non-atomic
//! refcount that single-threaded use allows — and `Rc` is (by design)
//! `!Send`, so the table it lives in is necessarily thread-local rather
//! than a single process-wide table. Each thread's engine gets its own
//! fully independent atom table; nothing needs to cross threads because
//! sheets, rules, and computed styles built on one thread are never handed
//! to another.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

thread_local! {
    static TABLE: RefCell<HashMap<Box<str>, Weak<str>>> = RefCell::new(HashMap::new());
}

/// A reference-counted interned string.
///
/// Cloning an `Atom` is a cheap `Rc` clone. Equality is pointer equality
/// when both atoms came from the same interning call (the common case);
/// [`Atom::eq_str`] and [`Atom::eq_ignore_ascii_case`] are provided for the
/// rarer case of comparing against a borrowed `&str`.
#[derive(Clone, Eq)]
pub struct Atom(Rc<str>);

impl Atom {
    /// Intern `s`, returning a handle shared with any other live `Atom` for
    /// the same bytes on this thread.
    #[must_use]
    pub fn new(s: &str) -> Self {
        TABLE.with(|table| {
            let mut table = table.borrow_mut();
            if let Some(existing) = table.get(s).and_then(Weak::upgrade) {
                return Self(existing);
            }
            let rc: Rc<str> = Rc::from(s);
            table.retain(|_, weak| weak.strong_count() > 0);
            let _ = table.insert(Box::from(s), Rc::downgrade(&rc));
            Self(rc)
        })
    }

    /// Intern the ASCII-lowercased form of `s`.
    ///
    /// Used for case-insensitive keyword matching (property names, unit
    /// suffixes, pseudo-class names, `!important`) while the original
    /// lexeme is preserved separately for round-tripping and for properties
    /// whose value is genuinely case-sensitive (URLs, font-family names).
    #[must_use]
    pub fn new_case_folded(s: &str) -> Self {
        if s.bytes().any(|b| b.is_ascii_uppercase()) {
            Self::new(&s.to_ascii_lowercase())
        } else {
            Self::new(s)
        }
    }

    /// Borrow the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of live strong references to this atom's allocation.
    ///
    /// Exposed for tests asserting the atom table's lifecycle invariants.
    #[must_use]
    pub fn strong_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    /// Byte-exact comparison against a borrowed string.
    #[must_use]
    pub fn eq_str(&self, s: &str) -> bool {
        &*self.0 == s
    }

    /// ASCII case-insensitive comparison against a borrowed string.
    #[must_use]
    pub fn eq_ignore_ascii_case(&self, s: &str) -> bool {
        self.0.eq_ignore_ascii_case(s)
    }
}

impl PartialEq for Atom {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0) || *self.0 == *other.0
    }
}

impl Hash for Atom {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Atom({:?})", self.0)
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Atom {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Atom {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Atom {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

/// Number of distinct strings currently interned on this thread.
///
/// Exposed for tests asserting the table doesn't leak entries whose last
/// `Atom` has been dropped.
#[must_use]
pub fn live_count() -> usize {
    TABLE.with(|table| {
        table
            .borrow()
            .values()
            .filter(|w| w.strong_count() > 0)
            .count()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_same_text_shares_allocation() {
        let a = Atom::new("background-color");
        let b = Atom::new("background-color");
        assert!(Rc::ptr_eq(&a.0, &b.0));
        assert_eq!(a, b);
    }

    #[test]
    fn case_folded_atom_is_lowercase() {
        let a = Atom::new_case_folded("Background-COLOR");
        assert_eq!(a.as_str(), "background-color");
    }

    #[test]
    fn atom_is_released_when_last_handle_drops() {
        let unique = "a-very-unlikely-collision-name-for-this-test-zzqx";
        {
            let a = Atom::new(unique);
            assert_eq!(a.strong_count(), 1);
        }
        // The slot lingers with an expired Weak until the next intern call
        // sweeps it, but nothing keeps the string's strong count alive.
        let reinterned = Atom::new(unique);
        assert_eq!(reinterned.strong_count(), 1);
    }
}
