//! Diagnostics for recoverable engine errors.
//!
//! The style-sheet builder and cascade engine recover from most malformed
//! input by dropping the offending declaration, ruleset, or at-rule
//! rather than failing the whole document. This module is where those
//! recovery paths record what they dropped: each distinct
//! component+message pair is kept once with an occurrence count, printed
//! to stderr the first time it appears (unless [`silence`]d), and
//! inspectable afterwards through [`recorded`] so an embedder can surface
//! parse problems in its own UI instead of scraping stderr.
//!
//! The log is thread-local, like the atom table and the computed-style
//! arena: the engine runs one instance per thread, so each thread gets
//! its own diagnostic stream and no locking is involved.

use std::cell::RefCell;
use std::fmt;

/// One recorded recoverable condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Which part of the engine reported it (`"sheet"`, `"selector"`, ...).
    pub component: String,
    /// What was dropped or worked around.
    pub message: String,
    /// How many times this exact condition recurred since the last
    /// [`clear`]. A big count against one message usually means one
    /// malformed rule hit once per element, not many distinct problems.
    pub occurrences: u32,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.component, self.message)?;
        if self.occurrences > 1 {
            write!(f, " (x{})", self.occurrences)?;
        }
        Ok(())
    }
}

#[derive(Default)]
struct Log {
    /// First-seen order; linear scan is fine at the handful of distinct
    /// diagnostics a real document produces.
    entries: Vec<Diagnostic>,
    silenced: bool,
}

thread_local! {
    static LOG: RefCell<Log> = RefCell::new(Log::default());
}

/// Record a recoverable condition. The first occurrence of each distinct
/// component+message pair prints a warning to stderr (unless [`silence`]d);
/// repeats only bump its count.
pub fn warn_once(component: &str, message: &str) {
    LOG.with(|log| {
        let mut log = log.borrow_mut();
        if let Some(existing) = log
            .entries
            .iter_mut()
            .find(|d| d.component == component && d.message == message)
        {
            existing.occurrences += 1;
            return;
        }
        if !log.silenced {
            eprintln!("koala-css [{component}] warning: {message}");
        }
        log.entries.push(Diagnostic {
            component: component.to_string(),
            message: message.to_string(),
            occurrences: 1,
        });
    });
}

/// Stop (or resume) printing newly recorded diagnostics to stderr.
/// Recording itself continues either way, so [`recorded`] sees the same
/// entries regardless.
pub fn silence(silenced: bool) {
    LOG.with(|log| log.borrow_mut().silenced = silenced);
}

/// Every diagnostic recorded on this thread since the last [`clear`], in
/// first-seen order.
#[must_use]
pub fn recorded() -> Vec<Diagnostic> {
    LOG.with(|log| log.borrow().entries.clone())
}

/// Forget all recorded diagnostics, so a recurring condition in the next
/// document is reported (and printed) again. Callers typically invoke
/// this between independent documents.
pub fn clear() {
    LOG.with(|log| log.borrow_mut().entries.clear());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeats_accumulate_on_one_entry() {
        silence(true);
        clear();
        warn_once("sheet", "bad declaration dropped");
        warn_once("sheet", "bad declaration dropped");
        warn_once("sheet", "bad declaration dropped");
        let entries = recorded();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].occurrences, 3);
    }

    #[test]
    fn distinct_components_are_distinct_entries() {
        silence(true);
        clear();
        warn_once("sheet", "oops");
        warn_once("selector", "oops");
        assert_eq!(recorded().len(), 2);
    }

    #[test]
    fn clear_forgets_everything() {
        silence(true);
        warn_once("sheet", "transient");
        clear();
        assert!(recorded().is_empty());
    }

    #[test]
    fn display_includes_the_count_only_when_repeated() {
        let once = Diagnostic {
            component: "sheet".to_string(),
            message: "late @charset ignored".to_string(),
            occurrences: 1,
        };
        assert_eq!(once.to_string(), "[sheet] late @charset ignored");
        let many = Diagnostic { occurrences: 4, ..once };
        assert_eq!(many.to_string(), "[sheet] late @charset ignored (x4)");
    }
}
