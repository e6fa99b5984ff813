//! The error-accumulation mix-in (§4.6).
//!
//! The original expresses "plain" and "details" variants of every
//! structural type via a template-parameter base class. A single struct
//! that always carries an optional list is the idiomatic Rust rendition
//! of that split (spec.md §9, "Error-list mix-in"): `ErrorList` is empty
//! (zero heap allocation) until the first error is recorded.

use crate::error::PeError;

/// One recorded fault against the object that exhibited it.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorEntry {
    pub kind: PeError,
    pub context: Option<String>,
}

/// An append-only, unique-by-kind list of recoverable faults.
///
/// Every loader-produced structural type owns one of these ("the details
/// form"); stripping it to a plain value is left to the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorList {
    entries: Vec<ErrorEntry>,
}

impl ErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `kind`, unless an entry with the same kind is already
    /// present (re-adding is idempotent).
    pub fn add_error(&mut self, kind: PeError) {
        self.add_error_with_context(kind, None);
    }

    pub fn add_error_with_context(&mut self, kind: PeError, context: Option<String>) {
        if self.entries.iter().any(|e| e.kind == kind) {
            return;
        }
        tracing::debug!(code = kind.code(), %kind, "recorded structural fault");
        self.entries.push(ErrorEntry { kind, context });
    }

    pub fn has_errors(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn get_errors(&self) -> impl Iterator<Item = &ErrorEntry> {
        self.entries.iter()
    }

    /// Merges another object's error set into this one. Used to roll a
    /// sub-object's faults up to its parent's aggregate view without
    /// losing the originally-recorded kinds (§8 property 9).
    pub fn extend(&mut self, other: &ErrorList) {
        for entry in &other.entries {
            self.add_error_with_context(entry.kind.clone(), entry.context.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_adding_same_kind_is_idempotent() {
        let mut list = ErrorList::new();
        list.add_error(PeError::InvalidDosMagic);
        list.add_error(PeError::InvalidDosMagic);
        assert_eq!(list.get_errors().count(), 1);
    }

    #[test]
    fn distinct_kinds_accumulate() {
        let mut list = ErrorList::new();
        list.add_error(PeError::InvalidDosMagic);
        list.add_error(PeError::UnsortedEntries);
        assert_eq!(list.get_errors().count(), 2);
    }

    #[test]
    fn extend_never_drops_existing_entries() {
        let mut parent = ErrorList::new();
        parent.add_error(PeError::EntryDoesNotExist);
        let mut child = ErrorList::new();
        child.add_error(PeError::UnsortedEntries);
        parent.extend(&child);
        assert_eq!(parent.get_errors().count(), 2);
    }
}
