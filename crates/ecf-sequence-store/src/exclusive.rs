//! Single-writer critical section.
//!
//! Every operation on a store runs while holding an [`ExclusiveAccess`]
//! guard, so at most one read-modify-write of the table is in flight per
//! process. Waiters park without timeout.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// A process-local exclusive section.
#[derive(Debug, Default)]
pub struct ExclusiveSection {
    lock: Mutex<()>,
}

/// Proof that the holder is the only caller inside the section.
///
/// Released on drop.
#[derive(Debug)]
pub struct ExclusiveAccess<'a> {
    _guard: MutexGuard<'a, ()>,
}

impl ExclusiveSection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the section is free and enter it.
    ///
    /// A panic inside a previous holder does not wedge the section: the
    /// lock protects no in-memory state, and every holder re-reads the
    /// table from disk.
    pub fn enter(&self) -> ExclusiveAccess<'_> {
        let guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        ExclusiveAccess { _guard: guard }
    }

    /// Enter the section if it is free right now.
    pub fn try_enter(&self) -> Option<ExclusiveAccess<'_>> {
        match self.lock.try_lock() {
            Ok(guard) => Some(ExclusiveAccess { _guard: guard }),
            Err(std::sync::TryLockError::Poisoned(p)) => Some(ExclusiveAccess {
                _guard: p.into_inner(),
            }),
            Err(std::sync::TryLockError::WouldBlock) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_section_is_exclusive() {
        let section = ExclusiveSection::new();
        let held = section.enter();
        assert!(section.try_enter().is_none());
        drop(held);
        assert!(section.try_enter().is_some());
    }

    #[test]
    fn test_section_survives_panicking_holder() {
        let section = Arc::new(ExclusiveSection::new());
        let s = section.clone();
        let result = thread::spawn(move || {
            let _access = s.enter();
            panic!("holder panicked");
        })
        .join();
        assert!(result.is_err());

        let _access = section.enter();
    }
}
