//! Store trait: the interface the service layer allocates through.
//!
//! Implementations include the DBF-backed [`crate::DbfStore`] and the
//! in-memory [`crate::MemoryStore`] used in tests.

use ecf_sequence_core::{Channel, Sequence, TypeDefinition};

use crate::error::Result;

/// A source of gapless, per-type, per-channel sequence numbers.
///
/// Calls are synchronous and block until the store's exclusive section is
/// free. Async callers should run them on a blocking thread.
pub trait SequenceStore: Send + Sync {
    /// Every live type definition, in storage order.
    fn list_types(&self) -> Result<Vec<TypeDefinition>>;

    /// Issue the next number for `type_code` on `channel`.
    ///
    /// The first live row whose serial prefix starts with `type_code` is
    /// used; its counter is incremented by exactly one and persisted before
    /// this returns.
    fn allocate(&self, type_code: &str, channel: Channel) -> Result<Sequence>;

    /// Like [`SequenceStore::allocate`], with the channel given as text.
    ///
    /// An unknown channel fails before storage is touched.
    fn allocate_str(&self, type_code: &str, channel: &str) -> Result<Sequence> {
        let channel = Channel::parse(channel)?;
        self.allocate(type_code, channel)
    }
}

impl<S: SequenceStore + ?Sized> SequenceStore for std::sync::Arc<S> {
    fn list_types(&self) -> Result<Vec<TypeDefinition>> {
        (**self).list_types()
    }

    fn allocate(&self, type_code: &str, channel: Channel) -> Result<Sequence> {
        (**self).allocate(type_code, channel)
    }
}
