//! Transactional persistence for processed match records.
//!
//! The consumer talks to storage through the [`MatchStore`] trait so the
//! pipeline can be exercised against [`mock::MemoryMatchStore`] without a
//! database. The real gateway is [`PgMatchStore`].

pub mod mock;
mod pg;

use async_trait::async_trait;

use crate::error::PersistenceError;
use crate::model::MatchRecord;

pub use mock::MemoryMatchStore;
pub use pg::PgMatchStore;

/// Storage gateway for match records.
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Persist a batch of records produced from one message.
    ///
    /// The whole batch is written inside a single transaction, in the order
    /// supplied. On any write failure nothing from the batch becomes
    /// visible and the error propagates to the caller.
    async fn persist_batch(&self, records: &[MatchRecord]) -> Result<(), PersistenceError>;

    /// Return all currently persisted records.
    async fn all_matches(&self) -> Result<Vec<MatchRecord>, PersistenceError>;
}
