//! Location source port (driving/secondary port)
//!
//! Implementations produce a raw position fix, or `None` when no fix is
//! available. Platform errors never escape: they collapse to `None` and are
//! logged by the adapter. Bounding the fetch with a timeout is the caller's
//! responsibility.

use crate::domain::position::Position;

/// Port trait for anything that can produce a position fix
#[async_trait::async_trait]
pub trait ILocationRetriever: Send + Sync {
    /// Fetches the current position, or `None` if no fix is available
    async fn fetch(&self) -> Option<Position>;
}
