// Save pipeline: observers that inspect and rewrite pending entries before
// DbContext::save_changes turns them into writes.

pub mod context;
pub mod error;
pub mod implementations;
pub mod pipeline;
pub mod traits;

pub use context::SaveContext;
pub use error::ObserverError;
pub use implementations::{AuditTimestampObserver, RestrictOwnedArticlesObserver};
pub use pipeline::ObserverPipeline;
pub use traits::{Observer, ObserverRing, SaveObserver};
