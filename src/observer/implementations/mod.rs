pub mod audit_timestamps;
pub mod restrict_owned_articles;

pub use audit_timestamps::AuditTimestampObserver;
pub use restrict_owned_articles::RestrictOwnedArticlesObserver;
