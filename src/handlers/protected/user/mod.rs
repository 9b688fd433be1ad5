// handlers/protected/user/mod.rs - /api/user routes
//
// POST /api/user               → create
// GET  /api/user/me            → me
// GET  /api/user/id/:id        → get_by_id
// GET  /api/user/email/:email  → get_by_email
// PUT  /api/user/:id           → update (self only)

pub mod create;
pub mod get;
pub mod me;
pub mod update;

pub use create::create;
pub use get::{get_by_email, get_by_id};
pub use me::me;
pub use update::update;
