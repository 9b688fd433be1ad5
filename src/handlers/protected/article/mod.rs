// handlers/protected/article/mod.rs - /api/article routes
//
// POST   /api/article                      → create
// GET    /api/article/:id                  → get (?includeDeleted=)
// PUT    /api/article/:id                  → update
// DELETE /api/article/:id                  → delete (soft)
// GET    /api/article/user/:user_id/all    → list_by_owner (?includeDeleted=)

pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod update;

pub use create::create;
pub use delete::delete;
pub use get::get;
pub use list::list_by_owner;
pub use update::update;
