// handlers/protected/mod.rs - Endpoints behind jwt_auth_middleware
//
// Every handler here can rely on an `AuthUser` extension being present.
pub mod article;
pub mod user;
