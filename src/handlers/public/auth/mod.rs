// handlers/public/auth/mod.rs - Token acquisition and registration
//
// POST /api/auth/login             → login
// POST /api/auth/register          → register
// POST /api/auth/register/confirm  → confirm

pub mod confirm;
pub mod login;
pub mod register;

pub use confirm::confirm;
pub use login::login;
pub use register::register;

use crate::server::AppState;
use crate::services::AuthService;

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(state.db(), state.jwt.clone(), state.config.registration.clone())
}
