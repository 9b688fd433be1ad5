pub mod article_service;
pub mod auth_service;
pub mod error;
pub mod mailer;
pub mod pending_registrations;
pub mod user_service;
pub mod validation;

pub use article_service::ArticleService;
pub use auth_service::{AuthService, LoginResult};
pub use error::ServiceError;
pub use mailer::{LogMailer, Mailer};
pub use pending_registrations::PendingRegistrations;
pub use user_service::UserService;
