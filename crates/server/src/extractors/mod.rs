pub mod auth_user;
pub mod validation_extractor;

pub use auth_user::AuthUser;
pub use validation_extractor::ValidationExtractor;
