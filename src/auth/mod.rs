//! User accounts, session tokens, and the middleware that guards protected routes.

mod current_user;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod register_user;
mod token;
mod user;

pub use current_user::get_current_user;
pub use log_in::post_log_in;
pub use log_out::{post_log_out, post_log_out_all};
pub use middleware::{AuthState, AuthenticatedUser, auth_guard};
pub use password::{MIN_PASSWORD_LENGTH, PasswordHash, ValidatedPassword};
pub use register_user::register_user;
pub use token::{Claims, TokenError, TokenService};
pub use user::{
    CredentialStore, NewUser, User, UserID, create_user_table, create_user_token_table,
    parse_email,
};
