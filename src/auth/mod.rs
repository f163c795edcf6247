//! User accounts and bearer token authentication.

mod log_in;
mod password;
mod register;
mod token;
mod user;

pub use log_in::{AuthResponse, LogInForm, MeResponse, get_me, post_log_in};
pub use password::{PasswordHash, ValidatedPassword};
pub use register::{RegisterForm, register_user};
pub use token::{Claims, JwtKeys, TOKEN_LIFETIME, auth_guard, decode_token, encode_token};
pub use user::{MongoUserStore, NewUser, User, UserId, UserProfile, UserStore};
