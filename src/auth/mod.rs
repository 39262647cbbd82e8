mod cookie;
mod middleware;
mod password;
mod token;

pub use cookie::{clear_session_cookie, extract_token, session_cookie, SESSION_COOKIE};
pub use middleware::{authenticate, require_admin, CurrentUser};
pub use password::{hash_password, verify_password, PasswordError};
pub use token::{TokenError, TokenIssuer, TOKEN_TTL_DAYS};
