mod health;
mod users;

pub use health::*;
pub use users::*;
