pub mod clock;
pub mod jwt;
pub mod password;
pub mod token;

pub use clock::*;
pub use jwt::*;
pub use password::*;
pub use token::*;
