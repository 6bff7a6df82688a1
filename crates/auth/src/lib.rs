// Core modules
mod error;
mod jwt;
mod password;

pub mod model;
pub mod service;

pub use error::{AuthError, Result};

// Credential hashing and token primitives
pub use jwt::{Claims, TokenIssuer};
pub use password::{generate_password, hash_password, verify_password, MAX_PASSWORD_BYTES};

pub use model::{Account, AccountUpdate, NewAccount, Role};
pub use service::AccountService;
