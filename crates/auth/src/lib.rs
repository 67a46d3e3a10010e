//! `ledgerbook-auth`: identity primitives: accounts, credentials and tokens.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod account;
pub mod claims;
pub mod jwt;
pub mod password;

pub use account::{Account, AccountProfile, Email, NewAccount};
pub use claims::{TokenClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256Jwt, IssuedToken, JwtError, JwtIssuer, JwtValidator};
pub use password::{Argon2Hasher, PasswordError, PasswordHasher};
