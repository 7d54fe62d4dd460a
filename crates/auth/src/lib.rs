//! `staffsight-auth` — pure authentication boundary (zero-trust).
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod claims;
pub mod principal;
pub mod roles;
pub mod validator;

pub use claims::{validate_claims, JwtClaims, TokenValidationError};
pub use principal::PrincipalId;
pub use roles::Role;
pub use validator::{Hs256JwtValidator, JwtValidator};
