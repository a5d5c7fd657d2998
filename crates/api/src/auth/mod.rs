//! Access-token verification. Tokens are issued by the external auth
//! service; this crate only validates them.

pub mod jwt;
