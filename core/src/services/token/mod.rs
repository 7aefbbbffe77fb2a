//! Token issuance and verification.

mod codec;

pub use codec::{IssuedToken, TokenCodec};
