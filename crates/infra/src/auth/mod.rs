//! Claims-based authentication (WS-Trust token exchange + form sign-in)

pub mod authenticator;
pub mod envelope;

pub use authenticator::Authenticator;
