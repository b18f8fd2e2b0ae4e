//! Authentication module
//!
//! Both harvest endpoints authenticate with a bearer credential in the
//! `Authorization` header. The credential is usually a JWT; when it is, its
//! `exp` claim is inspected so an expired token is reported before the run
//! makes any request.

mod bearer;

pub use bearer::BearerToken;
