//! API route modules.

pub mod documents;
pub mod generate;
pub mod quota;
pub mod session;
