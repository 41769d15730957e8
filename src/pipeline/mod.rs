//! Generation pipeline: transcript → prompt → model → parsed SOP → one write.

mod error;
mod generator;
pub mod parse;
pub mod prompt;

pub use error::GenerateError;
pub use generator::{SopGenerator, MIN_TRANSCRIPT_LEN};
