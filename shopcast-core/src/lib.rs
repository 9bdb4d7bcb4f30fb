pub mod error;
pub mod model;

pub use error::EnvelopeError;
pub use model::*;
