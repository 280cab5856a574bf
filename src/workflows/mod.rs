pub mod generate;
pub mod templates;

pub use generate::{Generation, GenerationSource, MessageGenerator};
