mod engine;
mod host;

pub use engine::*;
pub use host::*;
