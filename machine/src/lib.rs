mod definition;
mod error;
mod properties;
mod resolver;
mod spec;
mod variant;
mod variants;

pub use crate::definition::*;
pub use crate::error::*;
pub use crate::properties::*;
pub use crate::resolver::*;
pub use crate::variant::*;
pub use crate::variants::*;
