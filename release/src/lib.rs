mod distribution;
mod error;
mod extract;
mod index;
mod merge;
mod repofile;
mod resolver;

#[cfg(test)]
mod testing;

pub use crate::distribution::*;
pub use crate::error::*;
pub use crate::extract::*;
pub use crate::index::*;
pub use crate::merge::*;
pub use crate::repofile::*;
pub use crate::resolver::*;

pub use opv_http::HttpTimeouts;
