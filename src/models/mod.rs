//! Domain entities and their mapping to store documents.
//!
//! JSON field names match what the site frontend and build tooling read.

mod backup;
mod hash_list;
mod like;
pub mod mapper;
mod post;

pub use backup::*;
pub use hash_list::*;
pub use like::*;
pub use post::*;
