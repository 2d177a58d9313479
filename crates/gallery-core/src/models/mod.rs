//! Data models shared by the API client and the query cache.
//!
//! Field names follow the JSON the gallery API emits (camelCase).

mod api_response;
mod filters;
mod image;

pub use api_response::*;
pub use filters::*;
pub use image::*;
