pub mod download;
pub mod list;
pub mod manage;
pub mod types;
pub mod upload;

pub use types::*;

// Globs so the `__path_*` items behind `#[utoipa::path]` travel with each handler.
pub use download::*;
pub use list::*;
pub use manage::*;
pub use upload::*;
