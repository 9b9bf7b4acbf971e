//! Route handlers, grouped by domain.

mod downloads;
mod system;

// Glob re-exports keep the utoipa path structs visible to ApiDoc.
pub use downloads::*;
pub use system::*;
