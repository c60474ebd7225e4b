// Utilities module
// Helper functions and tools

pub mod dates;
pub mod paths;
pub mod patterns;

pub use dates::DateFormat;
pub use paths::{absolute_path, is_inside, mirror_path, normalize_path, resolve_path, versioned_path};
pub use patterns::{is_comment, ExclusionSet};
