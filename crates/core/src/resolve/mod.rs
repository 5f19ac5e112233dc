//! Cross-file resolution: repair, index, resolve
//!
//! Runs strictly after parsing, single-threaded, over the complete per-file
//! map. [`repair::repair_basic_info`] must run before
//! [`index::CrossFileIndex::build`].

pub mod index;
pub mod repair;
pub mod resolver;

pub use index::CrossFileIndex;
pub use repair::repair_basic_info;
pub use resolver::{
    normalize_import_path, CallResolver, Resolution, ResolutionStats, ResolveOptions,
    DEFAULT_AMBIGUITY_CAP,
};
