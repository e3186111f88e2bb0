//! Location directory subsystem.
//!
//! Provides option lists for the province → municipality → barangay
//! hierarchy from the PSGC REST directory, a local cache, and a built-in
//! sample dataset for offline use.

pub mod cache;
pub mod directory;
pub mod lookup;
pub mod providers;
pub mod resolver;
pub mod types;

pub use cache::{CacheSnapshot, OptionCache};
pub use directory::Directory;
pub use lookup::match_option;
pub use providers::{HttpDirectory, DEFAULT_DIRECTORY_URL};
pub use resolver::DirectoryResolver;
pub use types::{Level, LocationError, LocationOption, OptionsKey};
