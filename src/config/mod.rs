// Sub-modules
mod core;
mod loader;
mod parallel;

// Re-export core types
pub use core::{CacheConfig, DoclintConfig, MarkerConvention, TestLayoutConfig};

// Re-export loader functions
pub use loader::{
    directory_ancestors, load_config, load_config_from, load_config_from_path,
    parse_and_validate_config, CONFIG_FILE_NAME,
};

// Re-export parallel config types
pub use parallel::ParallelConfig;
