//! Writer limits and configuration

/// Limits guarding the writer against runaway input
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum number of simultaneously open containers (default: 256)
    pub max_nesting_depth: usize,
    /// Maximum total encoded size in bytes (default: 256 MiB)
    pub max_buffer_len: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_nesting_depth: 256,
            max_buffer_len: 256 * 1024 * 1024,
        }
    }
}
