//! Global Constants
//!
//! Centralized limits and defaults for the course engine.

/// Course outline constants
pub mod outline {
    /// Smallest chapter count accepted at the input boundary
    pub const MIN_CHAPTERS: u8 = 1;

    /// Largest chapter count accepted at the input boundary
    pub const MAX_CHAPTERS: u8 = 20;

    /// Chapter count used when nothing else is configured
    pub const DEFAULT_CHAPTERS: u8 = 5;
}

/// User-supplied input limits
pub mod input {
    /// Largest image accepted by the solver (4 MiB)
    pub const MAX_IMAGE_BYTES: usize = 4 * 1024 * 1024;
}

/// HTTP/Network constants
pub mod network {
    /// Default request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
}

/// Generation tuning
pub mod generation {
    /// Default sampling temperature
    pub const DEFAULT_TEMPERATURE: f32 = 0.7;

    /// Default output token ceiling
    pub const DEFAULT_MAX_TOKENS: usize = 8192;

    /// Characters of a failed response kept in error messages
    pub const ERROR_PREVIEW_CHARS: usize = 200;

    /// Generation tasks in flight at once during a whole-course run
    pub const MAX_CONCURRENT_TASKS: usize = 4;
}
