//! Configuration for parallel lookup operations

use crate::error::LutResult;
use crate::lookup::SimdLevel;

/// Default chunk handed to each worker: 1 MiB
pub const DEFAULT_CHUNK_SIZE: usize = 1 << 20;

/// Configuration for [`transform_parallel`](crate::lookup::transform_parallel)
#[derive(Debug, Clone)]
pub struct TransformConfig {
    /// Number of threads for computation (0 = auto-detect)
    pub threads: usize,
    /// Whether to use parallel processing (false = single-threaded everything)
    pub parallel: bool,
    /// Bytes per parallel work item
    pub chunk_size: usize,
    /// Force a specific implementation (None = detected level)
    pub level: Option<SimdLevel>,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            threads: 0, // Auto-detect CPU cores
            parallel: true,
            chunk_size: DEFAULT_CHUNK_SIZE,
            level: None,
        }
    }
}

impl TransformConfig {
    pub fn new(threads: usize, parallel: bool) -> Self {
        Self {
            threads,
            parallel,
            ..Self::default()
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_level(mut self, level: SimdLevel) -> Self {
        self.level = Some(level);
        self
    }

    /// Build from `apply` subcommand arguments
    ///
    /// A `--level` of `auto` (or none given) keeps the detected level.
    pub fn from_args(matches: &clap::ArgMatches) -> LutResult<Self> {
        let threads = matches
            .get_one::<String>("threads")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);

        let parallel = !matches.get_flag("no-parallel");

        let chunk_size = matches
            .get_one::<String>("chunk_size")
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_CHUNK_SIZE);

        let level = match matches.get_one::<String>("level").map(String::as_str) {
            None | Some("auto") => None,
            Some(name) => Some(name.parse::<SimdLevel>()?),
        };

        Ok(Self {
            threads,
            parallel,
            chunk_size,
            level,
        })
    }

    /// Get effective thread count (auto-detect if 0)
    pub fn effective_threads(&self) -> usize {
        match (self.parallel, self.threads) {
            (false, _) => 1, // Sequential mode always uses single thread
            (true, 0) => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4), // Auto-detect CPU cores
            (true, n) => n,
        }
    }
}
