//! Environment-driven configuration for the conduit subsystem.
//!
//! Mirrors the teacher's `CONDOW_`-prefixed env-var convention
//! (`helpers::env_funs!`): every knob is a typed newtype that knows its own
//! environment variable name and parses itself, falling back to a default
//! when the variable is absent or unparsable.
use std::time::Duration;

const ENV_PREFIX: &str = "FILEWAY";

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(format!("{ENV_PREFIX}_{name}"))
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Chunk-plan ceiling, in bytes. `CHUNK_SIZE_KB`, default 4096 (4 MiB).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ChunkCeiling(u64);

impl ChunkCeiling {
    pub const DEFAULT_KB: u64 = 4096;

    pub fn from_env() -> Self {
        Self(env_u64("CHUNK_SIZE_KB", Self::DEFAULT_KB) * 1024)
    }

    pub fn bytes(self) -> u64 {
        self.0
    }
}

impl Default for ChunkCeiling {
    fn default() -> Self {
        Self(Self::DEFAULT_KB * 1024)
    }
}

/// Length, in characters, of generated conduit ids. `RANDOM_IDS_LENGTH`, default 33.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct IdLength(usize);

impl IdLength {
    pub const DEFAULT: usize = 33;

    pub fn from_env() -> Self {
        Self(env_u64("RANDOM_IDS_LENGTH", Self::DEFAULT as u64) as usize)
    }

    pub fn chars(self) -> usize {
        self.0
    }
}

impl Default for IdLength {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// Capacity of a non-text conduit's chunk channel. `BUFFER_QUEUE_SIZE`, default 4.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BufferQueueSize(usize);

impl BufferQueueSize {
    pub const DEFAULT: usize = 4;

    pub fn from_env() -> Self {
        Self(env_u64("BUFFER_QUEUE_SIZE", Self::DEFAULT as u64) as usize)
    }

    pub fn depth(self) -> usize {
        self.0
    }
}

impl Default for BufferQueueSize {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// Idle-conduit expiry. `UPLOAD_TIMEOUT_SECS`, default 240s.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ExpirySecs(u64);

impl ExpirySecs {
    pub const DEFAULT: u64 = 240;

    pub fn from_env() -> Self {
        Self(env_u64("UPLOAD_TIMEOUT_SECS", Self::DEFAULT))
    }

    /// Builds an expiry directly, bypassing the environment. Used by tests
    /// that need a short expiry window.
    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub fn millis(self) -> i64 {
        (self.0 * 1000) as i64
    }

    pub fn duration(self) -> Duration {
        Duration::from_secs(self.0)
    }
}

impl Default for ExpirySecs {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// How often the stale-sweep task wakes up. Not exposed via env var in the
/// source; fixed at the faster of the two values the source used historically.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(10);

/// Time a sender's `ping` call waits on the latch before returning `[]`.
pub const PING_TIMEOUT: Duration = Duration::from_secs(20);

/// Time an `offer()` call waits for queue space before failing.
pub const OFFER_TIMEOUT: Duration = Duration::from_secs(30);

/// Threshold under which the chunk plan is just `[size]`.
pub const CHUNK_SIZE_INITIAL: u64 = 4096;

/// Full configuration bundle for a [`crate::ConduitSet`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Config {
    pub chunk_ceiling: ChunkCeiling,
    pub id_length: IdLength,
    pub buffer_queue_size: BufferQueueSize,
    pub expiry: ExpirySecs,
}

impl Config {
    /// Reads every knob from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            chunk_ceiling: ChunkCeiling::from_env(),
            id_length: IdLength::from_env(),
            buffer_queue_size: BufferQueueSize::from_env(),
            expiry: ExpirySecs::from_env(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_ceiling: ChunkCeiling::default(),
            id_length: IdLength::default(),
            buffer_queue_size: BufferQueueSize::default(),
            expiry: ExpirySecs::default(),
        }
    }
}
