use affinity_compute::ProfileEncoder;
use affinity_core::Config;

/// Shared, read-only application state.
///
/// The encoder is the process's vector-producing capability: constructed
/// once at startup and never mutated. Every request computation is
/// otherwise stateless.
pub struct AppState {
    pub config: Config,
    pub encoder: ProfileEncoder,
}
