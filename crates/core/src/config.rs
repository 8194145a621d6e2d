use std::env;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_u16(key: &str, default: u16) -> u16 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub engine: EngineConfig,
    pub encoder: EncoderConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig::from_env(),
            engine: EngineConfig::from_env(),
            encoder: EncoderConfig::from_env(),
        }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!(
            "  server:   host={}, port={}",
            self.server.host,
            self.server.port
        );
        tracing::info!(
            "  engine:   topK={}, minSimilarity={}, minClusterSize={}",
            self.engine.top_k,
            self.engine.min_similarity,
            self.engine.min_cluster_size
        );
        tracing::info!("  encoder:  dimensions={}", self.encoder.dimensions);
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
}

impl ServerConfig {
    fn from_env() -> Self {
        Self {
            host: env_or("HOST", "0.0.0.0"),
            port: env_u16("PORT", 8000),
            cors_origin: env_or("CORS_ORIGIN", "*"),
        }
    }
}

// ── Engine defaults ───────────────────────────────────────────

/// Request-level defaults for ranking and clustering. Individual
/// requests may override each of these per call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub top_k: usize,
    pub min_similarity: f64,
    pub min_cluster_size: usize,
}

impl EngineConfig {
    fn from_env() -> Self {
        Self {
            top_k: env_usize("ENGINE_TOP_K", 10),
            min_similarity: env_f64("ENGINE_MIN_SIMILARITY", 0.3),
            min_cluster_size: env_usize("ENGINE_MIN_CLUSTER_SIZE", 5),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            min_similarity: 0.3,
            min_cluster_size: 5,
        }
    }
}

// ── Profile encoder ───────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Dimension of encoded profile vectors.
    pub dimensions: usize,
}

impl EncoderConfig {
    fn from_env() -> Self {
        Self {
            dimensions: env_usize("ENCODER_DIMENSIONS", 100),
        }
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self { dimensions: 100 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_defaults() {
        let engine = EngineConfig::default();
        assert_eq!(engine.top_k, 10);
        assert_eq!(engine.min_similarity, 0.3);
        assert_eq!(engine.min_cluster_size, 5);
    }

    #[test]
    fn encoder_default_dimension() {
        assert_eq!(EncoderConfig::default().dimensions, 100);
    }
}
