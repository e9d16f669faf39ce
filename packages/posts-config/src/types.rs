use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub enrichment: Enrichment,
	#[serde(default)]
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub identity: IdentityProviderConfig,
}

/// Remote identity service used to resolve actor references on posts.
#[derive(Debug, Deserialize)]
pub struct IdentityProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Enrichment {
	/// Upper bound on identity lookups in flight for a single request.
	pub max_concurrency: usize,
}
impl Default for Enrichment {
	fn default() -> Self {
		Self { max_concurrency: 8 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Security {
	pub bind_localhost_only: bool,
}
impl Default for Security {
	fn default() -> Self {
		Self { bind_localhost_only: true }
	}
}

fn default_log_level() -> String {
	"info".to_string()
}
