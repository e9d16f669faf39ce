mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, Enrichment, IdentityProviderConfig, Postgres, Providers, Security, Service, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}

	let identity = &cfg.providers.identity;

	for (label, value) in [
		("providers.identity.provider_id", &identity.provider_id),
		("providers.identity.api_base", &identity.api_base),
		("providers.identity.api_key", &identity.api_key),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if !identity.path.is_empty() && !identity.path.starts_with('/') {
		return Err(Error::Validation {
			message: "providers.identity.path must start with '/'.".to_string(),
		});
	}
	if identity.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.identity.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if identity.default_headers.values().any(|value| !value.is_string()) {
		return Err(Error::Validation {
			message: "providers.identity.default_headers values must be strings.".to_string(),
		});
	}
	if cfg.enrichment.max_concurrency == 0 {
		return Err(Error::Validation {
			message: "enrichment.max_concurrency must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let identity = &mut cfg.providers.identity;

	if identity.api_base.ends_with('/') {
		identity.api_base = identity.api_base.trim_end_matches('/').to_string();
	}
	if cfg.service.log_level.trim().is_empty() {
		cfg.service.log_level = "info".to_string();
	}
}
