use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use posts_domain::actor::ResolvedActor;

/// HTTP client for the identity service's user lookup.
#[derive(Clone, Debug)]
pub struct IdentityClient {
	client: Client,
	url: String,
	provider_id: String,
}
impl IdentityClient {
	pub fn new(cfg: &posts_config::IdentityProviderConfig) -> Result<Self> {
		let client = Client::builder()
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.default_headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
			.build()?;

		Ok(Self {
			client,
			url: format!("{}{}", cfg.api_base, cfg.path),
			provider_id: cfg.provider_id.clone(),
		})
	}

	pub fn provider_id(&self) -> &str {
		&self.provider_id
	}

	/// Looks up one identity. `Ok(None)` means the service does not know the id.
	pub async fn resolve_actor(&self, id: Uuid) -> Result<Option<ResolvedActor>> {
		let res = self.client.post(&self.url).json(&serde_json::json!({ "id": id })).send().await?;

		if res.status() == StatusCode::NOT_FOUND {
			return Ok(None);
		}

		let json: Value = res.error_for_status()?.json().await?;

		parse_actor_response(json)
	}
}

#[derive(Debug, Deserialize)]
struct Envelope {
	#[serde(default = "default_success")]
	success: bool,
	#[serde(default)]
	payload: Option<Value>,
	#[serde(default)]
	error: Option<Value>,
}

fn default_success() -> bool {
	true
}

fn parse_actor_response(json: Value) -> Result<Option<ResolvedActor>> {
	let envelope: Envelope = serde_json::from_value(json)?;

	if !envelope.success {
		let detail = match envelope.error {
			Some(Value::String(message)) => message,
			Some(other) => other.to_string(),
			None => "no error detail".to_string(),
		};

		return Err(eyre::eyre!("Identity lookup failed: {detail}."));
	}

	match envelope.payload {
		None | Some(Value::Null) => Ok(None),
		Some(payload) => Ok(Some(serde_json::from_value(payload)?)),
	}
}
