use axum::{
	Json, Router,
	extract::{FromRequestParts, Path, Query, State},
	http::{StatusCode, request::Parts},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use posts_domain::query::Page;
use posts_service::{
	BulkDeleteRequest, BulkDeleteResponse, CreatePostRequest, Error as ServiceError, PostView,
	UpdatePostRequest,
};

use crate::state::AppState;

/// Header the upstream gateway sets to the authenticated user's id.
pub const USER_ID_HEADER: &str = "x-user-id";

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/posts", get(list_posts).post(create_post))
		.route("/v1/posts/bulk-delete", post(bulk_delete_posts))
		.route("/v1/posts/{id}", get(get_post).patch(update_post).delete(delete_post))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn list_posts(
	State(state): State<AppState>,
	Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Page<PostView>>, ApiError> {
	let params = query_params(pairs);
	let page = state.service.list_posts(&params).await?;

	Ok(Json(page))
}

async fn get_post(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<PostView>, ApiError> {
	let post = state.service.get_post(parse_id(&id)?).await?;

	Ok(Json(post))
}

async fn create_post(
	State(state): State<AppState>,
	ActingUser(actor): ActingUser,
	Json(payload): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostView>), ApiError> {
	let post = state.service.create_post(payload, actor).await?;

	Ok((StatusCode::CREATED, Json(post)))
}

async fn update_post(
	State(state): State<AppState>,
	ActingUser(actor): ActingUser,
	Path(id): Path<String>,
	Json(payload): Json<UpdatePostRequest>,
) -> Result<Json<PostView>, ApiError> {
	let post = state.service.update_post(parse_id(&id)?, payload, actor).await?;

	Ok(Json(post))
}

async fn delete_post(
	State(state): State<AppState>,
	ActingUser(actor): ActingUser,
	Path(id): Path<String>,
) -> Result<Json<PostView>, ApiError> {
	let post = state.service.delete_post(parse_id(&id)?, actor).await?;

	Ok(Json(post))
}

async fn bulk_delete_posts(
	State(state): State<AppState>,
	ActingUser(actor): ActingUser,
	Json(payload): Json<BulkDeleteRequest>,
) -> Result<Json<BulkDeleteResponse>, ApiError> {
	let response = state.service.bulk_delete_posts(payload, actor).await?;

	Ok(Json(response))
}

/// Authenticated caller, read from [`USER_ID_HEADER`].
pub struct ActingUser(pub Uuid);
impl<S> FromRequestParts<S> for ActingUser
where
	S: Send + Sync,
{
	type Rejection = ApiError;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		let raw = parts
			.headers
			.get(USER_ID_HEADER)
			.and_then(|value| value.to_str().ok())
			.map(str::trim)
			.filter(|value| !value.is_empty())
			.ok_or_else(|| {
				json_error(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Missing acting user.")
			})?;
		let id = Uuid::parse_str(raw).map_err(|_| {
			json_error(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Acting user id is not a UUID.")
		})?;

		Ok(Self(id))
	}
}

/// Folds decoded query pairs into the map the list normalizer reads.
///
/// Repeated keys and `key[]` collect into arrays; `key[op]` builds a bounds object.
pub fn query_params(pairs: Vec<(String, String)>) -> Map<String, Value> {
	let mut params = Map::new();

	for (key, value) in pairs {
		let value = Value::String(value);

		if let Some(base) = key.strip_suffix("[]") {
			push_item(&mut params, base, value);

			continue;
		}
		if let Some((base, rest)) = key.split_once('[')
			&& let Some(op) = rest.strip_suffix(']')
			&& !base.is_empty()
			&& !op.is_empty()
		{
			let entry = params.entry(base.to_string()).or_insert_with(|| Value::Object(Map::new()));

			if !entry.is_object() {
				*entry = Value::Object(Map::new());
			}
			if let Value::Object(bounds) = entry {
				bounds.insert(op.to_string(), value);
			}

			continue;
		}

		if params.contains_key(&key) {
			push_item(&mut params, &key, value);
		} else {
			params.insert(key, value);
		}
	}

	params
}

fn push_item(params: &mut Map<String, Value>, key: &str, value: Value) {
	match params.get_mut(key) {
		Some(Value::Array(items)) => items.push(value),
		Some(existing) => {
			let first = existing.take();

			*existing = Value::Array(vec![first, value]);
		},
		None => {
			params.insert(key.to_string(), Value::Array(vec![value]));
		},
	}
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
	Uuid::parse_str(raw).map_err(|_| {
		json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", format!("{raw} is not a valid post id."))
	})
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::Validation { message } =>
				json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message),
			ServiceError::NotFound { message } =>
				json_error(StatusCode::NOT_FOUND, "NOT_FOUND", message),
			ServiceError::Dependency { message } => {
				tracing::error!(error = %message, "Storage dependency failed.");

				json_error(StatusCode::BAD_GATEWAY, "DEPENDENCY_ERROR", "Storage is unavailable.")
			},
			ServiceError::Provider { message } => {
				tracing::error!(error = %message, "Identity provider failed.");

				json_error(StatusCode::BAD_GATEWAY, "PROVIDER_ERROR", "Identity provider failed.")
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}

pub fn json_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
	ApiError::new(status, code, message)
}
