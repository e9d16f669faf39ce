use posts_domain::ValidationError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	Validation { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Dependency error: {message}")]
	Dependency { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
}
impl Error {
	pub(crate) fn validation(message: impl Into<String>) -> Self {
		Self::Validation { message: message.into() }
	}

	pub(crate) fn post_not_found(id: uuid::Uuid) -> Self {
		Self::NotFound { message: format!("Post {id} does not exist.") }
	}
}

impl From<ValidationError> for Error {
	fn from(err: ValidationError) -> Self {
		Self::Validation { message: err.to_string() }
	}
}

impl From<posts_storage::Error> for Error {
	fn from(err: posts_storage::Error) -> Self {
		match err {
			posts_storage::Error::Sqlx(inner) => Self::Dependency { message: inner.to_string() },
			posts_storage::Error::InvalidArgument(message) => Self::Validation { message },
		}
	}
}

impl From<color_eyre::Report> for Error {
	fn from(err: color_eyre::Report) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
