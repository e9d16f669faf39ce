pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("POSTS_PG_DSN is not a valid Postgres DSN: {0}")]
	InvalidDsn(sqlx::Error),
	#[error("No maintenance database ({tried}) accepted the connection: {reason}")]
	AdminUnavailable { tried: String, reason: String },
	#[error("Failed to create test database {name}: {source}")]
	Create { name: String, source: sqlx::Error },
	#[error("Failed to drop test database {name}: {source}")]
	Drop { name: String, source: sqlx::Error },
	#[error("Cleanup runtime could not start: {0}")]
	Runtime(#[from] std::io::Error),
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
}
