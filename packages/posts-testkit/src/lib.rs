//! Throwaway Postgres databases for storage and service tests.

mod error;

pub use error::{Error, Result};

use std::{env, future::Future, str::FromStr, thread};

use sqlx::{
	ConnectOptions, Connection, Executor,
	postgres::{PgConnectOptions, PgConnection},
};
use tokio::runtime::Builder;
use uuid::Uuid;

pub const DSN_ENV: &str = "POSTS_PG_DSN";

const MAINTENANCE_DATABASES: [&str; 2] = ["postgres", "template1"];
const NAME_PREFIX: &str = "posts_test_";

/// A database created beside the one in `POSTS_PG_DSN` and dropped when the test is done.
///
/// Prefer [`TestDatabase::cleanup`]; `Drop` falls back to a blocking drop on a helper thread.
pub struct TestDatabase {
	name: String,
	dsn: String,
	maintenance: PgConnectOptions,
	dropped: bool,
}
impl TestDatabase {
	pub async fn new(base_dsn: &str) -> Result<Self> {
		let base = PgConnectOptions::from_str(base_dsn).map_err(Error::InvalidDsn)?;
		let (maintenance, mut conn) = open_maintenance(&base).await?;
		let name = format!("{NAME_PREFIX}{}", Uuid::new_v4().simple());

		conn.execute(format!(r#"CREATE DATABASE "{name}""#).as_str())
			.await
			.map_err(|source| Error::Create { name: name.clone(), source })?;

		let dsn = base.database(&name).to_url_lossy().to_string();

		Ok(Self { name, dsn, maintenance, dropped: false })
	}

	pub fn dsn(&self) -> &str {
		&self.dsn
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Storage settings pointing at this database.
	pub fn postgres_config(&self, pool_max_conns: u32) -> posts_config::Postgres {
		posts_config::Postgres { dsn: self.dsn.clone(), pool_max_conns }
	}

	pub async fn cleanup(mut self) -> Result<()> {
		self.drop_now().await
	}

	async fn drop_now(&mut self) -> Result<()> {
		if !self.dropped {
			drop_database(&self.name, &self.maintenance).await?;

			self.dropped = true;
		}

		Ok(())
	}
}
impl Drop for TestDatabase {
	fn drop(&mut self) {
		if self.dropped {
			return;
		}

		let name = self.name.clone();
		let maintenance = self.maintenance.clone();
		// May run inside a runtime, so block on a separate one.
		let handle = thread::spawn(move || -> Result<()> {
			let runtime = Builder::new_current_thread().enable_all().build()?;

			runtime.block_on(drop_database(&name, &maintenance))
		});

		match handle.join() {
			Ok(Err(err)) => eprintln!("Test database cleanup failed: {err}."),
			Err(_) => eprintln!("Test database cleanup thread panicked."),
			Ok(Ok(())) => {},
		}
	}
}

pub fn env_dsn() -> Option<String> {
	env::var(DSN_ENV).ok().filter(|dsn| !dsn.trim().is_empty())
}

/// Runs `f` against a fresh database and drops it afterwards, whatever `f` returned.
pub async fn with_test_db<F, Fut, T>(base_dsn: &str, f: F) -> Result<T>
where
	F: FnOnce(&TestDatabase) -> Fut,
	Fut: Future<Output = Result<T>>,
{
	let mut db = TestDatabase::new(base_dsn).await?;
	let outcome = f(&db).await;
	let cleanup = db.drop_now().await;

	match (outcome, cleanup) {
		(Ok(value), Ok(())) => Ok(value),
		(Ok(_), Err(err)) => Err(err),
		(Err(err), cleanup) => {
			if let Err(cleanup_err) = cleanup {
				eprintln!("Test database cleanup failed after test error: {cleanup_err}.");
			}

			Err(err)
		},
	}
}

async fn open_maintenance(base: &PgConnectOptions) -> Result<(PgConnectOptions, PgConnection)> {
	let mut last = None;

	for database in MAINTENANCE_DATABASES {
		let options = base.clone().database(database);

		match PgConnection::connect_with(&options).await {
			Ok(conn) => return Ok((options, conn)),
			Err(err) => last = Some(err),
		}
	}

	Err(Error::AdminUnavailable {
		tried: MAINTENANCE_DATABASES.join(", "),
		reason: last.map(|err| err.to_string()).unwrap_or_default(),
	})
}

async fn drop_database(name: &str, maintenance: &PgConnectOptions) -> Result<()> {
	let mut conn = PgConnection::connect_with(maintenance).await?;

	// Open pool connections would block the drop.
	sqlx::query(
		"SELECT pg_terminate_backend(pid) FROM pg_stat_activity WHERE datname = $1 AND pid <> pg_backend_pid()",
	)
	.bind(name)
	.execute(&mut conn)
	.await?;
	sqlx::query(format!(r#"DROP DATABASE IF EXISTS "{name}""#).as_str())
		.execute(&mut conn)
		.await
		.map_err(|source| Error::Drop { name: name.to_string(), source })?;

	Ok(())
}
