use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{Result, schema};

const SCHEMA_LOCK_ID: i64 = 5_102_071;

pub struct Db {
	pub pool: PgPool,
}
impl Db {
	pub async fn connect(cfg: &posts_config::Postgres) -> Result<Self> {
		let pool =
			PgPoolOptions::new().max_connections(cfg.pool_max_conns).connect(&cfg.dsn).await?;

		Ok(Self { pool })
	}

	/// Applies the bundled schema. Safe to call from several processes at once.
	pub async fn ensure_schema(&self) -> Result<()> {
		let sql = schema::render_schema();
		// Transaction-scoped so the lock is released on commit or rollback.
		let mut tx = self.pool.begin().await?;

		sqlx::query("SELECT pg_advisory_xact_lock($1)").bind(SCHEMA_LOCK_ID).execute(&mut *tx).await?;

		let mut applied = 0_usize;

		for statement in sql.split(';') {
			let trimmed = statement.trim();

			if trimmed.is_empty() {
				continue;
			}

			sqlx::query(trimmed).execute(&mut *tx).await?;

			applied += 1;
		}

		tx.commit().await?;

		tracing::debug!(statements = applied, "Schema ensured.");

		Ok(())
	}
}
