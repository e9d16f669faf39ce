pub mod create;
pub mod delete;
pub mod enrich;
pub mod get;
pub mod list;
pub mod mapping;
pub mod query;
pub mod update;

mod error;

pub use create::CreatePostRequest;
pub use delete::{BulkDeleteRequest, BulkDeleteResponse};
pub use enrich::{ActorDirectory, Enriched};
pub use error::{Error, Result};
pub use mapping::{PostImageView, PostView};
pub use update::UpdatePostRequest;

use std::{future::Future, pin::Pin, sync::Arc};

use uuid::Uuid;

use posts_config::Config;
use posts_domain::{
	actor::ResolvedActor,
	query::{CompiledQuery, Predicate},
};
use posts_providers::identity::IdentityClient;
use posts_storage::{
	db::Db,
	models::{NewPost, Post, PostPatch},
	posts,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Storage seam for paginated reads of one record type.
pub trait PageSource<T>
where
	Self: Send + Sync,
{
	/// Rejects queries the store cannot run. Called before any I/O.
	fn validate(&self, _query: &CompiledQuery) -> Result<()> {
		Ok(())
	}

	fn count<'a>(&'a self, predicate: &'a Predicate) -> BoxFuture<'a, Result<u64>>;

	fn fetch<'a>(&'a self, query: &'a CompiledQuery) -> BoxFuture<'a, Result<Vec<T>>>;
}

pub trait PostStore: PageSource<Post> {
	/// Live posts only.
	fn find_by_id<'a>(&'a self, id: Uuid) -> BoxFuture<'a, Result<Option<Post>>>;

	fn insert<'a>(&'a self, post: &'a NewPost) -> BoxFuture<'a, Result<Post>>;

	fn update<'a>(&'a self, id: Uuid, patch: &'a PostPatch) -> BoxFuture<'a, Result<Option<Post>>>;

	fn soft_delete<'a>(
		&'a self,
		id: Uuid,
		actor: Option<Uuid>,
	) -> BoxFuture<'a, Result<Option<Post>>>;

	fn soft_delete_many<'a>(
		&'a self,
		ids: &'a [Uuid],
		actor: Option<Uuid>,
	) -> BoxFuture<'a, Result<u64>>;
}

pub trait IdentityProvider
where
	Self: Send + Sync,
{
	fn resolve_actor<'a>(
		&'a self,
		id: Uuid,
	) -> BoxFuture<'a, color_eyre::Result<Option<ResolvedActor>>>;
}

/// [`PostStore`] backed by Postgres.
pub struct PgPostStore {
	pub db: Db,
}
impl PgPostStore {
	pub fn new(db: Db) -> Self {
		Self { db }
	}
}

impl PageSource<Post> for PgPostStore {
	fn validate(&self, query: &CompiledQuery) -> Result<()> {
		posts::validate_query(query)?;

		Ok(())
	}

	fn count<'a>(&'a self, predicate: &'a Predicate) -> BoxFuture<'a, Result<u64>> {
		Box::pin(async move { Ok(posts::count(&self.db, predicate).await?) })
	}

	fn fetch<'a>(&'a self, query: &'a CompiledQuery) -> BoxFuture<'a, Result<Vec<Post>>> {
		Box::pin(async move { Ok(posts::find_many(&self.db, query).await?) })
	}
}

impl PostStore for PgPostStore {
	fn find_by_id<'a>(&'a self, id: Uuid) -> BoxFuture<'a, Result<Option<Post>>> {
		Box::pin(async move { Ok(posts::find_by_id(&self.db, id).await?) })
	}

	fn insert<'a>(&'a self, post: &'a NewPost) -> BoxFuture<'a, Result<Post>> {
		Box::pin(async move { Ok(posts::insert(&self.db, post).await?) })
	}

	fn update<'a>(&'a self, id: Uuid, patch: &'a PostPatch) -> BoxFuture<'a, Result<Option<Post>>> {
		Box::pin(async move { Ok(posts::update(&self.db, id, patch).await?) })
	}

	fn soft_delete<'a>(
		&'a self,
		id: Uuid,
		actor: Option<Uuid>,
	) -> BoxFuture<'a, Result<Option<Post>>> {
		Box::pin(async move { Ok(posts::soft_delete(&self.db, id, actor).await?) })
	}

	fn soft_delete_many<'a>(
		&'a self,
		ids: &'a [Uuid],
		actor: Option<Uuid>,
	) -> BoxFuture<'a, Result<u64>> {
		Box::pin(async move { Ok(posts::soft_delete_many(&self.db, ids, actor).await?) })
	}
}

impl IdentityProvider for IdentityClient {
	fn resolve_actor<'a>(
		&'a self,
		id: Uuid,
	) -> BoxFuture<'a, color_eyre::Result<Option<ResolvedActor>>> {
		Box::pin(IdentityClient::resolve_actor(self, id))
	}
}

pub struct PostService {
	pub cfg: Config,
	pub store: Arc<dyn PostStore>,
	pub identity: Arc<dyn IdentityProvider>,
}
impl PostService {
	pub fn new(cfg: Config, store: Arc<dyn PostStore>, identity: Arc<dyn IdentityProvider>) -> Self {
		Self { cfg, store, identity }
	}

	/// Connects to Postgres, applies the schema, and builds the identity client from `cfg`.
	pub async fn connect(cfg: Config) -> Result<Self> {
		let db = Db::connect(&cfg.storage.postgres).await?;

		db.ensure_schema().await?;

		let identity = IdentityClient::new(&cfg.providers.identity)?;

		tracing::info!(
			provider_id = identity.provider_id(),
			max_concurrency = cfg.enrichment.max_concurrency,
			"Post service ready."
		);

		Ok(Self::new(cfg, Arc::new(PgPostStore::new(db)), Arc::new(identity)))
	}
}
