use std::collections::HashMap;

use sqlx::{PgExecutor, Postgres, QueryBuilder, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use posts_domain::query::{CompiledQuery, Predicate, RelationTree};

use crate::{
	Error, Result,
	db::Db,
	models::{NewPost, Post, PostImage, PostPatch},
	render::{self, POSTS},
};

const POST_COLUMNS: &str = "id, title, content, created_by, updated_by, deleted_by, created_at, updated_at, deleted_at, is_deleted";
const IMAGE_COLUMNS: &str = "id, post_id, image, created_at, updated_at, deleted_at, is_deleted";
const RELATION_IMAGES: &str = "images";

/// Rejects anything the SQL renderer or relation loader would refuse, without touching the pool.
pub fn validate_query(query: &CompiledQuery) -> Result<()> {
	POSTS.check(&query.predicate, &query.sort)?;
	check_relations(&query.inclusion)?;

	Ok(())
}

pub async fn count(db: &Db, predicate: &Predicate) -> Result<u64> {
	let mut qb = QueryBuilder::<Postgres>::new("SELECT count(*) FROM posts WHERE ");

	render::push_predicate(&mut qb, &POSTS, predicate)?;

	let total = qb.build_query_scalar::<i64>().fetch_one(&db.pool).await?;

	Ok(u64::try_from(total).unwrap_or_default())
}

pub async fn find_many(db: &Db, query: &CompiledQuery) -> Result<Vec<Post>> {
	check_relations(&query.inclusion)?;

	let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {POST_COLUMNS} FROM posts WHERE "));

	render::push_predicate(&mut qb, &POSTS, &query.predicate)?;
	render::push_order_and_window(&mut qb, &POSTS, &query.sort, &query.window)?;

	let mut posts = qb.build_query_as::<Post>().fetch_all(&db.pool).await?;

	if query.inclusion.get(RELATION_IMAGES).is_some() {
		attach_images(&db.pool, &mut posts).await?;
	}

	Ok(posts)
}

/// Live post by id with its images.
pub async fn find_by_id(db: &Db, id: Uuid) -> Result<Option<Post>> {
	let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1 AND is_deleted = false");
	let post: Option<Post> = sqlx::query_as(&sql).bind(id).fetch_optional(&db.pool).await?;
	let Some(post) = post else {
		return Ok(None);
	};
	let mut posts = vec![post];

	attach_images(&db.pool, &mut posts).await?;

	Ok(posts.pop())
}

pub async fn insert(db: &Db, new_post: &NewPost) -> Result<Post> {
	let now = OffsetDateTime::now_utc();
	let mut tx = db.pool.begin().await?;
	let sql = format!(
		"\
INSERT INTO posts (id, title, content, created_by, created_at, updated_at, is_deleted)
VALUES ($1, $2, $3, $4, $5, $5, false)
RETURNING {POST_COLUMNS}"
	);
	let mut post: Post = sqlx::query_as(&sql)
		.bind(Uuid::new_v4())
		.bind(new_post.title.as_str())
		.bind(new_post.content.as_str())
		.bind(new_post.created_by)
		.bind(now)
		.fetch_one(&mut *tx)
		.await?;

	post.images = Some(insert_images(&mut tx, post.id, &new_post.images, now).await?);

	tx.commit().await?;

	Ok(post)
}

/// Applies `patch` to a live post. Returns `None` when the post is missing or soft-deleted.
pub async fn update(db: &Db, id: Uuid, patch: &PostPatch) -> Result<Option<Post>> {
	if patch.title.is_none() && patch.content.is_none() && patch.images.is_none() {
		return Err(Error::InvalidArgument("Update must change at least one field.".to_string()));
	}

	let now = OffsetDateTime::now_utc();
	let mut tx = db.pool.begin().await?;
	let sql = format!(
		"\
UPDATE posts
SET
	title = COALESCE($1, title),
	content = COALESCE($2, content),
	updated_by = $3,
	updated_at = $4
WHERE id = $5 AND is_deleted = false
RETURNING {POST_COLUMNS}"
	);
	let post: Option<Post> = sqlx::query_as(&sql)
		.bind(patch.title.as_deref())
		.bind(patch.content.as_deref())
		.bind(patch.updated_by)
		.bind(now)
		.bind(id)
		.fetch_optional(&mut *tx)
		.await?;
	let Some(mut post) = post else {
		return Ok(None);
	};

	if let Some(images) = &patch.images {
		sqlx::query("DELETE FROM post_images WHERE post_id = $1").bind(id).execute(&mut *tx).await?;

		post.images = Some(insert_images(&mut tx, id, images, now).await?);
	}

	tx.commit().await?;

	if post.images.is_none() {
		let mut posts = vec![post];

		attach_images(&db.pool, &mut posts).await?;

		return Ok(posts.pop());
	}

	Ok(Some(post))
}

/// Soft-deletes a live post. Returns `None` when it is missing or already deleted.
pub async fn soft_delete(db: &Db, id: Uuid, deleted_by: Option<Uuid>) -> Result<Option<Post>> {
	let sql = format!(
		"\
UPDATE posts
SET is_deleted = true, deleted_at = $1, deleted_by = $2, updated_at = $1
WHERE id = $3 AND is_deleted = false
RETURNING {POST_COLUMNS}"
	);
	let post: Option<Post> = sqlx::query_as(&sql)
		.bind(OffsetDateTime::now_utc())
		.bind(deleted_by)
		.bind(id)
		.fetch_optional(&db.pool)
		.await?;
	let Some(post) = post else {
		return Ok(None);
	};
	let mut posts = vec![post];

	attach_images(&db.pool, &mut posts).await?;

	Ok(posts.pop())
}

/// Soft-deletes every live post in `ids` and returns how many rows changed.
pub async fn soft_delete_many(db: &Db, ids: &[Uuid], deleted_by: Option<Uuid>) -> Result<u64> {
	if ids.is_empty() {
		return Ok(0);
	}

	let result = sqlx::query(
		"\
UPDATE posts
SET is_deleted = true, deleted_at = $1, deleted_by = $2, updated_at = $1
WHERE id = ANY($3) AND is_deleted = false",
	)
	.bind(OffsetDateTime::now_utc())
	.bind(deleted_by)
	.bind(ids)
	.execute(&db.pool)
	.await?;

	Ok(result.rows_affected())
}

fn check_relations(inclusion: &RelationTree) -> Result<()> {
	for (name, nested) in inclusion.children() {
		if name != RELATION_IMAGES {
			return Err(Error::InvalidArgument(format!("Unknown relation '{name}' on posts.")));
		}
		if let Some((child, _)) = nested.children().next() {
			return Err(Error::InvalidArgument(format!(
				"Unknown relation '{name}.{child}' on posts."
			)));
		}
	}

	Ok(())
}

async fn attach_images<'e, E>(executor: E, posts: &mut [Post]) -> Result<()>
where
	E: PgExecutor<'e>,
{
	if posts.is_empty() {
		return Ok(());
	}

	let ids: Vec<Uuid> = posts.iter().map(|post| post.id).collect();
	let sql = format!(
		"\
SELECT {IMAGE_COLUMNS}
FROM post_images
WHERE post_id = ANY($1) AND is_deleted = false
ORDER BY post_id, position, id"
	);
	let rows: Vec<PostImage> = sqlx::query_as(&sql).bind(&ids).fetch_all(executor).await?;
	let mut by_post: HashMap<Uuid, Vec<PostImage>> = HashMap::new();

	for row in rows {
		by_post.entry(row.post_id).or_default().push(row);
	}

	for post in posts {
		post.images = Some(by_post.remove(&post.id).unwrap_or_default());
	}

	Ok(())
}

async fn insert_images(
	tx: &mut Transaction<'_, Postgres>,
	post_id: Uuid,
	images: &[String],
	now: OffsetDateTime,
) -> Result<Vec<PostImage>> {
	let sql = format!(
		"\
INSERT INTO post_images (id, post_id, image, position, created_at, updated_at, is_deleted)
VALUES ($1, $2, $3, $4, $5, $5, false)
RETURNING {IMAGE_COLUMNS}"
	);
	let mut out = Vec::with_capacity(images.len());

	for (position, image) in images.iter().enumerate() {
		let row: PostImage = sqlx::query_as(&sql)
			.bind(Uuid::new_v4())
			.bind(post_id)
			.bind(image.as_str())
			.bind(i32::try_from(position).unwrap_or(i32::MAX))
			.bind(now)
			.fetch_one(&mut **tx)
			.await?;

		out.push(row);
	}

	Ok(out)
}
