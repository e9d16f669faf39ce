use time::OffsetDateTime;
use uuid::Uuid;

use posts_domain::{
	actor::{ActorField, ActorRefs},
	query::{FieldSource, FilterValue},
};

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Post {
	pub id: Uuid,
	pub title: String,
	pub content: String,
	pub created_by: Option<Uuid>,
	pub updated_by: Option<Uuid>,
	pub deleted_by: Option<Uuid>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
	pub deleted_at: Option<OffsetDateTime>,
	pub is_deleted: bool,
	/// Loaded only when the `images` relation is included.
	#[sqlx(skip)]
	pub images: Option<Vec<PostImage>>,
}
impl ActorRefs for Post {
	fn actor_ref(&self, field: ActorField) -> Option<Uuid> {
		match field {
			ActorField::CreatedBy => self.created_by,
			ActorField::UpdatedBy => self.updated_by,
			ActorField::DeletedBy => self.deleted_by,
		}
	}
}
impl FieldSource for Post {
	fn field_value(&self, field: &str) -> Option<FilterValue> {
		let uuid = |id: Option<Uuid>| id.map(|id| FilterValue::Text(id.to_string()));

		match field {
			"id" => Some(FilterValue::Text(self.id.to_string())),
			"title" => Some(FilterValue::Text(self.title.clone())),
			"content" => Some(FilterValue::Text(self.content.clone())),
			"createdBy" | "authorId" => uuid(self.created_by),
			"updatedBy" => uuid(self.updated_by),
			"deletedBy" => uuid(self.deleted_by),
			"createdAt" => Some(FilterValue::DateTime(self.created_at)),
			"updatedAt" => Some(FilterValue::DateTime(self.updated_at)),
			"deletedAt" => self.deleted_at.map(FilterValue::DateTime),
			"isDeleted" => Some(FilterValue::Bool(self.is_deleted)),
			_ => None,
		}
	}
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct PostImage {
	pub id: Uuid,
	pub post_id: Uuid,
	pub image: String,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
	pub deleted_at: Option<OffsetDateTime>,
	pub is_deleted: bool,
}

/// Columns for a new post. `images` keep their order.
#[derive(Clone, Debug)]
pub struct NewPost {
	pub title: String,
	pub content: String,
	pub images: Vec<String>,
	pub created_by: Option<Uuid>,
}

/// Partial update. `None` leaves a column untouched; `images: Some(_)` replaces the set.
#[derive(Clone, Debug, Default)]
pub struct PostPatch {
	pub title: Option<String>,
	pub content: Option<String>,
	pub images: Option<Vec<String>>,
	pub updated_by: Option<Uuid>,
}
