use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use posts_domain::actor::ResolvedActor;
use posts_storage::models::{Post, PostImage};

use crate::Enriched;

/// Response shape for a single post.
///
/// Actor objects appear only when the reference was set and the identity lookup succeeded; the
/// raw `*Id` fields always mirror the stored references.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
	pub id: Uuid,
	pub title: String,
	pub content: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub images: Option<Vec<PostImageView>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub created_by_id: Option<Uuid>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub updated_by_id: Option<Uuid>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub deleted_by_id: Option<Uuid>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub created_by: Option<ResolvedActor>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub updated_by: Option<ResolvedActor>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub deleted_by: Option<ResolvedActor>,
	#[serde(with = "posts_domain::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "posts_domain::time_serde")]
	pub updated_at: OffsetDateTime,
	#[serde(
		default,
		with = "posts_domain::time_serde::option",
		skip_serializing_if = "Option::is_none"
	)]
	pub deleted_at: Option<OffsetDateTime>,
	pub is_deleted: bool,
}
impl From<Enriched<Post>> for PostView {
	fn from(enriched: Enriched<Post>) -> Self {
		let Enriched { record, created_by, updated_by, deleted_by } = enriched;

		Self {
			id: record.id,
			title: record.title,
			content: record.content,
			images: record.images.map(|images| images.into_iter().map(PostImageView::from).collect()),
			created_by_id: record.created_by,
			updated_by_id: record.updated_by,
			deleted_by_id: record.deleted_by,
			created_by,
			updated_by,
			deleted_by,
			created_at: record.created_at,
			updated_at: record.updated_at,
			deleted_at: record.deleted_at,
			is_deleted: record.is_deleted,
		}
	}
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostImageView {
	pub id: Uuid,
	pub image: String,
	#[serde(with = "posts_domain::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "posts_domain::time_serde")]
	pub updated_at: OffsetDateTime,
	#[serde(
		default,
		with = "posts_domain::time_serde::option",
		skip_serializing_if = "Option::is_none"
	)]
	pub deleted_at: Option<OffsetDateTime>,
	pub is_deleted: bool,
}
impl From<PostImage> for PostImageView {
	fn from(image: PostImage) -> Self {
		Self {
			id: image.id,
			image: image.image,
			created_at: image.created_at,
			updated_at: image.updated_at,
			deleted_at: image.deleted_at,
			is_deleted: image.is_deleted,
		}
	}
}

#[cfg(test)]
mod tests {
	use time::macros::datetime;
	use uuid::Uuid;

	use posts_storage::models::Post;

	use crate::{Enriched, PostView};

	fn post() -> Post {
		Post {
			id: Uuid::nil(),
			title: "Title".to_string(),
			content: "Body".to_string(),
			created_by: Some(Uuid::from_u128(1)),
			updated_by: None,
			deleted_by: None,
			created_at: datetime!(2024-05-01 8:00 UTC),
			updated_at: datetime!(2024-05-01 8:00 UTC),
			deleted_at: None,
			is_deleted: false,
			images: None,
		}
	}

	#[test]
	fn unresolved_actors_and_missing_relations_are_omitted() {
		let view = PostView::from(Enriched {
			record: post(),
			created_by: None,
			updated_by: None,
			deleted_by: None,
		});
		let json = serde_json::to_value(&view).expect("serializable view");

		assert_eq!(json["createdById"], "00000000-0000-0000-0000-000000000001");
		assert!(json.get("createdBy").is_none());
		assert!(json.get("images").is_none());
		assert!(json.get("deletedAt").is_none());
		assert_eq!(json["createdAt"], "2024-05-01T08:00:00Z");
		assert_eq!(json["isDeleted"], false);
	}
}
