use serde::{Deserialize, Serialize};
use uuid::Uuid;

use posts_storage::models::PostPatch;

use crate::{
	Error, PostService, PostView, Result,
	create::{clean_images, required_text},
};

/// Partial update. `images`, when present, replaces the current set.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UpdatePostRequest {
	#[serde(default)]
	pub title: Option<String>,
	#[serde(default)]
	pub content: Option<String>,
	#[serde(default)]
	pub images: Option<Vec<String>>,
}

impl PostService {
	pub async fn update_post(
		&self,
		id: Uuid,
		req: UpdatePostRequest,
		actor: Uuid,
	) -> Result<PostView> {
		if req.title.is_none() && req.content.is_none() && req.images.is_none() {
			return Err(Error::validation("Provide at least one of title, content, or images."));
		}

		let patch = PostPatch {
			title: req.title.as_deref().map(|title| required_text("title", title)).transpose()?,
			content: req
				.content
				.as_deref()
				.map(|content| required_text("content", content))
				.transpose()?,
			images: req.images.map(clean_images).transpose()?,
			updated_by: Some(actor),
		};
		let post = self.store.update(id, &patch).await?.ok_or_else(|| Error::post_not_found(id))?;

		tracing::info!(post_id = %post.id, actor_id = %actor, "Post updated.");

		self.render_one(post).await
	}
}
