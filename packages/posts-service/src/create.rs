use serde::{Deserialize, Serialize};
use uuid::Uuid;

use posts_storage::models::NewPost;

use crate::{Error, PostService, PostView, Result};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreatePostRequest {
	pub title: String,
	pub content: String,
	#[serde(default)]
	pub images: Vec<String>,
}

impl PostService {
	pub async fn create_post(&self, req: CreatePostRequest, actor: Uuid) -> Result<PostView> {
		let new_post = NewPost {
			title: required_text("title", &req.title)?,
			content: required_text("content", &req.content)?,
			images: clean_images(req.images)?,
			created_by: Some(actor),
		};
		let post = self.store.insert(&new_post).await?;

		tracing::info!(post_id = %post.id, actor_id = %actor, "Post created.");

		self.render_one(post).await
	}
}

pub(crate) fn required_text(field: &str, raw: &str) -> Result<String> {
	let trimmed = raw.trim();

	if trimmed.is_empty() {
		return Err(Error::validation(format!("{field} must be non-empty.")));
	}

	Ok(trimmed.to_string())
}

pub(crate) fn clean_images(images: Vec<String>) -> Result<Vec<String>> {
	images
		.into_iter()
		.map(|image| {
			let trimmed = image.trim();

			if trimmed.is_empty() {
				return Err(Error::validation("images entries must be non-empty."));
			}

			Ok(trimmed.to_string())
		})
		.collect()
}
