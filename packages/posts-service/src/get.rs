use uuid::Uuid;

use posts_domain::actor::ActorField;
use posts_storage::models::Post;

use crate::{Error, PostService, PostView, Result};

impl PostService {
	pub async fn get_post(&self, id: Uuid) -> Result<PostView> {
		let post = self.store.find_by_id(id).await?.ok_or_else(|| Error::post_not_found(id))?;

		self.render_one(post).await
	}

	pub(crate) async fn render_one(&self, post: Post) -> Result<PostView> {
		let mut enriched = self.enrich(vec![post], &ActorField::ALL).await;

		enriched.pop().map(PostView::from).ok_or_else(|| Error::Dependency {
			message: "Enrichment dropped the record.".to_string(),
		})
	}
}
