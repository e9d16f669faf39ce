use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use posts_domain::query::MAX_IN_LIST_ITEMS;

use crate::{Error, PostService, PostView, Result};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BulkDeleteRequest {
	pub ids: Vec<Uuid>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkDeleteResponse {
	pub count: u64,
}

impl PostService {
	pub async fn delete_post(&self, id: Uuid, actor: Uuid) -> Result<PostView> {
		let post =
			self.store.soft_delete(id, Some(actor)).await?.ok_or_else(|| Error::post_not_found(id))?;

		tracing::info!(post_id = %post.id, actor_id = %actor, "Post deleted.");

		self.render_one(post).await
	}

	/// Soft-deletes the live posts among `req.ids`. Unknown or already deleted ids are skipped.
	pub async fn bulk_delete_posts(
		&self,
		req: BulkDeleteRequest,
		actor: Uuid,
	) -> Result<BulkDeleteResponse> {
		if req.ids.is_empty() {
			return Err(Error::validation("ids must be non-empty."));
		}
		if req.ids.len() > MAX_IN_LIST_ITEMS {
			return Err(Error::validation(format!(
				"ids may contain at most {MAX_IN_LIST_ITEMS} entries."
			)));
		}

		let mut seen = HashSet::with_capacity(req.ids.len());

		if let Some(dup) = req.ids.iter().find(|id| !seen.insert(**id)) {
			return Err(Error::validation(format!("ids must be unique; {dup} is repeated.")));
		}

		let count = self.store.soft_delete_many(&req.ids, Some(actor)).await?;

		tracing::info!(
			requested = req.ids.len(),
			deleted = count,
			actor_id = %actor,
			"Posts bulk deleted."
		);

		Ok(BulkDeleteResponse { count })
	}
}
