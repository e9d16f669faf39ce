use serde_json::{Map, Value};

use posts_domain::{
	actor::ActorField,
	query::{self, FilterValue, Page, Predicate, QueryOptions, Sort},
};

use posts_storage::models::Post;

use crate::{PostService, PostView, Result};

pub const SEARCH_FIELDS: [&str; 2] = ["title", "content"];
pub const FILTER_KEYS: [&str; 7] =
	["title", "content", "authorId", "createdBy", "updatedBy", "createdAt", "updatedAt"];
pub const SORT_FIELDS: [&str; 3] = ["createdAt", "updatedAt", "title"];
pub const DEFAULT_RELATIONS: [&str; 1] = ["images"];

/// Query options for listing live posts, newest first.
pub fn post_query_options() -> QueryOptions {
	QueryOptions::new(Sort::desc("createdAt"))
		.search_fields(SEARCH_FIELDS)
		.filter_keys(FILTER_KEYS)
		.sort_fields(SORT_FIELDS)
		.relations(DEFAULT_RELATIONS)
		.base(Predicate::eq("isDeleted", FilterValue::Bool(false)))
}

impl PostService {
	pub async fn list_posts(&self, params: &Map<String, Value>) -> Result<Page<PostView>> {
		let options = post_query_options();
		let spec = query::normalize(params, &options)?;
		let compiled = query::compile(&spec, &options)?;

		tracing::debug!(
			predicate = %compiled.predicate.to_value(),
			sort = %compiled.sort.field,
			direction = %compiled.sort.direction,
			offset = compiled.window.offset(),
			limit = compiled.window.limit,
			"Listing posts."
		);

		let page = crate::query::paginate::<Post, _>(self.store.as_ref(), &compiled).await?;
		let items = self.enrich(page.items, &ActorField::ALL).await;

		Ok(Page { items: items.into_iter().map(PostView::from).collect(), meta: page.meta })
	}
}
