use posts_domain::query::{CompiledQuery, Page, PageMeta};

use crate::{PageSource, Result};

/// Runs the count and the bounded fetch concurrently. Either failure fails the page.
pub async fn paginate<T, S>(source: &S, query: &CompiledQuery) -> Result<Page<T>>
where
	S: PageSource<T> + ?Sized,
{
	source.validate(query)?;

	let (total, items) = tokio::try_join!(source.count(&query.predicate), source.fetch(query))?;

	Ok(Page { items, meta: PageMeta::new(total, &query.window) })
}
