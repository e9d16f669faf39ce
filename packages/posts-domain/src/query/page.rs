use serde::{Deserialize, Serialize};

use crate::query::{DEFAULT_LIMIT, MAX_LIMIT};

/// Offset window for one page.
///
/// `requested_page` is echoed back to callers untouched; `page` is the value used for offset
/// math and never drops below 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageWindow {
	pub requested_page: i64,
	pub page: i64,
	pub limit: i64,
}
impl PageWindow {
	pub fn new(requested_page: i64, requested_limit: Option<i64>) -> Self {
		let limit = match requested_limit {
			Some(limit) if limit > 0 => limit.min(MAX_LIMIT),
			_ => DEFAULT_LIMIT,
		};

		Self { requested_page, page: requested_page.max(1), limit }
	}

	pub fn offset(&self) -> i64 {
		(self.page - 1).saturating_mul(self.limit)
	}
}
impl Default for PageWindow {
	fn default() -> Self {
		Self::new(1, None)
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
	pub total: u64,
	pub page: i64,
	pub limit: i64,
	pub total_pages: u64,
	pub has_next_page: bool,
	pub has_previous_page: bool,
}
impl PageMeta {
	pub fn new(total: u64, window: &PageWindow) -> Self {
		let limit = window.limit.max(1);
		let total_pages = total.div_ceil(limit as u64);
		let page = window.requested_page;

		Self {
			total,
			page,
			limit,
			total_pages,
			has_next_page: i128::from(page) < i128::from(total_pages),
			has_previous_page: page > 1,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
	pub items: Vec<T>,
	pub meta: PageMeta,
}
impl<T> Page<T> {
	pub fn map<U, F>(self, f: F) -> Page<U>
	where
		F: FnMut(T) -> U,
	{
		Page { items: self.items.into_iter().map(f).collect(), meta: self.meta }
	}
}
