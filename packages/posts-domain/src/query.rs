//! Store-agnostic list query layer.
//!
//! A raw request map flows through [`normalize`] into a bounded [`QuerySpec`], then through
//! [`compile`] into a [`CompiledQuery`] that a store renders into its native query language.

pub mod filter;
pub mod normalize;
pub mod page;
pub mod predicate;
pub mod relation;
pub mod sort;

pub use filter::{Filter, FilterKind, FilterValue, RangeBound};
pub use normalize::normalize;
pub use page::{Page, PageMeta, PageWindow};
pub use predicate::{CompiledQuery, FieldSource, Predicate, compile};
pub use relation::RelationTree;
pub use sort::{Sort, SortDirection};

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;
pub const MAX_IN_LIST_ITEMS: usize = 128;
pub const MAX_STRING_BYTES: usize = 512;

/// Normalized, bounded description of a list request.
#[derive(Clone, Debug, PartialEq)]
pub struct QuerySpec {
	pub window: PageWindow,
	pub search_term: Option<String>,
	pub filters: Vec<Filter>,
	pub relation_paths: Vec<String>,
	pub sort: Sort,
}

/// Per-resource knobs the normalizer and compiler need.
#[derive(Clone, Debug)]
pub struct QueryOptions {
	/// Fields OR-ed together for the free-text `search` term.
	pub search_fields: Vec<String>,
	/// Request keys accepted as named filters. Anything else is ignored.
	pub filter_keys: Vec<String>,
	/// Fields accepted in `sortBy`.
	pub sort_fields: Vec<String>,
	pub default_sort: Sort,
	/// Relation paths included on every query, ahead of any requested via `include`.
	pub relations: Vec<String>,
	/// Always AND-ed into the compiled predicate.
	pub base: Option<Predicate>,
}
impl QueryOptions {
	pub fn new(default_sort: Sort) -> Self {
		Self {
			search_fields: Vec::new(),
			filter_keys: Vec::new(),
			sort_fields: vec![default_sort.field.clone()],
			default_sort,
			relations: Vec::new(),
			base: None,
		}
	}

	pub fn search_fields<I, S>(mut self, fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.search_fields = fields.into_iter().map(Into::into).collect();

		self
	}

	pub fn filter_keys<I, S>(mut self, keys: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.filter_keys = keys.into_iter().map(Into::into).collect();

		self
	}

	pub fn sort_fields<I, S>(mut self, fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.sort_fields = fields.into_iter().map(Into::into).collect();

		if !self.sort_fields.contains(&self.default_sort.field) {
			self.sort_fields.push(self.default_sort.field.clone());
		}

		self
	}

	pub fn relations<I, S>(mut self, paths: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.relations = paths.into_iter().map(Into::into).collect();

		self
	}

	pub fn base(mut self, predicate: Predicate) -> Self {
		self.base = Some(predicate);

		self
	}
}
