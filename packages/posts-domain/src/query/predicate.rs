use serde_json::{Value, json};

use crate::{
	ValidationError,
	query::{
		PageWindow, QueryOptions, QuerySpec, RelationTree, Sort,
		filter::{Filter, FilterKind, FilterValue, RangeBound},
	},
};

/// Store-agnostic boolean expression over named fields.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
	And(Vec<Predicate>),
	Or(Vec<Predicate>),
	Eq { field: String, value: FilterValue },
	In { field: String, values: Vec<FilterValue> },
	/// Case-insensitive substring.
	Contains { field: String, term: String },
	/// Case-insensitive suffix.
	EndsWith { field: String, suffix: String },
	Range { field: String, lower: Option<RangeBound>, upper: Option<RangeBound> },
}
impl Predicate {
	pub fn eq(field: impl Into<String>, value: FilterValue) -> Self {
		Self::Eq { field: field.into(), value }
	}

	pub fn to_value(&self) -> Value {
		match self {
			Self::And(nodes) => json!({ "op": "and", "args": nodes.iter().map(Self::to_value).collect::<Vec<_>>() }),
			Self::Or(nodes) => json!({ "op": "or", "args": nodes.iter().map(Self::to_value).collect::<Vec<_>>() }),
			Self::Eq { field, value } => json!({ "op": "eq", "field": field, "value": value.to_value() }),
			Self::In { field, values } => json!({
				"op": "in",
				"field": field,
				"value": values.iter().map(FilterValue::to_value).collect::<Vec<_>>(),
			}),
			Self::Contains { field, term } => json!({ "op": "contains", "field": field, "value": term }),
			Self::EndsWith { field, suffix } =>
				json!({ "op": "ends_with", "field": field, "value": suffix }),
			Self::Range { field, lower, upper } => json!({
				"op": "range",
				"field": field,
				"lower": lower.map(|b| bound_value(&b)),
				"upper": upper.map(|b| bound_value(&b)),
			}),
		}
	}

	/// Evaluates the predicate against an in-memory record.
	///
	/// A field the record does not expose never matches a leaf predicate.
	pub fn matches<S>(&self, source: &S) -> bool
	where
		S: FieldSource + ?Sized,
	{
		match self {
			Self::And(nodes) => nodes.iter().all(|node| node.matches(source)),
			Self::Or(nodes) => nodes.iter().any(|node| node.matches(source)),
			Self::Eq { field, value } =>
				source.field_value(field).is_some_and(|actual| actual.loosely_eq(value)),
			Self::In { field, values } => source
				.field_value(field)
				.is_some_and(|actual| values.iter().any(|value| actual.loosely_eq(value))),
			Self::Contains { field, term } => source
				.field_value(field)
				.is_some_and(|actual| actual.as_text().to_lowercase().contains(&term.to_lowercase())),
			Self::EndsWith { field, suffix } => source
				.field_value(field)
				.is_some_and(|actual| actual.as_text().to_lowercase().ends_with(&suffix.to_lowercase())),
			Self::Range { field, lower, upper } => {
				let Some(at) = source.field_value(field).and_then(|actual| actual.as_datetime()) else {
					return false;
				};

				lower.is_none_or(|bound| bound.admits_from_below(at))
					&& upper.is_none_or(|bound| bound.admits_from_above(at))
			},
		}
	}
}
impl From<Filter> for Predicate {
	fn from(filter: Filter) -> Self {
		let Filter { field, kind } = filter;

		match kind {
			FilterKind::Equals(value) => Self::Eq { field, value },
			FilterKind::In(values) => Self::In { field, values },
			FilterKind::Range { lower, upper } => Self::Range { field, lower, upper },
			FilterKind::Suffix(suffix) => Self::EndsWith { field, suffix },
			FilterKind::Contains(term) => Self::Contains { field, term },
			FilterKind::AnyOf(kinds) => Self::Or(
				kinds
					.into_iter()
					.map(|kind| Self::from(Filter { field: field.clone(), kind }))
					.collect(),
			),
		}
	}
}

/// Exposes record fields to [`Predicate::matches`].
pub trait FieldSource {
	fn field_value(&self, field: &str) -> Option<FilterValue>;
}

/// Everything a store needs to run one list request.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledQuery {
	pub predicate: Predicate,
	pub inclusion: RelationTree,
	pub sort: Sort,
	pub window: PageWindow,
}

pub fn compile(spec: &QuerySpec, options: &QueryOptions) -> Result<CompiledQuery, ValidationError> {
	let mut clauses = Vec::with_capacity(spec.filters.len() + 2);

	if let Some(base) = &options.base {
		clauses.push(base.clone());
	}
	if let Some(term) = spec.search_term.as_deref()
		&& !term.is_empty()
		&& !options.search_fields.is_empty()
	{
		clauses.push(Predicate::Or(
			options
				.search_fields
				.iter()
				.map(|field| Predicate::Contains { field: field.clone(), term: term.to_string() })
				.collect(),
		));
	}

	clauses.extend(spec.filters.iter().cloned().map(Predicate::from));

	let inclusion = RelationTree::from_paths(&spec.relation_paths)?;

	Ok(CompiledQuery {
		predicate: Predicate::And(clauses),
		inclusion,
		sort: spec.sort.clone(),
		window: spec.window,
	})
}

fn bound_value(bound: &RangeBound) -> Value {
	json!({
		"value": FilterValue::DateTime(bound.value).to_value(),
		"inclusive": bound.inclusive,
	})
}
