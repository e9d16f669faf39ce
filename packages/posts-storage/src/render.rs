//! Renders domain predicates into Postgres SQL with bound parameters.

use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use posts_domain::query::{FilterValue, PageWindow, Predicate, RangeBound, Sort};

use crate::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
	Text,
	Uuid,
	Bool,
	Timestamp,
}

#[derive(Clone, Copy, Debug)]
pub struct Column {
	pub name: &'static str,
	pub kind: ColumnKind,
}

/// Field allowlist for one table. Request field names map to SQL columns here and nowhere else.
#[derive(Debug)]
pub struct Table {
	pub name: &'static str,
	pub primary_key: &'static str,
	pub columns: &'static [(&'static str, Column)],
}
impl Table {
	pub fn column(&self, field: &str) -> Result<Column> {
		self.columns.iter().find(|(name, _)| *name == field).map(|(_, column)| *column).ok_or_else(
			|| Error::InvalidArgument(format!("Field '{field}' is not filterable on {}.", self.name)),
		)
	}

	/// Renders the predicate once into a scratch builder so every field and value is checked.
	pub fn check(&self, predicate: &Predicate, sort: &Sort) -> Result<()> {
		let mut scratch = QueryBuilder::<Postgres>::new("");

		push_predicate(&mut scratch, self, predicate)?;
		self.column(&sort.field)?;

		Ok(())
	}
}

pub const POSTS: Table = Table {
	name: "posts",
	primary_key: "id",
	columns: &[
		("id", Column { name: "id", kind: ColumnKind::Uuid }),
		("title", Column { name: "title", kind: ColumnKind::Text }),
		("content", Column { name: "content", kind: ColumnKind::Text }),
		("authorId", Column { name: "created_by", kind: ColumnKind::Uuid }),
		("createdBy", Column { name: "created_by", kind: ColumnKind::Uuid }),
		("updatedBy", Column { name: "updated_by", kind: ColumnKind::Uuid }),
		("deletedBy", Column { name: "deleted_by", kind: ColumnKind::Uuid }),
		("createdAt", Column { name: "created_at", kind: ColumnKind::Timestamp }),
		("updatedAt", Column { name: "updated_at", kind: ColumnKind::Timestamp }),
		("deletedAt", Column { name: "deleted_at", kind: ColumnKind::Timestamp }),
		("isDeleted", Column { name: "is_deleted", kind: ColumnKind::Bool }),
	],
};

enum SqlValue {
	Text(String),
	Uuid(Uuid),
	Bool(bool),
	Timestamp(OffsetDateTime),
}

pub fn push_predicate(
	qb: &mut QueryBuilder<'_, Postgres>,
	table: &Table,
	predicate: &Predicate,
) -> Result<()> {
	match predicate {
		Predicate::And(nodes) => push_group(qb, table, nodes, " AND ", "TRUE"),
		Predicate::Or(nodes) => push_group(qb, table, nodes, " OR ", "FALSE"),
		Predicate::Eq { field, value } => {
			let column = table.column(field)?;
			let value = coerce(field, column, value)?;

			qb.push(column.name).push(" = ");
			push_value(qb, value);

			Ok(())
		},
		Predicate::In { field, values } => {
			let column = table.column(field)?;

			if values.is_empty() {
				qb.push("FALSE");

				return Ok(());
			}

			let values =
				values.iter().map(|value| coerce(field, column, value)).collect::<Result<Vec<_>>>()?;

			qb.push(column.name).push(" IN (");

			for (idx, value) in values.into_iter().enumerate() {
				if idx > 0 {
					qb.push(", ");
				}

				push_value(qb, value);
			}

			qb.push(")");

			Ok(())
		},
		Predicate::Contains { field, term } => {
			let column = table.column(field)?;

			push_ilike(qb, column, format!("%{}%", escape_like(term)));

			Ok(())
		},
		Predicate::EndsWith { field, suffix } => {
			let column = table.column(field)?;

			push_ilike(qb, column, format!("%{}", escape_like(suffix)));

			Ok(())
		},
		Predicate::Range { field, lower, upper } => {
			let column = table.column(field)?;

			if column.kind != ColumnKind::Timestamp {
				return Err(Error::InvalidArgument(format!(
					"Field '{field}' does not support range filters."
				)));
			}

			push_range(qb, column, *lower, *upper);

			Ok(())
		},
	}
}

pub fn push_order_and_window(
	qb: &mut QueryBuilder<'_, Postgres>,
	table: &Table,
	sort: &Sort,
	window: &PageWindow,
) -> Result<()> {
	let column = table.column(&sort.field)?;
	let direction = sort.direction.as_sql();

	qb.push(" ORDER BY ")
		.push(column.name)
		.push(" ")
		.push(direction)
		.push(", ")
		.push(table.primary_key)
		.push(" ")
		.push(direction);
	qb.push(" LIMIT ").push_bind(window.limit);
	qb.push(" OFFSET ").push_bind(window.offset());

	Ok(())
}

/// Escapes `%`, `_`, and `\` for use inside an `ILIKE ... ESCAPE '\'` pattern.
pub fn escape_like(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());

	for ch in raw.chars() {
		if matches!(ch, '%' | '_' | '\\') {
			out.push('\\');
		}

		out.push(ch);
	}

	out
}

fn push_group(
	qb: &mut QueryBuilder<'_, Postgres>,
	table: &Table,
	nodes: &[Predicate],
	joiner: &str,
	empty: &str,
) -> Result<()> {
	if nodes.is_empty() {
		qb.push(empty);

		return Ok(());
	}

	qb.push("(");

	for (idx, node) in nodes.iter().enumerate() {
		if idx > 0 {
			qb.push(joiner);
		}

		push_predicate(qb, table, node)?;
	}

	qb.push(")");

	Ok(())
}

fn push_ilike(qb: &mut QueryBuilder<'_, Postgres>, column: Column, pattern: String) {
	if column.kind == ColumnKind::Text {
		qb.push(column.name);
	} else {
		qb.push("CAST(").push(column.name).push(" AS text)");
	}

	qb.push(" ILIKE ").push_bind(pattern).push(" ESCAPE '\\'");
}

fn push_range(
	qb: &mut QueryBuilder<'_, Postgres>,
	column: Column,
	lower: Option<RangeBound>,
	upper: Option<RangeBound>,
) {
	if lower.is_none() && upper.is_none() {
		qb.push("TRUE");

		return;
	}

	qb.push("(");

	if let Some(bound) = lower {
		qb.push(column.name).push(if bound.inclusive { " >= " } else { " > " }).push_bind(bound.value);
	}
	if let Some(bound) = upper {
		if lower.is_some() {
			qb.push(" AND ");
		}

		qb.push(column.name).push(if bound.inclusive { " <= " } else { " < " }).push_bind(bound.value);
	}

	qb.push(")");
}

fn push_value(qb: &mut QueryBuilder<'_, Postgres>, value: SqlValue) {
	match value {
		SqlValue::Text(text) => qb.push_bind(text),
		SqlValue::Uuid(id) => qb.push_bind(id),
		SqlValue::Bool(flag) => qb.push_bind(flag),
		SqlValue::Timestamp(at) => qb.push_bind(at),
	};
}

fn coerce(field: &str, column: Column, value: &FilterValue) -> Result<SqlValue> {
	let mismatch = || {
		Error::InvalidArgument(format!(
			"Value '{}' is not valid for field '{field}'.",
			value.as_text()
		))
	};

	match column.kind {
		ColumnKind::Text => Ok(SqlValue::Text(value.as_text())),
		ColumnKind::Uuid => Uuid::parse_str(value.as_text().trim()).map(SqlValue::Uuid).map_err(|_| mismatch()),
		ColumnKind::Bool => match value {
			FilterValue::Bool(flag) => Ok(SqlValue::Bool(*flag)),
			FilterValue::Text(text) if text.eq_ignore_ascii_case("true") => Ok(SqlValue::Bool(true)),
			FilterValue::Text(text) if text.eq_ignore_ascii_case("false") => Ok(SqlValue::Bool(false)),
			_ => Err(mismatch()),
		},
		ColumnKind::Timestamp => value.as_datetime().map(SqlValue::Timestamp).ok_or_else(mismatch),
	}
}

#[cfg(test)]
mod tests {
	use sqlx::{Postgres, QueryBuilder};
	use time::macros::datetime;

	use posts_domain::query::{FilterValue, PageWindow, Predicate, RangeBound, Sort};

	use crate::{
		Error,
		render::{POSTS, escape_like, push_order_and_window, push_predicate},
	};

	fn render(predicate: &Predicate) -> String {
		let mut qb = QueryBuilder::<Postgres>::new("");

		push_predicate(&mut qb, &POSTS, predicate).expect("renderable predicate");

		qb.sql().to_string()
	}

	#[test]
	fn and_groups_render_with_binds() {
		let predicate = Predicate::And(vec![
			Predicate::eq("isDeleted", FilterValue::Bool(false)),
			Predicate::Or(vec![
				Predicate::Contains { field: "title".to_string(), term: "rust".to_string() },
				Predicate::Contains { field: "content".to_string(), term: "rust".to_string() },
			]),
		]);

		assert_eq!(
			render(&predicate),
			"(is_deleted = $1 AND (title ILIKE $2 ESCAPE '\\' OR content ILIKE $3 ESCAPE '\\'))"
		);
	}

	#[test]
	fn empty_groups_render_constants() {
		assert_eq!(render(&Predicate::And(Vec::new())), "TRUE");
		assert_eq!(render(&Predicate::Or(Vec::new())), "FALSE");
		assert_eq!(
			render(&Predicate::In { field: "createdBy".to_string(), values: Vec::new() }),
			"FALSE"
		);
	}

	#[test]
	fn aliases_map_to_columns() {
		let predicate = Predicate::In {
			field: "authorId".to_string(),
			values: vec![
				FilterValue::Text("7f0c1f7e-2a5f-4c59-9b36-3f3c2d6f1a10".to_string()),
				FilterValue::Text("0b0e1a84-4f4c-4d52-9a2a-0d6fb0a7d0e1".to_string()),
			],
		};

		assert_eq!(render(&predicate), "created_by IN ($1, $2)");
	}

	#[test]
	fn ranges_render_each_bound() {
		let predicate = Predicate::Range {
			field: "createdAt".to_string(),
			lower: Some(RangeBound::inclusive(datetime!(2024-03-01 0:00 UTC))),
			upper: Some(RangeBound::exclusive(datetime!(2024-03-02 0:00 UTC))),
		};

		assert_eq!(render(&predicate), "(created_at >= $1 AND created_at < $2)");
	}

	#[test]
	fn non_text_columns_are_cast_for_pattern_matching() {
		let predicate =
			Predicate::EndsWith { field: "createdBy".to_string(), suffix: "a10".to_string() };

		assert_eq!(render(&predicate), "CAST(created_by AS text) ILIKE $1 ESCAPE '\\'");
	}

	#[test]
	fn unknown_fields_and_bad_values_are_rejected() {
		let mut qb = QueryBuilder::<Postgres>::new("");
		let unknown = Predicate::eq("password", FilterValue::Text("x".to_string()));

		assert!(matches!(
			push_predicate(&mut qb, &POSTS, &unknown),
			Err(Error::InvalidArgument(_))
		));

		let bad_uuid = Predicate::eq("createdBy", FilterValue::Text("not-a-uuid".to_string()));

		assert!(matches!(
			push_predicate(&mut qb, &POSTS, &bad_uuid),
			Err(Error::InvalidArgument(_))
		));

		let bad_range = Predicate::Range { field: "title".to_string(), lower: None, upper: None };

		assert!(POSTS.check(&bad_range, &Sort::desc("createdAt")).is_err());
		assert!(POSTS.check(&Predicate::And(Vec::new()), &Sort::desc("password")).is_err());
	}

	#[test]
	fn order_breaks_ties_on_primary_key() {
		let mut qb = QueryBuilder::<Postgres>::new("SELECT id FROM posts WHERE TRUE");

		push_order_and_window(&mut qb, &POSTS, &Sort::desc("createdAt"), &PageWindow::new(2, Some(10)))
			.expect("sortable field");

		assert_eq!(
			qb.sql(),
			"SELECT id FROM posts WHERE TRUE ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
		);
	}

	#[test]
	fn like_metacharacters_are_escaped() {
		assert_eq!(escape_like(r"50%_off\now"), r"50\%\_off\\now");
	}
}
