use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Number, Value};
use time::{Date, Duration, OffsetDateTime, format_description::well_known::Rfc3339, macros::format_description};

use crate::{
	ValidationError,
	query::{MAX_IN_LIST_ITEMS, MAX_STRING_BYTES},
};

static DOMAIN_KEY: LazyLock<Option<Regex>> = LazyLock::new(|| {
	Regex::new(r"^(?:(?P<camel>[A-Za-z0-9]+)Domain|(?P<snake>[a-z0-9_]+)_domain)$").ok()
});
static DATE_KEY: LazyLock<Option<Regex>> = LazyLock::new(|| {
	Regex::new(r"^(?:date|[A-Za-z0-9]+(?:At|Date)|[a-z0-9_]+_(?:at|date))$").ok()
});
static NAME_KEY: LazyLock<Option<Regex>> =
	LazyLock::new(|| Regex::new(r"^(?:name|[A-Za-z0-9]+Name|[a-z0-9_]+_name)$").ok());
static DOMAIN_VALUE: LazyLock<Option<Regex>> =
	LazyLock::new(|| Regex::new(r"^[a-z0-9](?:[a-z0-9-]*[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]*[a-z0-9])?)*$").ok());

/// One named filter after classification.
#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
	pub field: String,
	pub kind: FilterKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FilterKind {
	Equals(FilterValue),
	In(Vec<FilterValue>),
	Range { lower: Option<RangeBound>, upper: Option<RangeBound> },
	/// Case-insensitive ends-with. The stored suffix already carries the leading `@`.
	Suffix(String),
	/// Case-insensitive substring.
	Contains(String),
	/// Matches when any alternative does. Date lists hold one day range or instant per item.
	AnyOf(Vec<FilterKind>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RangeBound {
	pub value: OffsetDateTime,
	pub inclusive: bool,
}
impl RangeBound {
	pub fn inclusive(value: OffsetDateTime) -> Self {
		Self { value, inclusive: true }
	}

	pub fn exclusive(value: OffsetDateTime) -> Self {
		Self { value, inclusive: false }
	}

	pub fn admits_from_below(&self, candidate: OffsetDateTime) -> bool {
		if self.inclusive { candidate >= self.value } else { candidate > self.value }
	}

	pub fn admits_from_above(&self, candidate: OffsetDateTime) -> bool {
		if self.inclusive { candidate <= self.value } else { candidate < self.value }
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum FilterValue {
	Text(String),
	Integer(i64),
	Float(f64),
	Bool(bool),
	DateTime(OffsetDateTime),
}
impl FilterValue {
	/// Converts a JSON scalar. `null` yields `None`; arrays and objects are rejected.
	pub fn from_json(field: &str, value: &Value) -> Result<Option<Self>, ValidationError> {
		match value {
			Value::Null => Ok(None),
			Value::Bool(flag) => Ok(Some(Self::Bool(*flag))),
			Value::Number(number) => Ok(Some(Self::from_number(number))),
			Value::String(text) => {
				check_string_len(field, text)?;

				Ok(Some(Self::Text(text.clone())))
			},
			Value::Array(_) | Value::Object(_) => Err(ValidationError::new(
				field,
				"Filter values must be scalars (string, number, or boolean).",
			)),
		}
	}

	fn from_number(number: &Number) -> Self {
		match number.as_i64() {
			Some(int) => Self::Integer(int),
			None => Self::Float(number.as_f64().unwrap_or(f64::NAN)),
		}
	}

	pub fn to_value(&self) -> Value {
		match self {
			Self::Text(text) => Value::String(text.clone()),
			Self::Integer(int) => Value::from(*int),
			Self::Float(float) => Number::from_f64(*float).map(Value::Number).unwrap_or(Value::Null),
			Self::Bool(flag) => Value::Bool(*flag),
			Self::DateTime(at) => at.format(&Rfc3339).map(Value::String).unwrap_or(Value::Null),
		}
	}

	/// Canonical text form used when comparing values of different shapes.
	pub fn as_text(&self) -> String {
		match self {
			Self::Text(text) => text.clone(),
			Self::Integer(int) => int.to_string(),
			Self::Float(float) => float.to_string(),
			Self::Bool(flag) => flag.to_string(),
			Self::DateTime(at) => at.format(&Rfc3339).unwrap_or_default(),
		}
	}

	pub fn as_datetime(&self) -> Option<OffsetDateTime> {
		match self {
			Self::DateTime(at) => Some(*at),
			Self::Text(text) => crate::time_serde::parse(text).ok(),
			_ => None,
		}
	}

	/// Equality that tolerates request values arriving as text, e.g. `"true"` against a
	/// boolean field or an RFC 3339 string against a timestamp.
	pub fn loosely_eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Text(a), Self::Text(b)) => a == b,
			(Self::Integer(a), Self::Integer(b)) => a == b,
			(Self::Bool(a), Self::Bool(b)) => a == b,
			(Self::DateTime(a), Self::DateTime(b)) => a == b,
			(Self::Integer(a), Self::Float(b)) | (Self::Float(b), Self::Integer(a)) =>
				(*a as f64) == *b,
			(Self::Float(a), Self::Float(b)) => a == b,
			(Self::DateTime(at), other) | (other, Self::DateTime(at)) =>
				other.as_datetime().is_some_and(|candidate| candidate == *at),
			(a, b) => a.as_text().eq_ignore_ascii_case(&b.as_text()),
		}
	}
}

/// Classifies one request key/value pair. Returns `None` when the value is `null`.
pub fn classify(key: &str, value: &Value) -> Result<Option<Filter>, ValidationError> {
	if value.is_null() {
		return Ok(None);
	}
	if let Value::Array(items) = value {
		return classify_in(key, items).map(Some);
	}
	if let Some(base) = domain_base(key) {
		let suffix = parse_domain(key, value)?;

		return Ok(Some(Filter { field: base, kind: FilterKind::Suffix(suffix) }));
	}
	if matches_key(&DATE_KEY, key) {
		return classify_date(key, value).map(Some);
	}
	if matches_key(&NAME_KEY, key) {
		let term = scalar_text(key, value)?;

		return Ok(Some(Filter { field: key.to_string(), kind: FilterKind::Contains(term) }));
	}

	Ok(FilterValue::from_json(key, value)?
		.map(|value| Filter { field: key.to_string(), kind: FilterKind::Equals(value) }))
}

fn classify_in(key: &str, items: &[Value]) -> Result<Filter, ValidationError> {
	if items.len() > MAX_IN_LIST_ITEMS {
		return Err(ValidationError::new(
			key,
			format!("Filter lists may contain at most {MAX_IN_LIST_ITEMS} items."),
		));
	}

	if matches_key(&DATE_KEY, key) {
		let mut alternatives = Vec::with_capacity(items.len());

		for item in items {
			match item {
				Value::Null => {},
				Value::String(raw) => alternatives.push(date_kind(key, raw)?),
				_ => {
					return Err(ValidationError::new(
						key,
						"Date filter lists accept RFC 3339 instants or YYYY-MM-DD dates.",
					));
				},
			}
		}

		return Ok(Filter { field: key.to_string(), kind: FilterKind::AnyOf(alternatives) });
	}

	let mut values = Vec::with_capacity(items.len());

	for item in items {
		if let Some(value) = FilterValue::from_json(key, item)? {
			values.push(value);
		}
	}

	Ok(Filter { field: key.to_string(), kind: FilterKind::In(values) })
}

fn classify_date(key: &str, value: &Value) -> Result<Filter, ValidationError> {
	let kind = match value {
		Value::String(raw) => date_kind(key, raw)?,
		Value::Object(bounds) => parse_bounds(key, bounds)?,
		_ => {
			return Err(ValidationError::new(
				key,
				"Date filters accept an RFC 3339 instant, a YYYY-MM-DD date, or a bounds object.",
			));
		},
	};

	Ok(Filter { field: key.to_string(), kind })
}

/// A calendar date covers its UTC day; anything else must be an exact RFC 3339 instant.
fn date_kind(key: &str, raw: &str) -> Result<FilterKind, ValidationError> {
	check_string_len(key, raw)?;

	Ok(match parse_date_only(raw) {
		Some(day) => FilterKind::Range {
			lower: Some(RangeBound::inclusive(start_of(day))),
			upper: Some(RangeBound::exclusive(start_of(next_day(key, day)?))),
		},
		None => FilterKind::Equals(FilterValue::DateTime(parse_instant(key, raw)?)),
	})
}

fn parse_bounds(key: &str, bounds: &Map<String, Value>) -> Result<FilterKind, ValidationError> {
	if bounds.is_empty() {
		return Err(ValidationError::new(key, "Date bounds must name at least one of gte, gt, lte, lt."));
	}
	if let Some(unknown) = bounds.keys().find(|k| !matches!(k.as_str(), "gte" | "gt" | "lte" | "lt")) {
		return Err(ValidationError::new(key, format!("Unsupported date bound '{unknown}'.")));
	}
	if bounds.contains_key("gt") && bounds.contains_key("gte") {
		return Err(ValidationError::new(key, "Use either gt or gte, not both."));
	}
	if bounds.contains_key("lt") && bounds.contains_key("lte") {
		return Err(ValidationError::new(key, "Use either lt or lte, not both."));
	}

	let mut lower = None;
	let mut upper = None;

	for (op, raw) in bounds {
		if raw.is_null() {
			continue;
		}

		let Some(text) = raw.as_str() else {
			return Err(ValidationError::new(key, format!("Date bound '{op}' must be a string.")));
		};

		check_string_len(key, text)?;

		let bound = match (op.as_str(), parse_date_only(text)) {
			("gte", Some(day)) => RangeBound::inclusive(start_of(day)),
			("gt", Some(day)) => RangeBound::inclusive(start_of(next_day(key, day)?)),
			("lte", Some(day)) => RangeBound::exclusive(start_of(next_day(key, day)?)),
			("lt", Some(day)) => RangeBound::exclusive(start_of(day)),
			("gte" | "lte", None) => RangeBound::inclusive(parse_instant(key, text)?),
			(_, None) => RangeBound::exclusive(parse_instant(key, text)?),
			_ => continue,
		};

		if op.starts_with('g') {
			lower = Some(bound);
		} else {
			upper = Some(bound);
		}
	}

	Ok(FilterKind::Range { lower, upper })
}

fn parse_domain(key: &str, value: &Value) -> Result<String, ValidationError> {
	let Some(raw) = value.as_str() else {
		return Err(ValidationError::new(key, "Domain filters must be strings."));
	};

	check_string_len(key, raw)?;

	let domain = raw.trim().trim_start_matches('@').to_ascii_lowercase();
	let valid = DOMAIN_VALUE.as_ref().map(|re| re.is_match(&domain)).unwrap_or(false);

	if !valid {
		return Err(ValidationError::new(key, format!("'{raw}' is not a valid domain.")));
	}

	Ok(format!("@{domain}"))
}

fn domain_base(key: &str) -> Option<String> {
	let re = DOMAIN_KEY.as_ref()?;
	let caps = re.captures(key)?;

	caps.name("camel").or_else(|| caps.name("snake")).map(|base| base.as_str().to_string())
}

fn matches_key(re: &LazyLock<Option<Regex>>, key: &str) -> bool {
	re.as_ref().map(|re| re.is_match(key)).unwrap_or(false)
}

fn scalar_text(key: &str, value: &Value) -> Result<String, ValidationError> {
	match FilterValue::from_json(key, value)? {
		Some(value) => Ok(value.as_text()),
		None => Ok(String::new()),
	}
}

fn check_string_len(field: &str, value: &str) -> Result<(), ValidationError> {
	if value.len() > MAX_STRING_BYTES {
		return Err(ValidationError::new(
			field,
			format!("String values must be at most {MAX_STRING_BYTES} bytes."),
		));
	}

	Ok(())
}

fn parse_date_only(raw: &str) -> Option<Date> {
	Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).ok()
}

fn parse_instant(key: &str, raw: &str) -> Result<OffsetDateTime, ValidationError> {
	crate::time_serde::parse(raw).map_err(|_| {
		ValidationError::new(key, format!("'{raw}' is not an RFC 3339 instant or YYYY-MM-DD date."))
	})
}

fn start_of(day: Date) -> OffsetDateTime {
	day.midnight().assume_utc()
}

fn next_day(key: &str, day: Date) -> Result<Date, ValidationError> {
	day.checked_add(Duration::days(1))
		.ok_or_else(|| ValidationError::new(key, "Date is out of range."))
}
