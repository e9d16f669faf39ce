use serde_json::{Map, Value};

use crate::{
	ValidationError,
	query::{
		MAX_STRING_BYTES, PageWindow, QueryOptions, QuerySpec, Sort, SortDirection, filter,
	},
};

const RESERVED_KEYS: [&str; 6] = ["page", "limit", "search", "sortBy", "sortOrder", "include"];

/// Turns raw request parameters into a bounded [`QuerySpec`].
///
/// Keys outside `options.filter_keys` and the reserved pagination keys are ignored.
pub fn normalize(
	raw: &Map<String, Value>,
	options: &QueryOptions,
) -> Result<QuerySpec, ValidationError> {
	let page = integer_param(raw, "page")?.unwrap_or(1);
	let limit = integer_param(raw, "limit")?;
	let search_term = search_param(raw)?;
	let sort = sort_params(raw, options)?;
	let relation_paths = relation_params(raw, options)?;
	let mut filters = Vec::new();

	for (key, value) in raw {
		if RESERVED_KEYS.contains(&key.as_str()) || !options.filter_keys.iter().any(|k| k == key) {
			continue;
		}
		if let Some(filter) = filter::classify(key, value)? {
			filters.push(filter);
		}
	}

	Ok(QuerySpec {
		window: PageWindow::new(page, limit),
		search_term,
		filters,
		relation_paths,
		sort,
	})
}

fn integer_param(raw: &Map<String, Value>, key: &str) -> Result<Option<i64>, ValidationError> {
	let invalid = || ValidationError::new(key, format!("{key} must be an integer."));

	match raw.get(key) {
		None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(None),
		Some(Value::Number(number)) => match number.as_i64() {
			Some(int) => Ok(Some(int)),
			None => number
				.as_f64()
				.filter(|float| float.fract() == 0.0 && float.abs() < i64::MAX as f64)
				.map(|float| Some(float as i64))
				.ok_or_else(invalid),
		},
		Some(Value::String(text)) => {
			let text = text.trim();

			if text.is_empty() {
				return Ok(None);
			}

			text.parse::<i64>().map(Some).map_err(|_| invalid())
		},
		Some(_) => Err(invalid()),
	}
}

fn search_param(raw: &Map<String, Value>) -> Result<Option<String>, ValidationError> {
	let term = match raw.get("search") {
		None | Some(Value::Null) => return Ok(None),
		Some(Value::String(text)) => text.trim(),
		Some(_) => return Err(ValidationError::new("search", "search must be a string.")),
	};

	if term.is_empty() {
		return Ok(None);
	}
	if term.len() > MAX_STRING_BYTES {
		return Err(ValidationError::new(
			"search",
			format!("search must be at most {MAX_STRING_BYTES} bytes."),
		));
	}

	Ok(Some(term.to_string()))
}

fn sort_params(raw: &Map<String, Value>, options: &QueryOptions) -> Result<Sort, ValidationError> {
	let field = match optional_str(raw, "sortBy")? {
		Some(field) if !options.sort_fields.iter().any(|allowed| allowed == field) =>
			return Err(ValidationError::new(
				"sortBy",
				format!(
					"Unsupported sort field '{field}'. Expected one of: {}.",
					options.sort_fields.join(", ")
				),
			)),
		Some(field) => field.to_string(),
		None => options.default_sort.field.clone(),
	};
	let direction = match optional_str(raw, "sortOrder")? {
		Some(order) => SortDirection::parse(order).ok_or_else(|| {
			ValidationError::new("sortOrder", format!("sortOrder must be asc or desc, got '{order}'."))
		})?,
		None => options.default_sort.direction,
	};

	Ok(Sort { field, direction })
}

fn relation_params(
	raw: &Map<String, Value>,
	options: &QueryOptions,
) -> Result<Vec<String>, ValidationError> {
	let mut paths = options.relations.clone();
	let requested: Vec<String> = match raw.get("include") {
		None | Some(Value::Null) => Vec::new(),
		Some(Value::String(text)) => text.split(',').map(|path| path.trim().to_string()).collect(),
		Some(Value::Array(items)) => {
			let mut out = Vec::with_capacity(items.len());

			for item in items {
				let Some(path) = item.as_str() else {
					return Err(ValidationError::new("include", "include entries must be strings."));
				};

				out.extend(path.split(',').map(|path| path.trim().to_string()));
			}

			out
		},
		Some(_) => {
			return Err(ValidationError::new(
				"include",
				"include must be a comma-separated string or a list of strings.",
			));
		},
	};

	for path in requested {
		if !path.is_empty() && !paths.contains(&path) {
			paths.push(path);
		}
	}

	Ok(paths)
}

fn optional_str<'a>(
	raw: &'a Map<String, Value>,
	key: &str,
) -> Result<Option<&'a str>, ValidationError> {
	match raw.get(key) {
		None | Some(Value::Null) => Ok(None),
		Some(Value::String(text)) if text.trim().is_empty() => Ok(None),
		Some(Value::String(text)) => Ok(Some(text.trim())),
		Some(_) => Err(ValidationError::new(key, format!("{key} must be a string."))),
	}
}
