use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
	Asc,
	Desc,
}
impl SortDirection {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Asc => "asc",
			Self::Desc => "desc",
		}
	}

	pub fn as_sql(&self) -> &'static str {
		match self {
			Self::Asc => "ASC",
			Self::Desc => "DESC",
		}
	}

	/// Case-insensitive `asc`/`desc`.
	pub fn parse(raw: &str) -> Option<Self> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"asc" => Some(Self::Asc),
			"desc" => Some(Self::Desc),
			_ => None,
		}
	}
}
impl Display for SortDirection {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sort {
	pub field: String,
	pub direction: SortDirection,
}
impl Sort {
	pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
		Self { field: field.into(), direction }
	}

	pub fn asc(field: impl Into<String>) -> Self {
		Self::new(field, SortDirection::Asc)
	}

	pub fn desc(field: impl Into<String>) -> Self {
		Self::new(field, SortDirection::Desc)
	}
}
