use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::ValidationError;

/// Nested relation inclusion built from dot-separated paths.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RelationTree {
	children: BTreeMap<String, RelationTree>,
}
impl RelationTree {
	pub fn from_paths<I, S>(paths: I) -> Result<Self, ValidationError>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut tree = Self::default();

		for path in paths {
			tree.insert(path.as_ref())?;
		}

		Ok(tree)
	}

	/// Merges `path` into the tree. Blank paths are ignored.
	pub fn insert(&mut self, path: &str) -> Result<(), ValidationError> {
		let path = path.trim();

		if path.is_empty() {
			return Ok(());
		}

		let segments: Vec<&str> = path.split('.').collect();

		for segment in &segments {
			validate_segment(path, segment)?;
		}

		let mut node = self;

		for segment in segments {
			node = node.children.entry(segment.to_string()).or_default();
		}

		Ok(())
	}

	pub fn is_empty(&self) -> bool {
		self.children.is_empty()
	}

	pub fn get(&self, name: &str) -> Option<&RelationTree> {
		self.children.get(name)
	}

	pub fn children(&self) -> impl Iterator<Item = (&str, &RelationTree)> {
		self.children.iter().map(|(name, child)| (name.as_str(), child))
	}

	/// Renders the tree as a nested include object: leaves are `true`, inner nodes carry an
	/// `include` object for their children.
	pub fn to_value(&self) -> Value {
		let mut out = Map::new();

		for (name, child) in &self.children {
			let value = if child.is_empty() {
				Value::Bool(true)
			} else {
				let mut nested = Map::new();

				nested.insert("include".to_string(), child.to_value());

				Value::Object(nested)
			};

			out.insert(name.clone(), value);
		}

		Value::Object(out)
	}
}

fn validate_segment(path: &str, segment: &str) -> Result<(), ValidationError> {
	if segment.is_empty() {
		return Err(ValidationError::new(
			"include",
			format!("Relation path '{path}' contains an empty segment."),
		));
	}
	if !segment.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
		return Err(ValidationError::new(
			"include",
			format!("Relation segment '{segment}' contains unsupported characters."),
		));
	}

	Ok(())
}
