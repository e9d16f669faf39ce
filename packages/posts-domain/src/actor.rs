use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Lifecycle slots on a record that may hold a foreign identity id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActorField {
	CreatedBy,
	UpdatedBy,
	DeletedBy,
}
impl ActorField {
	pub const ALL: [Self; 3] = [Self::CreatedBy, Self::UpdatedBy, Self::DeletedBy];

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::CreatedBy => "createdBy",
			Self::UpdatedBy => "updatedBy",
			Self::DeletedBy => "deletedBy",
		}
	}
}

/// Records that carry actor references.
pub trait ActorRefs {
	fn actor_ref(&self, field: ActorField) -> Option<Uuid>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
	Admin,
	User,
}

/// Identity record as returned by the identity service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedActor {
	pub id: Uuid,
	pub email: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub username: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub first_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub last_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub avatar: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub phone: Option<String>,
	#[serde(default)]
	pub is_verified: bool,
	pub role: Role,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
}
