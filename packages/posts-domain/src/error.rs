/// A request value that cannot be turned into a bounded query.
///
/// `field` names the offending request key (or `$` for the request as a whole) so transports can
/// point the caller at the exact parameter.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
	pub field: String,
	pub message: String,
}
impl ValidationError {
	pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self { field: field.into(), message: message.into() }
	}
}
