use xgrid_util::Location;

/// The parser's single error channel. There is no recovery: the first
/// `SemanticError` aborts the definition being lowered. Constructing one
/// always logs it at `error!` first, so a host that discards the `Result`
/// still gets a diagnostic trail.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{location}: {reason}")]
pub struct SemanticError {
	pub location: Location,
	pub reason: String,
}

impl SemanticError {
	pub fn new(location: Location, reason: impl Into<String>) -> Self {
		let err = Self {
			location,
			reason: reason.into(),
		};
		log::error!("{err}");
		err
	}
}
