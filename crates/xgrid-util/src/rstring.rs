use std::{borrow::Borrow, fmt, ops::Deref, sync::Arc};

/// A cheaply-clonable, immutable string.
///
/// Identifiers, file paths, and diagnostic messages get passed around and
/// cloned a lot as IR and diagnostics travel up through the pipeline; `RString`
/// makes that a refcount bump instead of a heap copy.
#[derive(Clone, Eq, PartialOrd, Ord)]
pub struct RString(Arc<str>);

impl RString {
	#[must_use]
	pub fn new(s: impl AsRef<str>) -> Self {
		Self(Arc::from(s.as_ref()))
	}

	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl Deref for RString {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

impl PartialEq for RString {
	fn eq(&self, other: &Self) -> bool {
		self.0.as_ref() == other.0.as_ref()
	}
}

impl std::hash::Hash for RString {
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		self.0.as_ref().hash(state);
	}
}

impl From<String> for RString {
	fn from(value: String) -> Self {
		Self(Arc::from(value))
	}
}

impl From<&str> for RString {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}

impl fmt::Display for RString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(self.0.as_ref(), f)
	}
}

impl fmt::Debug for RString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(self.0.as_ref(), f)
	}
}

impl Borrow<str> for RString {
	fn borrow(&self) -> &str {
		&self.0
	}
}
