use xgrid_util::RString;

/// Raised by C1 when a host-language type annotation cannot be translated
/// into an xgrid [`crate::Type`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum TypeSystemError {
	#[error("unknown integer width: {0} bits (expected 8, 16, 32, or 64)")]
	BadIntWidth(u16),

	#[error("unknown float width: {0} bits (expected 32 or 64)")]
	BadFloatWidth(u16),

	#[error("a reference type (Ptr/Grid) cannot nest another reference type as its element")]
	NestedReference,

	#[error("struct '{struct_name}' field '{field_name}' must be a value type, not a reference")]
	NonValueField {
		struct_name: RString,
		field_name: RString,
	},

	#[error("grid dimension must be a compile-time constant >= 1, got {0}")]
	BadGridDimension(i64),

	#[error("a return type may not be a reference type (Ptr/Grid): {0}")]
	ReferenceReturnType(RString),

	#[error("value does not match the shape of type {expected}")]
	ValueTypeMismatch { expected: RString },

	#[error("buffer of {got} bytes is too short to demarshal type {expected} ({need} bytes required)")]
	BufferTooShort {
		expected: RString,
		need: u32,
		got: usize,
	},
}
