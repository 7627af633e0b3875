//! The xgrid type system (component C1).
//!
//! Two disjoint kinds of type cross the FFI boundary: [`ValueType`]s, which
//! pass by value, and [`ReferenceType`]s, which pass by address or as a
//! struct-of-pointers. Only [`ValueType`]s may appear inside a [`StructType`],
//! as a grid's element type, or as a kernel's return type.

mod abbreviation;
mod annotation;
mod error;
mod marshal;

pub use abbreviation::abbreviation;
pub use annotation::{parse_annotation, TypeAnnotation};
pub use error::TypeSystemError;
pub use marshal::{demarshal, marshal, HostValue};

use std::sync::Arc;

use xgrid_util::RString;

/// Any type that may be named in xgrid source: a [`ValueType`], a
/// [`ReferenceType`], or the absence of a return value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
	Void,
	Value(ValueType),
	Reference(ReferenceType),
}

impl Type {
	#[must_use]
	pub fn as_value(&self) -> Option<&ValueType> {
		match self {
			Type::Value(v) => Some(v),
			_ => None,
		}
	}

	#[must_use]
	pub fn is_void(&self) -> bool {
		matches!(self, Type::Void)
	}
}

impl std::fmt::Display for Type {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Type::Void => write!(f, "void"),
			Type::Value(v) => write!(f, "{v}"),
			Type::Reference(r) => write!(f, "{r}"),
		}
	}
}

/// A type which is passed by value across the foreign boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueType {
	Bool,
	Int(IntWidth),
	Float(FloatWidth),
	Struct(Arc<StructType>),
}

impl ValueType {
	/// True for `Int` and `Float`; the operand kind the binary/unary
	/// arithmetic and comparison operators in C2 require.
	#[must_use]
	pub fn is_number(&self) -> bool {
		matches!(self, ValueType::Int(_) | ValueType::Float(_))
	}

	#[must_use]
	pub fn is_float64(&self) -> bool {
		matches!(self, ValueType::Float(FloatWidth::F64))
	}

	/// ABI size in bytes, ignoring any enclosing struct's alignment padding.
	#[must_use]
	pub fn abi_size(&self) -> u32 {
		match self {
			ValueType::Bool => 1,
			ValueType::Int(w) => w.bytes(),
			ValueType::Float(w) => w.bytes(),
			ValueType::Struct(s) => s.layout().size,
		}
	}

	/// ABI alignment in bytes.
	#[must_use]
	pub fn abi_align(&self) -> u32 {
		match self {
			ValueType::Bool => 1,
			ValueType::Int(w) => w.bytes(),
			ValueType::Float(w) => w.bytes(),
			ValueType::Struct(s) => s.layout().align,
		}
	}
}

impl std::fmt::Display for ValueType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ValueType::Bool => write!(f, "bool"),
			ValueType::Int(w) => write!(f, "int{}", w.bits()),
			ValueType::Float(w) => write!(f, "float{}", w.bits()),
			ValueType::Struct(s) => write!(f, "{}", s.name),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
	W8,
	W16,
	W32,
	W64,
}

impl IntWidth {
	#[must_use]
	pub fn bits(self) -> u16 {
		match self {
			IntWidth::W8 => 8,
			IntWidth::W16 => 16,
			IntWidth::W32 => 32,
			IntWidth::W64 => 64,
		}
	}

	#[must_use]
	pub fn bytes(self) -> u32 {
		self.bits() as u32 / 8
	}

	#[must_use]
	pub fn from_bits(bits: u16) -> Option<Self> {
		match bits {
			8 => Some(Self::W8),
			16 => Some(Self::W16),
			32 => Some(Self::W32),
			64 => Some(Self::W64),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatWidth {
	F32,
	F64,
}

impl FloatWidth {
	#[must_use]
	pub fn bits(self) -> u16 {
		match self {
			FloatWidth::F32 => 32,
			FloatWidth::F64 => 64,
		}
	}

	#[must_use]
	pub fn bytes(self) -> u32 {
		self.bits() as u32 / 8
	}

	#[must_use]
	pub fn from_bits(bits: u16) -> Option<Self> {
		match bits {
			32 => Some(Self::F32),
			64 => Some(Self::F64),
			_ => None,
		}
	}
}

/// A named, ordered-field record type. Every field must be a [`ValueType`];
/// this is enforced at construction by [`parse_annotation`], never by callers
/// reaching into the fields directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructType {
	pub name: RString,
	pub fields: Vec<(RString, ValueType)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
	pub size: u32,
	pub align: u32,
}

impl StructType {
	/// C-compatible layout: fields in declaration order, each at the next
	/// offset satisfying its own alignment, struct size rounded up to the
	/// struct's alignment (the alignment of its widest field).
	#[must_use]
	pub fn layout(&self) -> Layout {
		let mut offset = 0u32;
		let mut align = 1u32;

		for (_, field) in &self.fields {
			let falign = field.abi_align();
			align = align.max(falign);
			offset = align_up(offset, falign);
			offset += field.abi_size();
		}

		Layout {
			size: align_up(offset, align).max(1),
			align,
		}
	}

	/// Byte offset of each field, in declaration order, per [`Self::layout`].
	#[must_use]
	pub fn field_offsets(&self) -> Vec<u32> {
		let mut offset = 0u32;
		let mut offsets = Vec::with_capacity(self.fields.len());

		for (_, field) in &self.fields {
			offset = align_up(offset, field.abi_align());
			offsets.push(offset);
			offset += field.abi_size();
		}

		offsets
	}
}

fn align_up(offset: u32, align: u32) -> u32 {
	debug_assert!(align.is_power_of_two());
	(offset + align - 1) & !(align - 1)
}

/// A type which is passed by address, never copied into a Value slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceType {
	Ptr(ValueType),
	Grid(ValueType, usize),
}

impl ReferenceType {
	#[must_use]
	pub fn element(&self) -> &ValueType {
		match self {
			ReferenceType::Ptr(e) => e,
			ReferenceType::Grid(e, _) => e,
		}
	}

	#[must_use]
	pub fn dimension(&self) -> Option<usize> {
		match self {
			ReferenceType::Ptr(_) => None,
			ReferenceType::Grid(_, d) => Some(*d),
		}
	}
}

impl std::fmt::Display for ReferenceType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ReferenceType::Ptr(e) => write!(f, "Ptr[{e}]"),
			ReferenceType::Grid(e, d) => write!(f, "Grid[{e}, {d}]"),
		}
	}
}
