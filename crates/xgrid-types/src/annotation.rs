use std::sync::Arc;

use xgrid_util::RString;

use crate::{FloatWidth, IntWidth, ReferenceType, StructType, Type, TypeSystemError, ValueType};

/// A host-language type annotation, as written by the caller building a
/// kernel signature or struct definition. This is the input to
/// [`parse_annotation`]; it exists as its own tree rather than being folded
/// straight into [`Type`] because an annotation may be invalid (a `Grid` of a
/// `Grid`, a field of `Ptr`, an `Int` of a width nothing supports) and the
/// error needs to name what was written, not just that resolution failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeAnnotation {
	Void,
	Bool,
	Int(u16),
	Float(u16),
	Ptr(Box<TypeAnnotation>),
	Grid(Box<TypeAnnotation>, usize),
	Struct(RString, Vec<(RString, TypeAnnotation)>),
}

/// Resolve a [`TypeAnnotation`] into a concrete [`Type`], rejecting any shape
/// the type system does not allow: unsupported widths, a reference nested
/// inside another reference, or a struct field that isn't a value type.
pub fn parse_annotation(annotation: &TypeAnnotation) -> Result<Type, TypeSystemError> {
	match annotation {
		TypeAnnotation::Void => Ok(Type::Void),
		TypeAnnotation::Bool => Ok(Type::Value(ValueType::Bool)),
		TypeAnnotation::Int(bits) => IntWidth::from_bits(*bits)
			.map(|w| Type::Value(ValueType::Int(w)))
			.ok_or(TypeSystemError::BadIntWidth(*bits)),
		TypeAnnotation::Float(bits) => FloatWidth::from_bits(*bits)
			.map(|w| Type::Value(ValueType::Float(w)))
			.ok_or(TypeSystemError::BadFloatWidth(*bits)),
		TypeAnnotation::Ptr(elem) => {
			let elem = parse_value_annotation(elem)?;
			Ok(Type::Reference(ReferenceType::Ptr(elem)))
		}
		TypeAnnotation::Grid(elem, dimension) => {
			let elem = parse_value_annotation(elem)?;
			if *dimension == 0 {
				return Err(TypeSystemError::BadGridDimension(0));
			}
			Ok(Type::Reference(ReferenceType::Grid(elem, *dimension)))
		}
		TypeAnnotation::Struct(name, fields) => {
			let mut resolved = Vec::with_capacity(fields.len());
			for (field_name, field_annot) in fields {
				let field_type = parse_value_annotation(field_annot).map_err(|_| {
					TypeSystemError::NonValueField {
						struct_name: name.clone(),
						field_name: field_name.clone(),
					}
				})?;
				resolved.push((field_name.clone(), field_type));
			}
			Ok(Type::Value(ValueType::Struct(Arc::new(StructType {
				name: name.clone(),
				fields: resolved,
			}))))
		}
	}
}

/// As [`parse_annotation`], but additionally rejects `Void` and any
/// [`ReferenceType`]; used wherever only a value may appear, namely grid
/// elements, pointer targets, and struct fields.
fn parse_value_annotation(annotation: &TypeAnnotation) -> Result<ValueType, TypeSystemError> {
	match parse_annotation(annotation)? {
		Type::Value(v) => Ok(v),
		Type::Void | Type::Reference(_) => Err(TypeSystemError::NestedReference),
	}
}
