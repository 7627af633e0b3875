//! C identifier and type-name conventions shared by the type-emission and
//! expression-emission passes.

use xgrid_types::{abbreviation, FloatWidth, ReferenceType, Type, ValueType};

/// The C spelling of a bare value type: primitives map to `<stdint.h>`/
/// `<stdbool.h>` names, a struct to its own tag.
pub(crate) fn value_ctype(v: &ValueType) -> String {
	match v {
		ValueType::Bool => "bool".to_owned(),
		ValueType::Int(w) => format!("int{}_t", w.bits()),
		ValueType::Float(FloatWidth::F32) => "float".to_owned(),
		ValueType::Float(FloatWidth::F64) => "double".to_owned(),
		ValueType::Struct(s) => format!("struct {}", s.name),
	}
}

/// The C struct tag for a Grid's generated record type, e.g.
/// `__Grid2d_f32` — reuses C1's [`abbreviation`] so it can never collide
/// with another Grid shape's record.
pub(crate) fn grid_type_name(elem: &ValueType, dim: usize) -> String {
	abbreviation(&Type::Reference(ReferenceType::Grid(elem.clone(), dim)))
}

/// The name of the inline accessor function for a Grid shape.
pub(crate) fn grid_accessor_name(elem: &ValueType, dim: usize) -> String {
	format!("{}_at", grid_type_name(elem, dim))
}

/// The C return-type spelling for a `Definition`'s signature. Reference
/// types never reach here — C3 rejects them as return types during
/// lowering.
pub(crate) fn return_ctype(t: &Type) -> String {
	match t {
		Type::Void => "void".to_owned(),
		Type::Value(v) => value_ctype(v),
		Type::Reference(_) => unreachable!("reference types are rejected as return types during lowering"),
	}
}

/// The C parameter-declaration spelling for a signature argument: `Value`s
/// pass by value, `Ptr`/`Grid` pass by address.
pub(crate) fn param_ctype(t: &Type) -> String {
	match t {
		Type::Void => unreachable!("a parameter can never have Void type"),
		Type::Value(v) => value_ctype(v),
		Type::Reference(ReferenceType::Ptr(elem)) => format!("{}*", value_ctype(elem)),
		Type::Reference(ReferenceType::Grid(elem, dim)) => {
			format!("struct {}*", grid_type_name(elem, *dim))
		}
	}
}
