//! Expression emission: a typed, string-returning `visit_*` dispatch per
//! node, mirroring `lang/generator.py`'s `visit_Binary`/`visit_Call`/etc.
//! shape, generalized to the full C2 `Expression` family and to the
//! reference-type call/cast-site adjustments SPEC_FULL.md adds.

use indexmap::IndexMap;
use xgrid_ir::{BinOp, Expression, GridInfoKind};
use xgrid_types::{FloatWidth, ReferenceType, Type, ValueType};
use xgrid_util::RString;

use crate::ctype::{grid_accessor_name, value_ctype};

pub(crate) struct ExprCtx<'a> {
	/// Names of the enclosing stencil loop's per-dimension index variables, in
	/// the grid's own axis order (`loop_vars[k]` iterates dimension `k`), set
	/// only while emitting the body of a stencil-tagged assignment's loop
	/// nest. [`stencil_access`] reverses them at the accessor call site.
	pub(crate) loop_vars: Option<&'a [String]>,
	pub(crate) operators: &'a IndexMap<RString, xgrid_ir::Signature>,
}

/// Render a Stencil node (load or store) as an accessor-dereference
/// expression: `*<accessor>(grid, space-offsets reversed…, time_offset)`.
/// Shared by expression-position loads ([`emit_expr`]'s `Stencil` arm) and
/// statement-position stores (the stencil-tagged assignment target).
pub(crate) fn stencil_access(s: &xgrid_ir::Stencil, loop_vars: &[String]) -> String {
	let (elem, dim) = grid_shape(&s.grid.ty).expect("stencil target must be grid-typed");
	let accessor = grid_accessor_name(elem, dim);
	let mut space_args: Vec<String> = s
		.space_offset
		.iter()
		.enumerate()
		.map(|(i, off)| format!("({} + ({off}))", loop_vars[i]))
		.collect();
	space_args.reverse();
	space_args.push(s.time_offset.to_string());
	format!("(*{accessor}({}, {}))", s.grid.name, space_args.join(", "))
}

/// Turn the C identifier for an operator/method handle: `.` isn't legal in
/// a C identifier, so a method key like `Particle.scale` becomes
/// `Particle_scale`.
pub(crate) fn sanitize_operator_name(name: &str) -> String {
	name.replace('.', "_")
}

pub(crate) fn grid_shape(ty: &Type) -> Option<(&ValueType, usize)> {
	match ty {
		Type::Reference(ReferenceType::Grid(elem, dim)) => Some((elem, *dim)),
		_ => None,
	}
}

fn format_float(v: f64) -> String {
	if v.is_nan() {
		return "NAN".to_owned();
	}
	if v.is_infinite() {
		return if v > 0.0 { "INFINITY".to_owned() } else { "-INFINITY".to_owned() };
	}
	let mut s = format!("{v}");
	if !s.contains('.') && !s.contains('e') {
		s.push_str(".0");
	}
	s
}

pub(crate) fn emit_expr(e: &Expression, ctx: &ExprCtx<'_>) -> String {
	match e {
		Expression::Constant { value, .. } => match value {
			xgrid_ir::ConstantValue::Bool(b) => b.to_string(),
			xgrid_ir::ConstantValue::Int8(n) => n.to_string(),
			xgrid_ir::ConstantValue::Int16(n) => n.to_string(),
			xgrid_ir::ConstantValue::Int32(n) => n.to_string(),
			xgrid_ir::ConstantValue::Int64(n) => format!("{n}LL"),
			xgrid_ir::ConstantValue::Float32(f) => format!("{}f", format_float(*f as f64)),
			xgrid_ir::ConstantValue::Float64(f) => format_float(*f),
		},
		Expression::Identifier { variable, .. } => {
			if matches!(variable.ty, Type::Reference(ReferenceType::Ptr(_))) {
				format!("(*{})", variable.name)
			} else {
				variable.name.to_string()
			}
		}
		Expression::Access { base, field, .. } => format!("({}).{field}", emit_expr(base, ctx)),
		Expression::Stencil(s) => {
			let loop_vars = ctx
				.loop_vars
				.expect("a Stencil read must be emitted inside its assignment's loop nest");
			stencil_access(s, loop_vars)
		}
		Expression::Binary { op, left, right, ty, .. } => emit_binary(*op, left, right, ty, ctx),
		Expression::Compare { op, left, right, .. } => format!(
			"({} {} {})",
			emit_expr(left, ctx),
			op.symbol(),
			emit_expr(right, ctx)
		),
		Expression::Logic { op, left, right, .. } => format!(
			"({} {} {})",
			emit_expr(left, ctx),
			op.symbol(),
			emit_expr(right, ctx)
		),
		Expression::Unary { op, operand, .. } => format!("({}{})", op.symbol(), emit_expr(operand, ctx)),
		Expression::Condition {
			test, body, orelse, ..
		} => format!(
			"({} ? {} : {})",
			emit_expr(test, ctx),
			emit_expr(body, ctx),
			emit_expr(orelse, ctx)
		),
		Expression::Cast { target, value, .. } => {
			format!("(({}) {})", return_cast_ctype(target), emit_expr(value, ctx))
		}
		Expression::Call { operator, args, ty, .. } => emit_call(operator, args, ty, ctx),
		Expression::GridInfo { kind, grid, dim, .. } => match kind {
			GridInfoKind::Dimension => {
				let (_, d) = grid_shape(&grid.ty).expect("GridInfo target must be grid-typed");
				d.to_string()
			}
			GridInfoKind::Shape => format!(
				"{}->shape[{}]",
				grid.name,
				dim.expect("Shape GridInfo always carries a dimension index")
			),
		},
	}
}

fn return_cast_ctype(t: &Type) -> String {
	match t {
		Type::Void => "void".to_owned(),
		Type::Value(v) => value_ctype(v),
		Type::Reference(_) => unreachable!("cast() only ever targets a Value annotation"),
	}
}

fn emit_binary(op: BinOp, left: &Expression, right: &Expression, ty: &Type, ctx: &ExprCtx<'_>) -> String {
	let l = emit_expr(left, ctx);
	let r = emit_expr(right, ctx);
	match op {
		BinOp::Pow => match ty {
			Type::Value(ValueType::Float(FloatWidth::F64)) => format!("pow({l}, {r})"),
			Type::Value(ValueType::Float(FloatWidth::F32)) => format!("powf({l}, {r})"),
			_ => unreachable!("'^' always widens to a Float result"),
		},
		BinOp::Mod if matches!(ty, Type::Value(ValueType::Float(FloatWidth::F64))) => {
			format!("fmod({l}, {r})")
		}
		BinOp::Mod if matches!(ty, Type::Value(ValueType::Float(FloatWidth::F32))) => {
			format!("fmodf({l}, {r})")
		}
		_ => format!("({l} {} {r})", op.symbol()),
	}
}

fn emit_call(operator: &RString, args: &[Expression], ty: &Type, ctx: &ExprCtx<'_>) -> String {
	if let Some(sig) = ctx.operators.get(operator) {
		let rendered = args
			.iter()
			.zip(sig.args.iter())
			.map(|(a, (_, pty))| {
				let s = emit_expr(a, ctx);
				let takes_address = matches!(
					(pty, a.ty()),
					(Type::Reference(ReferenceType::Ptr(elem)), Type::Value(v)) if *elem == v
				);
				if takes_address {
					format!("(&{s})")
				} else {
					s
				}
			})
			.collect::<Vec<_>>()
			.join(", ");
		return format!("{}({rendered})", sanitize_operator_name(operator));
	}

	// No registered operator by this name: it must be a struct constructor
	// (C3 only ever produces a `Call` with an unregistered operator name
	// when `operator` equals a struct's own name).
	let ctype = match ty {
		Type::Value(ValueType::Struct(s)) => format!("struct {}", s.name),
		other => unreachable!("unregistered call target must be a struct constructor, got {other}"),
	};
	let rendered = args.iter().map(|a| emit_expr(a, ctx)).collect::<Vec<_>>().join(", ");
	format!("({ctype}){{{rendered}}}")
}
