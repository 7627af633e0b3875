use xgrid_hostast as host;
use xgrid_ir::{
	BinOp, CmpOp, ConstantValue, Expression, GridInfoKind, LogicOp, Stencil, StencilCtx, UnaryOp,
	Variable,
};
use xgrid_types::{FloatWidth, IntWidth, ReferenceType, Type, ValueType};
use xgrid_util::{Location, RString};

use crate::environment::{EnvEntry, OperatorHandle};
use crate::error::SemanticError;

use super::annotation::expr_to_raw_annotation;
use super::Lowerer;

impl Lowerer<'_> {
	/// Lower an expression in read (load) context.
	pub(crate) fn lower_expr(&mut self, e: &host::Expr) -> Result<Expression, SemanticError> {
		match e {
			host::Expr::Name { id, location } => self.lower_name(id, location),
			host::Expr::Constant { value, location } => self.lower_constant(value, location),
			host::Expr::BinOp {
				left,
				op,
				right,
				location,
			} => {
				let l = self.lower_expr(left)?;
				let r = self.lower_expr(right)?;
				self.build_binary(*op, l, r, location)
			}
			host::Expr::UnaryOp {
				op,
				operand,
				location,
			} => {
				let v = self.lower_expr(operand)?;
				self.build_unary(*op, v, location)
			}
			host::Expr::BoolOp {
				op,
				values,
				location,
			} => self.build_bool_chain(*op, values, location),
			host::Expr::Compare {
				left,
				op,
				right,
				location,
			} => {
				let l = self.lower_expr(left)?;
				let r = self.lower_expr(right)?;
				self.build_compare(*op, l, r, location)
			}
			host::Expr::IfExp {
				test,
				body,
				orelse,
				location,
			} => {
				let t = self.lower_expr(test)?;
				if t.ty() != Type::Value(ValueType::Bool) {
					return Err(SemanticError::new(
						location.clone(),
						"condition of a conditional expression must be bool",
					));
				}
				let b = self.lower_expr(body)?;
				let o = self.lower_expr(orelse)?;
				if b.ty() != o.ty() {
					return Err(SemanticError::new(
						location.clone(),
						"both branches of a conditional expression must have the same type",
					));
				}
				let ty = b.ty();
				Ok(Expression::Condition {
					test: Box::new(t),
					body: Box::new(b),
					orelse: Box::new(o),
					ty,
					location: location.clone(),
				})
			}
			host::Expr::Call {
				func,
				args,
				location,
			} => self.lower_call(func, args, location),
			host::Expr::Subscript {
				value,
				slice,
				location,
			} => self.lower_subscript(value, slice, StencilCtx::Load, None, location),
			host::Expr::Attribute {
				value,
				attr,
				location,
			} => {
				let base = self.lower_expr(value)?;
				let ty = self.field_type(&base.ty(), attr, location)?;
				Ok(Expression::Access {
					base: Box::new(base),
					field: attr.clone(),
					ty,
					location: location.clone(),
				})
			}
			host::Expr::Tuple { location, .. } => Err(SemanticError::new(
				location.clone(),
				"tuple expressions are not part of the kernel sublanguage",
			)),
		}
	}

	pub(crate) fn lower_name(&self, id: &RString, location: &Location) -> Result<Expression, SemanticError> {
		if let Some(var) = self.scope.get(id) {
			return Ok(Expression::Identifier {
				variable: var.clone(),
				location: location.clone(),
			});
		}
		match self.env.get(id) {
			Some(EnvEntry::Constant(c)) => Ok(Expression::Constant {
				value: c.clone(),
				ty: constant_type(c),
				location: location.clone(),
			}),
			_ => Err(SemanticError::new(
				location.clone(),
				format!("unknown name '{id}'"),
			)),
		}
	}

	pub(crate) fn lower_constant(
		&self,
		value: &host::Constant,
		location: &Location,
	) -> Result<Expression, SemanticError> {
		let (value, ty) = match value {
			host::Constant::Bool(b) => (
				ConstantValue::Bool(*b),
				Type::Value(ValueType::Bool),
			),
			host::Constant::Int(n) => (
				ConstantValue::Int32(*n as i32),
				Type::Value(ValueType::Int(IntWidth::W32)),
			),
			host::Constant::Float(f) => match self.default_precision {
				FloatWidth::F32 => (
					ConstantValue::Float32(*f as f32),
					Type::Value(ValueType::Float(FloatWidth::F32)),
				),
				FloatWidth::F64 => (
					ConstantValue::Float64(*f),
					Type::Value(ValueType::Float(FloatWidth::F64)),
				),
			},
			host::Constant::Str(_) => {
				return Err(SemanticError::new(
					location.clone(),
					"string literals may only appear as the sole statement of a 'with c():' block",
				))
			}
		};
		Ok(Expression::Constant {
			value,
			ty,
			location: location.clone(),
		})
	}

	pub(crate) fn build_binary(
		&self,
		op: host::BinOpKind,
		l: Expression,
		r: Expression,
		location: &Location,
	) -> Result<Expression, SemanticError> {
		let (lt, rt) = (l.ty(), r.ty());
		let number = |t: &Type| matches!(t, Type::Value(v) if v.is_number());

		if op == host::BinOpKind::Pow {
			if !number(&lt) || !number(&rt) {
				return Err(SemanticError::new(
					location.clone(),
					"'^' requires Number operands",
				));
			}
			let is_f64 = |t: &Type| matches!(t, Type::Value(ValueType::Float(FloatWidth::F64)));
			let ty = if is_f64(&lt) || is_f64(&rt) {
				Type::Value(ValueType::Float(FloatWidth::F64))
			} else {
				Type::Value(ValueType::Float(self.default_precision))
			};
			return Ok(Expression::Binary {
				op: BinOp::Pow,
				left: Box::new(l),
				right: Box::new(r),
				ty,
				location: location.clone(),
			});
		}

		if !number(&lt) || lt != rt {
			return Err(SemanticError::new(
				location.clone(),
				format!("arithmetic operands must have the same Number type, got {lt} and {rt}"),
			));
		}

		Ok(Expression::Binary {
			op: map_binop(op),
			left: Box::new(l),
			right: Box::new(r),
			ty: lt,
			location: location.clone(),
		})
	}

	pub(crate) fn build_unary(
		&self,
		op: host::UnaryOp,
		v: Expression,
		location: &Location,
	) -> Result<Expression, SemanticError> {
		let ty = v.ty();
		match op {
			host::UnaryOp::Not => {
				if ty != Type::Value(ValueType::Bool) {
					return Err(SemanticError::new(location.clone(), "'!' requires bool"));
				}
			}
			host::UnaryOp::UAdd | host::UnaryOp::USub => {
				if !matches!(&ty, Type::Value(v) if v.is_number()) {
					return Err(SemanticError::new(
						location.clone(),
						"unary '+'/'-' require a Number operand",
					));
				}
			}
		}
		Ok(Expression::Unary {
			op: map_unary(op),
			operand: Box::new(v),
			ty,
			location: location.clone(),
		})
	}

	pub(crate) fn build_bool_chain(
		&mut self,
		op: host::BoolOp,
		values: &[host::Expr],
		location: &Location,
	) -> Result<Expression, SemanticError> {
		let mut lowered = values
			.iter()
			.map(|e| self.lower_expr(e))
			.collect::<Result<Vec<_>, _>>()?;

		for v in &lowered {
			if v.ty() != Type::Value(ValueType::Bool) {
				return Err(SemanticError::new(
					location.clone(),
					"logic operands must be bool",
				));
			}
		}

		let logic_op = match op {
			host::BoolOp::And => LogicOp::And,
			host::BoolOp::Or => LogicOp::Or,
		};

		let mut iter = lowered.drain(..);
		let mut acc = iter.next().expect("BoolOp always has at least one value");
		for next in iter {
			acc = Expression::Logic {
				op: logic_op,
				left: Box::new(acc),
				right: Box::new(next),
				location: location.clone(),
			};
		}
		Ok(acc)
	}

	pub(crate) fn build_compare(
		&self,
		op: host::CmpOp,
		l: Expression,
		r: Expression,
		location: &Location,
	) -> Result<Expression, SemanticError> {
		let (lt, rt) = (l.ty(), r.ty());
		if !matches!(&lt, Type::Value(v) if v.is_number()) || lt != rt {
			return Err(SemanticError::new(
				location.clone(),
				format!("comparison operands must have the same Number type, got {lt} and {rt}"),
			));
		}
		Ok(Expression::Compare {
			op: map_cmp(op),
			left: Box::new(l),
			right: Box::new(r),
			location: location.clone(),
		})
	}

	pub(crate) fn field_type(
		&self,
		base_ty: &Type,
		field: &str,
		location: &Location,
	) -> Result<Type, SemanticError> {
		match base_ty {
			Type::Value(ValueType::Struct(s)) => s
				.fields
				.iter()
				.find(|(n, _)| n.as_str() == field)
				.map(|(_, t)| Type::Value(t.clone()))
				.ok_or_else(|| {
					SemanticError::new(
						location.clone(),
						format!("struct '{}' has no field '{field}'", s.name),
					)
				}),
			other => Err(SemanticError::new(
				location.clone(),
				format!("cannot access field '{field}' on non-struct type {other}"),
			)),
		}
	}

	/// Resolve a subscript against a grid-typed base into a [`Stencil`]
	/// expression. `explicit_time` is `Some` only when called from the outer
	/// layer of a `grid[...][t]` double subscript.
	pub(crate) fn lower_subscript(
		&mut self,
		value: &host::Expr,
		slice: &[host::Expr],
		ctx: StencilCtx,
		explicit_time: Option<i64>,
		location: &Location,
	) -> Result<Expression, SemanticError> {
		// `grid[i1,...][t]` arrives as Subscript{value: Subscript{...}, slice: [t]}.
		if explicit_time.is_none() {
			if let host::Expr::Subscript {
				value: inner_value,
				slice: inner_slice,
				..
			} = value
			{
				if self.is_grid_identifier(inner_value) {
					let t = self.eval_int_literal(
						slice.first().ok_or_else(|| {
							SemanticError::new(location.clone(), "expected a time offset")
						})?,
					)?;
					if t > 0 {
						return Err(SemanticError::new(
							location.clone(),
							"stencil time offset must be <= 0",
						));
					}
					return self.lower_subscript(inner_value, inner_slice, ctx, Some(t), location);
				}
			}
		}

		let grid = self.grid_identifier(value, location)?;
		let dim = match &grid.ty {
			Type::Reference(ReferenceType::Grid(_, d)) => *d,
			_ => unreachable!("checked by grid_identifier"),
		};
		if slice.len() != dim {
			return Err(SemanticError::new(
				location.clone(),
				format!(
					"grid '{}' has dimension {dim}, got {} space subscript(s)",
					grid.name,
					slice.len()
				),
			));
		}
		let space_offset = slice
			.iter()
			.map(|e| self.eval_int_literal(e))
			.collect::<Result<Vec<_>, _>>()?;

		let time_offset = explicit_time.unwrap_or(match ctx {
			StencilCtx::Load => -1,
			StencilCtx::Store => 0,
		});

		Ok(Expression::Stencil(Stencil {
			grid,
			time_offset,
			space_offset,
			boundary_mask: self.context.current_boundary_mask(),
			ctx,
			location: location.clone(),
		}))
	}

	pub(crate) fn is_grid_identifier(&self, e: &host::Expr) -> bool {
		matches!(e, host::Expr::Name { id, .. } if matches!(
			self.scope.get(id).map(|v| &v.ty),
			Some(Type::Reference(ReferenceType::Grid(_, _)))
		))
	}

	pub(crate) fn grid_identifier(
		&self,
		e: &host::Expr,
		location: &Location,
	) -> Result<Variable, SemanticError> {
		let host::Expr::Name { id, .. } = e else {
			return Err(SemanticError::new(
				location.clone(),
				"a subscript base must be a grid-typed local",
			));
		};
		match self.scope.get(id) {
			Some(var) if matches!(var.ty, Type::Reference(ReferenceType::Grid(_, _))) => {
				Ok(var.clone())
			}
			_ => Err(SemanticError::new(
				location.clone(),
				format!("'{id}' is not a grid-typed local"),
			)),
		}
	}

	pub(crate) fn eval_int_literal(&self, e: &host::Expr) -> Result<i64, SemanticError> {
		match e {
			host::Expr::Constant {
				value: host::Constant::Int(n),
				..
			} => Ok(*n),
			host::Expr::UnaryOp {
				op: host::UnaryOp::USub,
				operand,
				..
			} => Ok(-self.eval_int_literal(operand)?),
			other => Err(SemanticError::new(
				other.location().clone(),
				"expected an integer constant",
			)),
		}
	}

	pub(crate) fn lower_call(
		&mut self,
		func: &host::Expr,
		args: &[host::Expr],
		location: &Location,
	) -> Result<Expression, SemanticError> {
		// built-in cast(TypeAnnotation, expr)
		if let host::Expr::Name { id, .. } = func {
			if id.as_str() == "cast" {
				let [ty_expr, value_expr] = args else {
					return Err(SemanticError::new(
						location.clone(),
						"cast() takes exactly 2 arguments",
					));
				};
				let raw = expr_to_raw_annotation(ty_expr)?;
				let target = super::annotation::resolve_annotation(&raw, self.env, location)?;
				let value = self.lower_expr(value_expr)?;
				return Ok(Expression::Cast {
					target,
					value: Box::new(value),
					location: location.clone(),
				});
			}
			if id.as_str() == "dimension" {
				let [grid_expr] = args else {
					return Err(SemanticError::new(
						location.clone(),
						"dimension() takes exactly 1 argument",
					));
				};
				let grid = self.grid_identifier(grid_expr, location)?;
				return Ok(Expression::GridInfo {
					kind: GridInfoKind::Dimension,
					grid,
					dim: None,
					location: location.clone(),
				});
			}
			if id.as_str() == "shape" {
				let [grid_expr, dim_expr] = args else {
					return Err(SemanticError::new(
						location.clone(),
						"shape() takes exactly 2 arguments",
					));
				};
				let grid = self.grid_identifier(grid_expr, location)?;
				let dim = self.eval_int_literal(dim_expr)? as usize;
				return Ok(Expression::GridInfo {
					kind: GridInfoKind::Shape,
					grid,
					dim: Some(dim),
					location: location.clone(),
				});
			}
		}

		// method call: value.method(args)
		if let host::Expr::Attribute {
			value, attr, ..
		} = func
		{
			let receiver = self.lower_expr(value)?;
			let recv_ty = match receiver.ty() {
				Type::Value(ValueType::Struct(s)) => s.name.clone(),
				other => {
					return Err(SemanticError::new(
						location.clone(),
						format!("cannot call a method on non-struct type {other}"),
					))
				}
			};
			let key = RString::from(format!("{recv_ty}.{attr}"));
			let handle = self.lookup_operator(&key, location)?;
			let mut call_args = Vec::with_capacity(args.len() + 1);
			call_args.push(receiver);
			for a in args {
				call_args.push(self.lower_expr(a)?);
			}
			self.check_call_args(&handle, &call_args, location)?;
			let ty = handle.signature.return_type.clone();
			return Ok(Expression::Call {
				operator: handle.name,
				args: call_args,
				ty,
				location: location.clone(),
			});
		}

		let host::Expr::Name { id, .. } = func else {
			return Err(SemanticError::new(
				location.clone(),
				"call target must be a name",
			));
		};

		let lowered_args = args
			.iter()
			.map(|a| self.lower_expr(a))
			.collect::<Result<Vec<_>, _>>()?;

		// struct constructor call
		if let Some(EnvEntry::Type(Type::Value(ValueType::Struct(s)))) = self.env.get(id) {
			if lowered_args.len() != s.fields.len() {
				return Err(SemanticError::new(
					location.clone(),
					format!(
						"constructor for '{}' takes {} argument(s), got {}",
						s.name,
						s.fields.len(),
						lowered_args.len()
					),
				));
			}
			for (arg, (fname, fty)) in lowered_args.iter().zip(s.fields.iter()) {
				if arg.ty() != Type::Value(fty.clone()) {
					return Err(SemanticError::new(
						location.clone(),
						format!(
							"field '{fname}' of '{}' expects {fty}, got {}",
							s.name,
							arg.ty()
						),
					));
				}
			}
			let ty = Type::Value(ValueType::Struct(s.clone()));
			return Ok(Expression::Call {
				operator: s.name.clone(),
				args: lowered_args,
				ty,
				location: location.clone(),
			});
		}

		let handle = self.lookup_operator(id, location)?;
		self.check_call_args(&handle, &lowered_args, location)?;
		let ty = handle.signature.return_type.clone();
		Ok(Expression::Call {
			operator: handle.name,
			args: lowered_args,
			ty,
			location: location.clone(),
		})
	}

	pub(crate) fn lookup_operator(
		&self,
		name: &str,
		location: &Location,
	) -> Result<OperatorHandle, SemanticError> {
		match self.env.get(name) {
			Some(EnvEntry::Operator(h)) => Ok(h.clone()),
			_ => Err(SemanticError::new(
				location.clone(),
				format!("'{name}' is not a callable operator"),
			)),
		}
	}

	pub(crate) fn check_call_args(
		&self,
		handle: &OperatorHandle,
		args: &[Expression],
		location: &Location,
	) -> Result<(), SemanticError> {
		if args.len() != handle.signature.args.len() {
			return Err(SemanticError::new(
				location.clone(),
				format!(
					"'{}' takes {} argument(s), got {}",
					handle.name,
					handle.signature.args.len(),
					args.len()
				),
			));
		}
		for (arg, (pname, pty)) in args.iter().zip(handle.signature.args.iter()) {
			let arg_ty = arg.ty();
			let ok = arg_ty == *pty
				|| matches!(
					(pty, &arg_ty),
					(Type::Reference(ReferenceType::Ptr(elem)), Type::Value(v)) if elem == v
				);
			if !ok {
				return Err(SemanticError::new(
					location.clone(),
					format!(
						"argument '{pname}' of '{}' expects {pty}, got {arg_ty}",
						handle.name
					),
				));
			}
		}
		Ok(())
	}
}

fn constant_type(c: &ConstantValue) -> Type {
	match c {
		ConstantValue::Bool(_) => Type::Value(ValueType::Bool),
		ConstantValue::Int8(_) => Type::Value(ValueType::Int(IntWidth::W8)),
		ConstantValue::Int16(_) => Type::Value(ValueType::Int(IntWidth::W16)),
		ConstantValue::Int32(_) => Type::Value(ValueType::Int(IntWidth::W32)),
		ConstantValue::Int64(_) => Type::Value(ValueType::Int(IntWidth::W64)),
		ConstantValue::Float32(_) => Type::Value(ValueType::Float(FloatWidth::F32)),
		ConstantValue::Float64(_) => Type::Value(ValueType::Float(FloatWidth::F64)),
	}
}

fn map_binop(op: host::BinOpKind) -> BinOp {
	match op {
		host::BinOpKind::Add => BinOp::Add,
		host::BinOpKind::Sub => BinOp::Sub,
		host::BinOpKind::Mult => BinOp::Mul,
		host::BinOpKind::Div => BinOp::Div,
		host::BinOpKind::Pow => BinOp::Pow,
		host::BinOpKind::Mod => BinOp::Mod,
	}
}

fn map_unary(op: host::UnaryOp) -> UnaryOp {
	match op {
		host::UnaryOp::UAdd => UnaryOp::Plus,
		host::UnaryOp::USub => UnaryOp::Minus,
		host::UnaryOp::Not => UnaryOp::Not,
	}
}

fn map_cmp(op: host::CmpOp) -> CmpOp {
	match op {
		host::CmpOp::Eq => CmpOp::Eq,
		host::CmpOp::NotEq => CmpOp::NotEq,
		host::CmpOp::Lt => CmpOp::Lt,
		host::CmpOp::LtE => CmpOp::LtE,
		host::CmpOp::Gt => CmpOp::Gt,
		host::CmpOp::GtE => CmpOp::GtE,
	}
}
