use xgrid_hostast as host;
use xgrid_ir::{Expression, Statement, StencilCtx, Terminal, Variable};
use xgrid_types::{ReferenceType, Type, ValueType};
use xgrid_util::Location;

use crate::context::{ContextGuard, ContextTag};
use crate::environment::{EnvEntry, Pragma};
use crate::error::SemanticError;

use super::Lowerer;

impl Lowerer<'_> {
	pub(crate) fn lower_block(
		&mut self,
		stmts: &[host::Stmt],
	) -> Result<Vec<Statement>, SemanticError> {
		let mut out = Vec::with_capacity(stmts.len());
		for stmt in stmts {
			self.lower_one(stmt, &mut out)?;
		}
		Ok(out)
	}

	fn lower_one(&mut self, stmt: &host::Stmt, out: &mut Vec<Statement>) -> Result<(), SemanticError> {
		match stmt {
			host::Stmt::Expr { value, location } => {
				if self.context.in_raw_c() {
					let host::Expr::Constant {
						value: host::Constant::Str(src),
						..
					} = value
					else {
						return Err(SemanticError::new(
							location.clone(),
							"a 'with c():' block may only contain string-literal statements",
						));
					};
					out.push(Statement::Inline {
						source: src.clone(),
						location: location.clone(),
					});
				} else {
					let e = self.lower_expr(value)?;
					out.push(Statement::Evaluation {
						value: e,
						location: location.clone(),
					});
				}
				Ok(())
			}
			host::Stmt::Assign {
				target,
				annotation,
				value,
				location,
			} => {
				let rhs = self.lower_expr(value)?;
				if let Some(raw) = annotation {
					let declared = super::resolve_annotation(raw, self.env, location)?;
					if declared != rhs.ty() {
						return Err(SemanticError::new(
							location.clone(),
							format!(
								"declared type {declared} does not match assigned value type {}",
								rhs.ty()
							),
						));
					}
				}
				let terminal = self.lower_target(target, &rhs.ty(), annotation.is_some(), location)?;
				out.push(Statement::Assignment {
					terminal,
					value: rhs,
					location: location.clone(),
				});
				Ok(())
			}
			host::Stmt::AugAssign {
				target,
				op,
				value,
				location,
			} => {
				let left = self.lower_expr(target)?;
				let right = self.lower_expr(value)?;
				let combined = self.build_binary(*op, left, right, location)?;
				let terminal = self.lower_target(target, &combined.ty(), false, location)?;
				out.push(Statement::Assignment {
					terminal,
					value: combined,
					location: location.clone(),
				});
				Ok(())
			}
			host::Stmt::Return { value, location } => {
				let lowered = value.as_ref().map(|v| self.lower_expr(v)).transpose()?;
				let ty = lowered.as_ref().map(Expression::ty).unwrap_or(Type::Void);
				if ty != self.return_type {
					return Err(SemanticError::new(
						location.clone(),
						format!(
							"return type mismatch: declared {}, got {ty}",
							self.return_type
						),
					));
				}
				out.push(Statement::Return {
					value: lowered,
					location: location.clone(),
				});
				Ok(())
			}
			host::Stmt::If {
				test,
				body,
				orelse,
				location,
			} => {
				let cond = self.lower_expr(test)?;
				if cond.ty() != Type::Value(ValueType::Bool) {
					return Err(SemanticError::new(location.clone(), "'if' condition must be bool"));
				}
				let lowered_body = {
					let _guard = ContextGuard::push(&mut self.context, ContextTag::If);
					self.lower_block(body)?
				};
				let lowered_orelse = {
					let _guard = ContextGuard::push(&mut self.context, ContextTag::If);
					self.lower_block(orelse)?
				};
				out.push(Statement::If {
					condition: cond,
					body: lowered_body,
					orelse: lowered_orelse,
					location: location.clone(),
				});
				Ok(())
			}
			host::Stmt::While { test, body, location } => {
				let cond = self.lower_expr(test)?;
				if cond.ty() != Type::Value(ValueType::Bool) {
					return Err(SemanticError::new(
						location.clone(),
						"'while' condition must be bool",
					));
				}
				let lowered_body = {
					let _guard = ContextGuard::push(&mut self.context, ContextTag::While);
					self.lower_block(body)?
				};
				out.push(Statement::While {
					condition: cond,
					body: lowered_body,
					location: location.clone(),
				});
				Ok(())
			}
			host::Stmt::For {
				target,
				start,
				stop,
				step,
				body,
				location,
			} => {
				let start_e = self.lower_expr(start)?;
				let stop_e = self.lower_expr(stop)?;
				let step_e = self.lower_expr(step)?;
				let ty = start_e.ty();
				if !matches!(&ty, Type::Value(v) if v.is_number()) || ty != stop_e.ty() || ty != step_e.ty() {
					return Err(SemanticError::new(
						location.clone(),
						"'for' start/end/step must share the same Number type",
					));
				}
				let loop_var = Variable::new(target.clone(), ty);
				self.scope.insert(target.clone(), loop_var.clone());
				let lowered_body = self.lower_block(body)?;
				out.push(Statement::For {
					variable: loop_var,
					start: start_e,
					end: stop_e,
					step: step_e,
					body: lowered_body,
					location: location.clone(),
				});
				Ok(())
			}
			host::Stmt::With { context, body, location } => {
				self.lower_with(context, body, location, out)
			}
			host::Stmt::Import { .. } => {
				let host::Stmt::Import { module, .. } = stmt else {
					unreachable!()
				};
				self.includes.push(module.clone());
				Ok(())
			}
		}
	}

	fn lower_with(
		&mut self,
		context: &host::Expr,
		body: &[host::Stmt],
		location: &Location,
		out: &mut Vec<Statement>,
	) -> Result<(), SemanticError> {
		let host::Expr::Call { func, args, .. } = context else {
			return Err(SemanticError::new(
				location.clone(),
				"unsupported 'with' context manager",
			));
		};
		let host::Expr::Name { id, .. } = func.as_ref() else {
			return Err(SemanticError::new(
				location.clone(),
				"unsupported 'with' context manager",
			));
		};

		match self.env.get(id) {
			Some(EnvEntry::Pragma(Pragma::C)) => {
				let _guard = ContextGuard::push(&mut self.context, ContextTag::C);
				out.extend(self.lower_block(body)?);
				Ok(())
			}
			Some(EnvEntry::Pragma(Pragma::Boundary)) => {
				if self.context.has_boundary() {
					return Err(SemanticError::new(
						location.clone(),
						"nested 'boundary' contexts are not allowed",
					));
				}
				let [mask_expr] = args else {
					return Err(SemanticError::new(
						location.clone(),
						"'boundary' expects exactly one mask argument",
					));
				};
				let mask = self.eval_int_literal(mask_expr)?;
				if mask < 0 {
					return Err(SemanticError::new(
						location.clone(),
						"boundary mask must be a non-negative integer constant",
					));
				}
				let _guard =
					ContextGuard::push(&mut self.context, ContextTag::Boundary(mask as i32));
				out.extend(self.lower_block(body)?);
				Ok(())
			}
			_ => Err(SemanticError::new(
				location.clone(),
				format!("'{id}' is not a recognized 'with' context manager"),
			)),
		}
	}

	/// Resolve an assignment's left-hand side. `has_annotation` tells us a
	/// declared-type check already happened at the call site (`Assign`); for
	/// a bare new local with no annotation, that's an error.
	fn lower_target(
		&mut self,
		target: &host::Expr,
		rhs_ty: &Type,
		has_annotation: bool,
		location: &Location,
	) -> Result<Terminal, SemanticError> {
		match target {
			host::Expr::Name { id, .. } => {
				if let Some(existing) = self.scope.get(id) {
					if matches!(existing.ty, Type::Reference(ReferenceType::Grid(_, _))) {
						return Err(SemanticError::new(
							location.clone(),
							"grids are not value-assignable",
						));
					}
					if existing.ty != *rhs_ty {
						return Err(SemanticError::new(
							location.clone(),
							format!(
								"cannot assign {rhs_ty} to '{id}' of type {}",
								existing.ty
							),
						));
					}
					Ok(Terminal::Identifier(existing.clone()))
				} else if has_annotation {
					let var = Variable::new(id.clone(), rhs_ty.clone());
					self.scope.insert(id.clone(), var.clone());
					Ok(Terminal::Identifier(var))
				} else {
					Err(SemanticError::new(
						location.clone(),
						format!("assignment to new local '{id}' requires a type annotation"),
					))
				}
			}
			host::Expr::Attribute { value, attr, .. } => {
				let base_expr = self.lower_expr(value)?;
				let base_ty = base_expr.ty();
				let field_ty = self.field_type(&base_ty, attr, location)?;
				if field_ty != *rhs_ty {
					return Err(SemanticError::new(
						location.clone(),
						format!("field '{attr}' expects {field_ty}, got {rhs_ty}"),
					));
				}
				let base_terminal = self.lower_target(value, &base_ty, false, location)?;
				Ok(Terminal::Access {
					base: Box::new(base_terminal),
					field: attr.clone(),
					ty: field_ty,
				})
			}
			host::Expr::Subscript { value, slice, .. } => {
				let Expression::Stencil(stencil) =
					self.lower_subscript(value, slice, StencilCtx::Store, None, location)?
				else {
					unreachable!("lower_subscript always returns a Stencil expression")
				};
				let elem_ty = match &stencil.grid.ty {
					Type::Reference(ReferenceType::Grid(elem, _)) => Type::Value(elem.clone()),
					_ => unreachable!(),
				};
				if elem_ty != *rhs_ty {
					return Err(SemanticError::new(
						location.clone(),
						format!(
							"grid '{}' has element type {elem_ty}, cannot store {rhs_ty}",
							stencil.grid.name
						),
					));
				}
				Ok(Terminal::Stencil(stencil))
			}
			other => Err(SemanticError::new(
				other.location().clone(),
				"invalid assignment target",
			)),
		}
	}
}
