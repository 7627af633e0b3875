//! Discovers every Struct and Grid type reachable from a kernel
//! `Definition`'s signature, locals, and expressions, in first-encountered
//! order — the order C4 forward-declares and defines them in. Struct fields
//! are noted before the struct itself, so a struct containing another
//! struct's value never emits out of dependency order.

use std::sync::Arc;

use xgrid_ir::{Expression, Statement, Terminal};
use xgrid_types::{ReferenceType, StructType, Type, ValueType};

#[derive(Debug, Default)]
pub(crate) struct TypeInventory {
	pub(crate) structs: Vec<Arc<StructType>>,
	pub(crate) grids: Vec<(ValueType, usize)>,
}

impl TypeInventory {
	pub(crate) fn collect(def: &Statement) -> Self {
		let mut inv = Self::default();
		if let Statement::Definition {
			signature,
			scope,
			body,
			..
		} = def
		{
			for (_, ty) in &signature.args {
				inv.note(ty);
			}
			inv.note(&signature.return_type);
			for var in scope.values() {
				inv.note(&var.ty);
			}
			for stmt in body {
				inv.note_stmt(stmt);
			}
		}
		inv
	}

	fn note(&mut self, ty: &Type) {
		match ty {
			Type::Value(v) => self.note_value(v),
			Type::Reference(ReferenceType::Ptr(elem)) => self.note_value(elem),
			Type::Reference(ReferenceType::Grid(elem, dim)) => {
				if !self.grids.iter().any(|(e, d)| e == elem && d == dim) {
					self.note_value(elem);
					self.grids.push((elem.clone(), *dim));
				}
			}
			Type::Void => {}
		}
	}

	fn note_value(&mut self, v: &ValueType) {
		if let ValueType::Struct(s) = v {
			self.note_struct(s);
		}
	}

	fn note_struct(&mut self, s: &Arc<StructType>) {
		if self.structs.iter().any(|x| x.name == s.name) {
			return;
		}
		for (_, field_ty) in &s.fields {
			self.note_value(field_ty);
		}
		self.structs.push(s.clone());
	}

	fn note_terminal(&mut self, t: &Terminal) {
		match t {
			Terminal::Identifier(v) => self.note(&v.ty),
			Terminal::Access { base, ty, .. } => {
				self.note_terminal(base);
				self.note(ty);
			}
			Terminal::Stencil(s) => self.note(&s.grid.ty),
		}
	}

	fn note_expr(&mut self, e: &Expression) {
		self.note(&e.ty());
		match e {
			Expression::Constant { .. } | Expression::Identifier { .. } => {}
			Expression::Access { base, .. } => self.note_expr(base),
			Expression::Stencil(s) => self.note(&s.grid.ty),
			Expression::Binary { left, right, .. }
			| Expression::Compare { left, right, .. }
			| Expression::Logic { left, right, .. } => {
				self.note_expr(left);
				self.note_expr(right);
			}
			Expression::Unary { operand, .. } => self.note_expr(operand),
			Expression::Condition {
				test, body, orelse, ..
			} => {
				self.note_expr(test);
				self.note_expr(body);
				self.note_expr(orelse);
			}
			Expression::Cast { target, value, .. } => {
				self.note(target);
				self.note_expr(value);
			}
			Expression::Call { args, .. } => {
				for a in args {
					self.note_expr(a);
				}
			}
			Expression::GridInfo { grid, .. } => self.note(&grid.ty),
		}
	}

	fn note_stmt(&mut self, s: &Statement) {
		match s {
			Statement::Return { value, .. } => {
				if let Some(e) = value {
					self.note_expr(e);
				}
			}
			Statement::Break { .. } | Statement::Continue { .. } | Statement::Inline { .. } => {}
			Statement::If {
				condition,
				body,
				orelse,
				..
			} => {
				self.note_expr(condition);
				for s in body {
					self.note_stmt(s);
				}
				for s in orelse {
					self.note_stmt(s);
				}
			}
			Statement::While { condition, body, .. } => {
				self.note_expr(condition);
				for s in body {
					self.note_stmt(s);
				}
			}
			Statement::For {
				variable,
				start,
				end,
				step,
				body,
				..
			} => {
				self.note(&variable.ty);
				self.note_expr(start);
				self.note_expr(end);
				self.note_expr(step);
				for s in body {
					self.note_stmt(s);
				}
			}
			Statement::Evaluation { value, .. } => self.note_expr(value),
			Statement::Assignment { terminal, value, .. } => {
				self.note_terminal(terminal);
				self.note_expr(value);
			}
			Statement::Definition {
				signature,
				scope,
				body,
				..
			} => {
				for (_, ty) in &signature.args {
					self.note(ty);
				}
				self.note(&signature.return_type);
				for var in scope.values() {
					self.note(&var.ty);
				}
				for s in body {
					self.note_stmt(s);
				}
			}
		}
	}
}
