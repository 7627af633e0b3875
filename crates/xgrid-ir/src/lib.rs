//! The xgrid intermediate representation (component C2): a typed, acyclic
//! tree of expressions and statements produced by C3 and consumed by C4.
//! Every expression carries the [`xgrid_types::Type`] C3 resolved for it;
//! every node carries a source [`xgrid_util::Location`].

pub mod expr;
pub mod operator;
pub mod print;
pub mod stmt;
pub mod variable;

pub use expr::{ConstantValue, Expression, GridInfoKind, Stencil, StencilCtx};
pub use operator::{BinOp, CmpOp, LogicOp, UnaryOp};
pub use print::{render, Formatter};
pub use stmt::{DefinitionMode, Statement, Terminal};
pub use variable::{Signature, Variable};

pub use xgrid_util::Location;
