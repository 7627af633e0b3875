//! Host AST shim (component C0).
//!
//! A tagged tree mirroring the shape a host language's parser hands down for
//! one function definition: names, constants, the handful of expression and
//! statement forms the sublanguage in C3 accepts, and nothing else (no
//! comprehensions, no lambdas, no decorators). Every node is location-tagged
//! so C3's diagnostics can always say where a rejected construct came from.

mod expr;
mod func;
mod stmt;

pub use expr::{BinOpKind, BoolOp, CmpOp, Constant, Expr, UnaryOp};
pub use func::{AnnotationParam, FunctionDef, Param, RawAnnotation};
pub use stmt::Stmt;

pub use xgrid_util::Location;
