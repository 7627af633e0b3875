//! Parser / semantic analyzer (component C3): lifts a host AST into typed
//! IR, resolving names against an explicit [`Environment`], type-checking
//! every expression and statement, and assigning stencil/boundary context.

mod context;
mod environment;
mod error;
mod lower;

pub use context::{ContextGuard, ContextStack, ContextTag};
pub use environment::{EnvEntry, Environment, OperatorHandle, Pragma};
pub use error::SemanticError;
pub use lower::{lower_function, LoweredFunction};
