//! Stencil-kernel DSL facade (component C7): ties the host AST shim, type
//! system, IR, parser, codegen, grid runtime, and compile/load façade
//! together behind an explicit `Config`/`Context`/`Operator` surface.
//!
//! Ported from `util/init.py`'s `Configuration`/`init`/`get_config` globals
//! and `lang/operator.py`'s `Operator`/`kernel`/`function`/`external`
//! decorators, made explicit values threaded through `invoke` rather than
//! module-level state (see the "Process-wide cache" design note).

mod config;
mod context;
mod error;
mod operator;

pub use config::{Config, Overstep, Precision};
pub use context::{default_context, Argument, Context};
pub use error::Error;
pub use operator::Operator;

pub use xgrid_exec::Builder;
pub use xgrid_hostast::FunctionDef;
pub use xgrid_parse::{EnvEntry, Environment, OperatorHandle, Pragma};
pub use xgrid_runtime::Grid;
pub use xgrid_types::{HostValue, ReferenceType, Type, ValueType};
pub use xgrid_util::{RString, Shape};
