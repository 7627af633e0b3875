use xgrid_codegen::{CodegenOptions, OverstepPolicy};
use xgrid_types::FloatWidth;

/// Default floating-point width and the external builder's behavior —
/// ported from `util/init.py`'s `Configuration` dataclass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
	pub parallel: bool,
	pub cc: Vec<String>,
	pub cacheroot: std::path::PathBuf,
	pub comment: bool,
	pub overstep: Overstep,
	pub opt_level: u8,
	pub precision: Precision,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overstep {
	None,
	Limit,
	Wrap,
}

impl From<Overstep> for OverstepPolicy {
	fn from(value: Overstep) -> Self {
		match value {
			Overstep::None => OverstepPolicy::None,
			Overstep::Limit => OverstepPolicy::Limit,
			Overstep::Wrap => OverstepPolicy::Wrap,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
	Float,
	Double,
}

impl Precision {
	#[must_use]
	pub fn width(self) -> FloatWidth {
		match self {
			Precision::Float => FloatWidth::F32,
			Precision::Double => FloatWidth::F64,
		}
	}
}

impl Default for Config {
	fn default() -> Self {
		Self {
			parallel: true,
			cc: vec!["gcc".to_owned(), "clang".to_owned(), "cc".to_owned()],
			cacheroot: std::path::PathBuf::from(".xgrid"),
			comment: false,
			overstep: Overstep::None,
			opt_level: 2,
			precision: Precision::Float,
		}
	}
}

impl Config {
	/// Flags the external builder is invoked with, beyond `-fPIC -shared`
	/// (which `xgrid_exec::Compiler` always adds).
	#[must_use]
	pub fn cflags(&self) -> Vec<String> {
		let mut flags = Vec::new();
		if self.parallel {
			flags.push("-fopenmp".to_owned());
		}
		flags.push(format!("-O{}", self.opt_level.min(3)));
		flags.push("-lm".to_owned());
		flags
	}

	#[must_use]
	pub fn codegen_options(&self) -> CodegenOptions {
		CodegenOptions {
			parallel: self.parallel,
			overstep: self.overstep.into(),
			comment: self.comment,
		}
	}
}

/// Un-annotated `Float` literals and `^`-widened arithmetic default to this
/// width, per [`Config::precision`]. Threaded into `xgrid_parse::lower_function`
/// as `default_precision`.
#[must_use]
pub fn default_precision(config: &Config) -> FloatWidth {
	config.precision.width()
}
