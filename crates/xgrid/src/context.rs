use std::cell::RefCell;
use std::ffi::c_void;
use std::rc::Rc;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use xgrid_codegen::generate;
use xgrid_exec::{BoundKernel, Builder, CallArg, Compiler};
use xgrid_ir::{DefinitionMode, Signature};
use xgrid_parse::{lower_function, Environment};
use xgrid_runtime::Grid;
use xgrid_types::HostValue;
use xgrid_util::RString;

use crate::config::{default_precision, Config};
use crate::error::Error;
use crate::operator::Operator;

struct CachedKernel {
	kernel: Arc<BoundKernel>,
	history_depth: usize,
}

/// The process-wide (here: `Context`-wide) operator cache and the
/// configuration it was built from, threaded explicitly through
/// parse/codegen/invoke — the port of `util/init.py`'s module-level
/// `_config`/`get_config` global plus `lang/generator.py`'s implicit
/// per-`Operator` `self.native` memo, made an explicit value instead of
/// hidden state.
///
/// The cache is `parking_lot::Mutex`-guarded (the teacher workspace's own
/// concurrency primitive) even though the single-threaded host model this
/// crate implements never contends on it today — see SPEC_FULL.md §5. This
/// keeps later concurrent-host support a non-breaking change.
pub struct Context<B: Builder = Compiler> {
	config: Config,
	builder: B,
	cache: Mutex<FxHashMap<RString, CachedKernel>>,
}

impl Context<Compiler> {
	/// A `Context` that compiles with a real system C compiler located from
	/// `config.cc`.
	pub fn new(config: Config) -> Result<Self, Error> {
		let cc_refs: Vec<&str> = config.cc.iter().map(String::as_str).collect();
		let compiler = Compiler::new(&config.cacheroot, &cc_refs)?;
		Ok(Self::with_builder(config, compiler))
	}
}

impl<B: Builder> Context<B> {
	pub fn with_builder(config: Config, builder: B) -> Self {
		Self {
			config,
			builder,
			cache: Mutex::new(FxHashMap::default()),
		}
	}

	#[must_use]
	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Invoke `op` against `args` and `env`, compiling and binding it on
	/// first use. Implements SPEC_FULL.md §4.6's `invoke(ctx, kernel, args…)`.
	pub fn invoke(&self, op: &Operator, env: &Environment, args: &mut [Argument]) -> Result<Option<HostValue>, Error> {
		let depth = self.ensure_compiled(op, env)?;

		let cache = self.cache.lock();
		let entry = cache.get(&op.name).expect("ensure_compiled just inserted this entry");
		let kernel = Arc::clone(&entry.kernel);
		drop(cache);

		let mut storage: Vec<(xgrid_runtime::ForeignGrid, Vec<u8>)> = Vec::new();
		let mut call_args: Vec<CallArg> = Vec::with_capacity(args.len());

		for arg in args.iter_mut() {
			match arg {
				Argument::Value(v) => call_args.push(CallArg::Value(v.clone())),
				Argument::Grid(g) => {
					g.prepare_for(depth);
					let foreign = g.marshal();
					let mut record = foreign.record_bytes(foreign.data_table_ptr());
					let ptr: *mut c_void = record.as_mut_ptr().cast();
					storage.push((foreign, record));
					call_args.push(CallArg::Pointer(ptr));
				}
			}
		}

		let result = kernel.call(&call_args)?;
		drop(storage);

		for arg in args.iter_mut() {
			if let Argument::Grid(g) = arg {
				g.rotate();
			}
		}

		Ok(result)
	}

	fn ensure_compiled(&self, op: &Operator, env: &Environment) -> Result<usize, Error> {
		{
			let cache = self.cache.lock();
			if let Some(entry) = cache.get(&op.name) {
				return Ok(entry.history_depth);
			}
		}

		let lowered = lower_function(&op.func, op.mode, env, default_precision(&self.config), op.receiver_type.clone())?;

		let operators = operator_signatures(env);
		let generated = generate(&lowered.definition, &[lowered.includes, op.includes.clone()].concat(), &operators, &self.config.codegen_options())?;

		let kernel = self
			.builder
			.build_and_bind(&generated.source, &self.config.cflags(), op.name.as_str(), &op.name, &signature_of(&lowered))?;

		let depth = generated.history_depth;
		self.cache.lock().insert(
			op.name.clone(),
			CachedKernel {
				kernel: Arc::new(kernel),
				history_depth: depth,
			},
		);
		Ok(depth)
	}
}

fn signature_of(lowered: &xgrid_parse::LoweredFunction) -> Signature {
	match &lowered.definition {
		xgrid_ir::Statement::Definition { signature, .. } => signature.clone(),
		_ => unreachable!("lower_function always returns a Definition statement"),
	}
}

fn operator_signatures(env: &Environment) -> indexmap::IndexMap<RString, Signature> {
	env.operators().map(|(name, handle)| (name.clone(), handle.signature.clone())).collect()
}

/// One argument to [`Context::invoke`]: a plain value, or a grid the runtime
/// must `prepare_for`/`marshal`/`rotate` around the call.
pub enum Argument<'a> {
	Value(HostValue),
	Grid(&'a mut Grid),
}

thread_local! {
	static DEFAULT: RefCell<Option<Rc<Context<Compiler>>>> = RefCell::new(None);
}

/// The ergonomic thread-local default `Context`, built from `Config::default()`
/// on first use and reused afterward. Never relied on inside this crate's
/// own core — only a convenience for callers who don't need to thread an
/// explicit `Context` through their own code.
pub fn default_context() -> Result<Rc<Context<Compiler>>, Error> {
	DEFAULT.with(|cell| {
		if let Some(ctx) = cell.borrow().as_ref() {
			return Ok(Rc::clone(ctx));
		}
		let ctx = Rc::new(Context::new(Config::default())?);
		*cell.borrow_mut() = Some(Rc::clone(&ctx));
		Ok(ctx)
	})
}
