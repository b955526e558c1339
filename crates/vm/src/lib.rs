//! Reference script runtime for gemcut.
//!
//! [`Vm`] is a deliberately small interpreter that implements every
//! capability of [`gemcut_host::Host`]: a transient root arena, isolated call
//! contexts, per-instance slots, protected calls and teardown hooks. It only
//! knows the core language; everything else (`puts`, `Math`, `String#%`, ...)
//! is installed by gem initializers.

mod arena;
mod builtins;
mod config;
mod context;
mod eval;
mod parse;

use std::io::Write as _;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

pub use arena::{Arena, ArenaSnapshot};
pub use builtins::compare;
pub use config::{OutputMode, VmConfig, VmConfigError};
pub use context::{Context, Frame, SavedContext};
use gemcut_host::{Arity, Exception, Host, NativeFn, Slots, TeardownHook, Value, class};
pub use parse::Program;
use rustc_hash::FxHashMap as HashMap;

/// Unit accepted by [`Vm::load`](Host::load).
#[derive(Debug, Clone, PartialEq)]
pub enum Script {
	Source(Rc<str>),
	Compiled(Program),
}

impl From<&str> for Script {
	fn from(source: &str) -> Self {
		Self::Source(source.into())
	}
}

impl From<Program> for Script {
	fn from(program: Program) -> Self {
		Self::Compiled(program)
	}
}

#[derive(Clone)]
struct Method {
	arity: Arity,
	func: NativeFn<Vm>,
}

type MethodTable = HashMap<Rc<str>, Method>;

#[derive(Default)]
struct Module {
	functions: MethodTable,
	constants: HashMap<Rc<str>, Value>,
}

/// Name of the class holding functions callable without a receiver.
pub const OBJECT: &str = "Object";

pub struct Vm {
	config: VmConfig,
	arena: Arena,
	context: Context,
	next_context_id: u64,
	globals: HashMap<Rc<str>, Value>,
	classes: HashMap<Rc<str>, MethodTable>,
	modules: HashMap<Rc<str>, Module>,
	slots: Slots,
	teardown: Vec<TeardownHook<Vm>>,
	output: String,
}

impl std::fmt::Debug for Vm {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Vm")
			.field("config", &self.config)
			.field("arena", &self.arena.len())
			.field("context", &self.context.id())
			.field("modules", &self.modules.len())
			.finish_non_exhaustive()
	}
}

impl Default for Vm {
	fn default() -> Self {
		Self::new(VmConfig::default())
	}
}

impl Vm {
	/// Creates an instance with only the core classes defined.
	pub fn new(config: VmConfig) -> Self {
		let mut vm = Self {
			arena: Arena::new(config.arena_capacity),
			config,
			context: Context::new(0),
			next_context_id: 1,
			globals: HashMap::default(),
			classes: HashMap::default(),
			modules: HashMap::default(),
			slots: Slots::new(),
			teardown: Vec::new(),
			output: String::new(),
		};
		builtins::define(&mut vm);
		vm
	}

	pub fn config(&self) -> &VmConfig {
		&self.config
	}

	pub fn arena(&self) -> &Arena {
		&self.arena
	}

	pub fn context(&self) -> &Context {
		&self.context
	}

	/// Roots a freshly created object in the arena and hands it back.
	pub fn alloc(&mut self, value: Value) -> Result<Value, Exception> {
		self.arena.push(&value)?;
		Ok(value)
	}

	pub fn arena_save(&self) -> usize {
		self.arena.save()
	}

	pub fn arena_restore(&mut self, index: usize) {
		self.arena.restore(index);
	}

	/// Defines an instance method on a core class (`Object`, `String`, ...).
	pub fn define_method<F>(&mut self, class: &str, name: &str, arity: Arity, func: F)
	where
		F: Fn(&mut Vm, &Value, &[Value]) -> Result<Value, Exception> + 'static,
	{
		self.classes.entry(class.into()).or_default().insert(name.into(), Method { arity, func: Rc::new(func) });
	}

	/// Defines a function callable without a receiver.
	pub fn define_function<F>(&mut self, name: &str, arity: Arity, func: F)
	where
		F: Fn(&mut Vm, &Value, &[Value]) -> Result<Value, Exception> + 'static,
	{
		self.define_method(OBJECT, name, arity, func);
	}

	pub fn define_module_constant(&mut self, module: &str, name: &str, value: Value) -> Result<(), Exception> {
		let module = self.modules.get_mut(module).ok_or_else(|| Exception::uninitialized_constant(module))?;
		module.constants.insert(name.into(), value);
		Ok(())
	}

	pub fn respond_to(&self, recv: &Value, name: &str) -> bool {
		self.find_method(recv, name).is_some()
	}

	pub fn gvar_get(&self, name: &str) -> Value {
		self.globals.get(name).cloned().unwrap_or_default()
	}

	pub fn gvar_set(&mut self, name: &str, value: Value) {
		self.globals.insert(name.into(), value);
	}

	/// Calls method `name` on `recv`.
	pub fn call(&mut self, recv: &Value, name: &str, args: &[Value]) -> Result<Value, Exception> {
		let method = self.find_method(recv, name).ok_or_else(|| Exception::no_method(name))?;
		self.invoke(name, &method, recv, args)
	}

	/// Calls a receiverless function such as `puts`.
	pub fn call_function(&mut self, name: &str, args: &[Value]) -> Result<Value, Exception> {
		self.call(&Value::Nil, name, args)
	}

	/// Parses and runs `source`.
	pub fn eval(&mut self, source: &str) -> Result<Value, Exception> {
		let program = Program::parse(source)?;
		self.run(&program)
	}

	/// Runs a parsed program, restoring the arena after every statement.
	pub fn run(&mut self, program: &Program) -> Result<Value, Exception> {
		let ai = self.arena.save();
		let mut last = Value::Nil;
		for stmt in &program.stmts {
			let result = self.eval_expr(stmt);
			self.arena.restore(ai);
			last = result?;
		}
		self.arena.push(&last)?;
		Ok(last)
	}

	pub fn write_output(&mut self, text: &str) {
		match self.config.output {
			OutputMode::Capture => self.output.push_str(text),
			OutputMode::Stdout => {
				if let Err(err) = std::io::stdout().lock().write_all(text.as_bytes()) {
					tracing::warn!(%err, bytes = text.len(), "failed to write guest output");
				}
			}
		}
	}

	pub fn flush_output(&mut self) {
		if self.config.output == OutputMode::Stdout {
			if let Err(err) = std::io::stdout().flush() {
				tracing::warn!(%err, "failed to flush guest output");
			}
		}
	}

	/// Captured guest output so far.
	pub fn output(&self) -> &str {
		&self.output
	}

	pub fn take_output(&mut self) -> String {
		std::mem::take(&mut self.output)
	}

	fn find_method(&self, recv: &Value, name: &str) -> Option<Method> {
		let own = match recv {
			Value::Module(module) => self.modules.get(module).and_then(|m| m.functions.get(name)),
			Value::Nil => None,
			other => self.classes.get(other.class_name()).and_then(|table| table.get(name)),
		};
		own.or_else(|| self.classes.get(OBJECT).and_then(|table| table.get(name))).cloned()
	}

	fn invoke(&mut self, name: &str, method: &Method, recv: &Value, args: &[Value]) -> Result<Value, Exception> {
		if !method.arity.accepts(args.len()) {
			return Err(method.arity.mismatch(args.len()));
		}
		if self.context.depth() >= self.config.max_call_depth {
			return Err(Exception::new(class::SYSTEM_STACK_ERROR, "stack level too deep"));
		}
		self.context.push(name.into());
		let result = (method.func)(self, recv, args);
		self.context.pop();
		result
	}

	fn const_get(&self, name: &str) -> Result<Value, Exception> {
		if self.modules.contains_key(name) {
			Ok(Value::Module(name.into()))
		} else {
			Err(Exception::uninitialized_constant(name))
		}
	}

	fn scoped_const_get(&self, scope: &Value, name: &str) -> Result<Value, Exception> {
		let Value::Module(module) = scope else {
			return Err(Exception::type_error(format!("{} is not a class/module", scope.inspect())));
		};
		self.modules
			.get(module)
			.and_then(|m| m.constants.get(name))
			.cloned()
			.ok_or_else(|| Exception::uninitialized_constant(&format!("{module}::{name}")))
	}

	fn run_teardown(&mut self) {
		if !self.teardown.is_empty() {
			tracing::debug!(hooks = self.teardown.len(), "running teardown hooks");
		}
		while let Some(hook) = self.teardown.pop() {
			hook(self);
		}
		self.flush_output();
	}
}

impl Drop for Vm {
	fn drop(&mut self) {
		self.run_teardown();
	}
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
	if let Some(s) = payload.downcast_ref::<&str>() {
		(*s).to_string()
	} else if let Some(s) = payload.downcast_ref::<String>() {
		s.clone()
	} else {
		"native code panicked".to_string()
	}
}

impl Host for Vm {
	type Context = SavedContext;
	type ArenaSnapshot = ArenaSnapshot;
	type Payload = Script;

	fn open() -> Result<Self, Exception> {
		Ok(Self::default())
	}

	fn slots(&self) -> &Slots {
		&self.slots
	}

	fn slots_mut(&mut self) -> &mut Slots {
		&mut self.slots
	}

	fn protect<R>(&mut self, body: impl FnOnce(&mut Self) -> Result<R, Exception>) -> Result<R, Exception> {
		let depth = self.context.depth();
		let outcome = panic::catch_unwind(AssertUnwindSafe(|| body(self)));
		self.context.truncate(depth);
		match outcome {
			Ok(result) => result,
			Err(payload) => Err(Exception::new(class::FATAL, panic_message(payload.as_ref()))),
		}
	}

	fn enter_isolated_context(&mut self) -> SavedContext {
		let id = self.next_context_id;
		self.next_context_id += 1;
		tracing::trace!(context = id, "entering isolated context");
		SavedContext(std::mem::replace(&mut self.context, Context::new(id)))
	}

	fn leave_context(&mut self, saved: SavedContext) {
		tracing::trace!(from = self.context.id(), to = saved.0.id(), "leaving context");
		self.context = saved.0;
	}

	fn arena_len(&self) -> usize {
		self.arena.len()
	}

	fn arena_snapshot(&mut self) -> ArenaSnapshot {
		self.arena.snapshot()
	}

	fn arena_restore(&mut self, snapshot: ArenaSnapshot) {
		self.arena.rollback(snapshot);
	}

	fn at_exit(&mut self, hook: TeardownHook<Self>) {
		self.teardown.push(hook);
	}

	fn define_module(&mut self, name: &str) -> Result<(), Exception> {
		if !name.starts_with(|c: char| c.is_ascii_uppercase()) {
			return Err(Exception::new(class::NAME_ERROR, format!("wrong constant name {name}")));
		}
		self.modules.entry(name.into()).or_default();
		Ok(())
	}

	fn define_module_function(&mut self, module: &str, name: &str, arity: Arity, func: NativeFn<Self>) -> Result<(), Exception> {
		let module = self.modules.get_mut(module).ok_or_else(|| Exception::uninitialized_constant(module))?;
		module.functions.insert(name.into(), Method { arity, func });
		Ok(())
	}

	fn remove_module(&mut self, name: &str) -> bool {
		self.modules.remove(name).is_some()
	}

	fn has_module(&self, name: &str) -> bool {
		self.modules.contains_key(name)
	}

	fn load(&mut self, payload: &Script) -> Result<Value, Exception> {
		match payload {
			Script::Source(source) => self.eval(source),
			Script::Compiled(program) => self.run(program),
		}
	}
}
