//! Capability surface consumed from an embedding script runtime.
//!
//! gemcut never talks to a concrete interpreter. Everything it needs from the
//! runtime instance it manages (slot storage, protected calls, isolated call
//! contexts, the collector's transient root arena, teardown hooks and guest
//! module definition) is expressed by the [`Host`] trait in this crate.

mod exception;
mod slots;
mod value;

use std::rc::Rc;

pub use exception::{Exception, class};
pub use slots::Slots;
pub use value::Value;

/// Native function callable from guest code.
///
/// Receives the host, the receiver (`self` in guest terms) and the positional
/// arguments.
pub type NativeFn<H> = Rc<dyn Fn(&mut H, &Value, &[Value]) -> Result<Value, Exception>>;

/// Callback run once when the runtime instance is torn down.
pub type TeardownHook<H> = Box<dyn FnOnce(&mut H)>;

/// Accepted argument counts of a native function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
	pub required: usize,
	pub optional: usize,
}

impl Arity {
	pub const NONE: Self = Self::req(0);

	pub const fn req(required: usize) -> Self {
		Self { required, optional: 0 }
	}

	pub const fn opt(optional: usize) -> Self {
		Self { required: 0, optional }
	}

	pub const fn accepts(self, given: usize) -> bool {
		given >= self.required && given <= self.required + self.optional
	}

	/// Builds the guest error raised when `given` arguments do not fit.
	pub fn mismatch(self, given: usize) -> Exception {
		let expected = if self.optional == 0 {
			self.required.to_string()
		} else {
			format!("{}..{}", self.required, self.required + self.optional)
		};
		Exception::new(class::ARGUMENT_ERROR, format!("wrong number of arguments (given {given}, expected {expected})"))
	}
}

/// A runtime instance gemcut can manage gems for.
///
/// Implementations are single threaded; nothing here is `Send`.
pub trait Host: Sized + 'static {
	/// Saved call context returned by [`Host::enter_isolated_context`].
	type Context;
	/// Durable, rooted copy of the transient root arena.
	type ArenaSnapshot;
	/// Compiled unit or source accepted by [`Host::load`].
	type Payload: ?Sized;

	/// Creates a fresh runtime instance with only the core language active.
	fn open() -> Result<Self, Exception>;

	fn slots(&self) -> &Slots;

	fn slots_mut(&mut self) -> &mut Slots;

	/// Runs `body` behind a protected-call boundary.
	///
	/// Guest errors raised by `body` come back as `Err`; panics unwinding out of
	/// `body` are caught and converted to an [`Exception`] as well, so callers
	/// always regain control.
	fn protect<R>(&mut self, body: impl FnOnce(&mut Self) -> Result<R, Exception>) -> Result<R, Exception>;

	/// Switches to a fresh call context with its own frame storage and returns
	/// the context that was active.
	fn enter_isolated_context(&mut self) -> Self::Context;

	/// Reinstates a context saved by [`Host::enter_isolated_context`].
	fn leave_context(&mut self, saved: Self::Context);

	/// Number of entries currently held by the transient root arena.
	fn arena_len(&self) -> usize;

	fn arena_snapshot(&mut self) -> Self::ArenaSnapshot;

	/// Replaces the transient root arena with the snapshot contents.
	fn arena_restore(&mut self, snapshot: Self::ArenaSnapshot);

	/// Registers `hook` to run when the instance is destroyed. Hooks run in
	/// reverse registration order.
	fn at_exit(&mut self, hook: TeardownHook<Self>);

	/// Defines (or reopens) a guest module constant.
	fn define_module(&mut self, name: &str) -> Result<(), Exception>;

	fn define_module_function(&mut self, module: &str, name: &str, arity: Arity, func: NativeFn<Self>) -> Result<(), Exception>;

	/// Removes a guest module constant. Returns whether it existed.
	fn remove_module(&mut self, name: &str) -> bool;

	fn has_module(&self, name: &str) -> bool;

	/// Loads and runs a compiled unit or source string.
	fn load(&mut self, payload: &Self::Payload) -> Result<Value, Exception>;

	/// Runs `body` in a fresh isolated context, restoring the caller's context
	/// afterwards.
	///
	/// `body` must not unwind; wrap fallible guest work in [`Host::protect`].
	fn with_isolated_context<R>(&mut self, body: impl FnOnce(&mut Self) -> R) -> R {
		let saved = self.enter_isolated_context();
		let out = body(self);
		self.leave_context(saved);
		out
	}

	/// Runs `body` with the root arena snapshotted beforehand and restored from
	/// the snapshot afterwards.
	///
	/// `body` must not unwind; wrap fallible guest work in [`Host::protect`].
	fn preserve_arena<R>(&mut self, body: impl FnOnce(&mut Self) -> R) -> R {
		let snapshot = self.arena_snapshot();
		let out = body(self);
		self.arena_restore(snapshot);
		out
	}
}
