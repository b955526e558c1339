//! The `Gemcut` guest module.

use std::rc::Rc;

use gemcut_host::{Arity, Exception, Host, NativeFn, Value};

use crate::Gemcut;
use crate::error::GemcutError;

/// Constant name of the guest module.
pub const MODULE_NAME: &str = "Gemcut";

type GuestFn<H> = fn(Gemcut<H>, &mut H, &[Value]) -> Result<Value, GemcutError>;

impl<H: Host> Gemcut<H> {
	/// Defines the `Gemcut` guest module on `host`. Allowed once per instance.
	pub fn define_module(self, host: &mut H) -> Result<(), GemcutError> {
		let state = self.state(host)?;
		state.ensure_unsealed()?;
		if state.module_defined {
			return Err(GemcutError::ModuleAlreadyDefined);
		}

		host.define_module(MODULE_NAME)?;
		for (name, arity, func) in guest_functions::<H>() {
			host.define_module_function(MODULE_NAME, name, arity, self.bind(func))?;
		}
		self.state(host)?.module_defined = true;
		tracing::debug!(module = MODULE_NAME, "defined guest module");
		Ok(())
	}

	/// Defines the guest module unless it exists or the instance is sealed.
	/// Returns whether it was defined by this call.
	pub fn ensure_module(self, host: &mut H) -> Result<bool, GemcutError> {
		match self.define_module(host) {
			Ok(()) => Ok(true),
			Err(GemcutError::ModuleAlreadyDefined | GemcutError::Sealed) => Ok(false),
			Err(err) => Err(err),
		}
	}

	fn bind(self, func: GuestFn<H>) -> NativeFn<H> {
		Rc::new(move |host: &mut H, _: &Value, args: &[Value]| -> Result<Value, Exception> {
			self.state(host)?.ensure_unsealed()?;
			func(self, host, args).map_err(Exception::from)
		})
	}
}

fn guest_functions<H: Host>() -> [(&'static str, Arity, GuestFn<H>); 17] {
	[
		("pickup", Arity::req(1), pickup),
		("require", Arity::req(1), pickup),
		("clear", Arity::NONE, |cut, host, _| cut.clear(host).map(|()| Value::Nil)),
		("commit", Arity::NONE, |cut, host, _| cut.commit(host).map(|()| Value::Nil)),
		("committed_list", Arity::NONE, |cut, host, _| cut.committed_list(host).map(Value::from)),
		("committed_count", Arity::NONE, |cut, host, _| cut.committed_count(host).map(Value::from)),
		("committed?", Arity::opt(1), committed_p),
		("available_list", Arity::NONE, |cut, _, _| Ok(cut.available_list().into())),
		("available_count", Arity::NONE, |cut, _, _| Ok(cut.available_count().into())),
		("available?", Arity::req(1), |cut, _, args| Ok(cut.is_available(name_arg(&args[0])?).into())),
		("loadable_list", Arity::NONE, |cut, _, _| Ok(cut.loadable_list().into())),
		("loadable_count", Arity::NONE, |cut, _, _| Ok(cut.loadable_count().into())),
		("loadable?", Arity::req(1), |cut, _, args| Ok(cut.is_available(name_arg(&args[0])?).into())),
		("lock", Arity::NONE, lock),
		("lock!", Arity::NONE, lock),
		("seal", Arity::NONE, seal),
		("seal!", Arity::NONE, seal),
	]
}

fn name_arg(value: &Value) -> Result<&str, GemcutError> {
	value
		.as_str()
		.ok_or_else(|| Exception::type_error(format!("wrong argument type {} (expected String)", value.class_name())).into())
}

/// Returns `false` when the gem was already selected.
fn pickup<H: Host>(cut: Gemcut<H>, host: &mut H, args: &[Value]) -> Result<Value, GemcutError> {
	let name = name_arg(&args[0])?;
	let newly_selected = !cut.is_selected(host, name)?;
	cut.pickup(host, name)?;
	Ok(Value::Bool(newly_selected))
}

fn committed_p<H: Host>(cut: Gemcut<H>, host: &mut H, args: &[Value]) -> Result<Value, GemcutError> {
	let name = match args.first() {
		None | Some(Value::Nil) => None,
		Some(value) => Some(name_arg(value)?),
	};
	cut.is_committed(host, name).map(Value::from)
}

fn lock<H: Host>(cut: Gemcut<H>, host: &mut H, _: &[Value]) -> Result<Value, GemcutError> {
	cut.lock(host).map(|()| Value::Nil)
}

fn seal<H: Host>(cut: Gemcut<H>, host: &mut H, _: &[Value]) -> Result<Value, GemcutError> {
	cut.seal(host).map(|()| Value::Nil)
}

#[cfg(test)]
mod tests;
