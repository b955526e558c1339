use gemcut_host::{Arity, Exception, Value};
use gemcut_vm::Vm;

pub(crate) fn init(vm: &mut Vm) -> Result<(), Exception> {
	// Array#sum comes from mruby-enum-ext.
	vm.eval("[0].sum")?;

	vm.define_method("Array", "compact", Arity::NONE, |vm, recv, _| {
		let items = recv.as_array().unwrap_or_default();
		vm.alloc(Value::array(items.iter().filter(|item| !item.is_nil()).cloned()))
	});
	vm.define_method("Array", "uniq", Arity::NONE, |vm, recv, _| {
		let mut out: Vec<Value> = Vec::new();
		for item in recv.as_array().unwrap_or_default() {
			if !out.contains(item) {
				out.push(item.clone());
			}
		}
		vm.alloc(Value::array(out))
	});
	vm.define_method("Array", "flatten", Arity::NONE, |vm, recv, _| {
		let mut out = Vec::new();
		flatten_into(&mut out, recv.as_array().unwrap_or_default());
		vm.alloc(Value::array(out))
	});
	vm.define_method("Array", "average", Arity::NONE, |vm, recv, _| {
		let len = recv.as_array().unwrap_or_default().len();
		if len == 0 {
			return Ok(Value::Nil);
		}
		let sum = vm.call(recv, "sum", &[])?;
		vm.call(&sum, "/", &[Value::Float(len as f64)])
	});
	Ok(())
}

fn flatten_into(out: &mut Vec<Value>, items: &[Value]) {
	for item in items {
		match item {
			Value::Array(inner) => flatten_into(out, inner),
			other => out.push(other.clone()),
		}
	}
}
