use std::cmp::Ordering;

use gemcut_host::{Arity, Exception, Value, class};
use gemcut_vm::{Vm, compare};

pub(crate) fn init(vm: &mut Vm) -> Result<(), Exception> {
	vm.define_method("Array", "sum", Arity::opt(1), |vm, recv, args| {
		let mut acc = args.first().cloned().unwrap_or(Value::Int(0));
		for item in recv.as_array().unwrap_or_default() {
			acc = vm.call(&acc, "+", std::slice::from_ref(item))?;
		}
		Ok(acc)
	});
	vm.define_method("Array", "min", Arity::NONE, |_, recv, _| extreme(recv, Ordering::Less));
	vm.define_method("Array", "max", Arity::NONE, |_, recv, _| extreme(recv, Ordering::Greater));
	vm.define_method("Array", "count", Arity::opt(1), |_, recv, args| {
		let items = recv.as_array().unwrap_or_default();
		let count = match args.first() {
			Some(needle) => items.iter().filter(|item| *item == needle).count(),
			None => items.len(),
		};
		Ok(count.into())
	});
	Ok(())
}

/// Finds the element that orders `wanted` against every other one.
fn extreme(recv: &Value, wanted: Ordering) -> Result<Value, Exception> {
	let items = recv.as_array().unwrap_or_default();
	let Some((first, rest)) = items.split_first() else {
		return Ok(Value::Nil);
	};
	let mut best = first;
	for item in rest {
		match compare(item, best) {
			Some(ord) if ord == wanted => best = item,
			Some(_) => {}
			None => return Err(Exception::new(class::ARGUMENT_ERROR, format!("comparison of {} with {} failed", item.class_name(), best.class_name()))),
		}
	}
	Ok(best.clone())
}
