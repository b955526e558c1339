//! Core classes every instance starts with.
//!
//! Kept to what the language itself needs; output, formatting and math live
//! in gems.

use std::cmp::Ordering;

use gemcut_host::{Arity, Exception, Value, class};

use crate::{OBJECT, Vm};

pub(crate) fn define(vm: &mut Vm) {
	define_object(vm);
	define_numeric(vm);
	define_string(vm);
	define_array(vm);
}

fn define_object(vm: &mut Vm) {
	vm.define_method(OBJECT, "raise", Arity::opt(1), |_, _, args| {
		Err(match args.first() {
			Some(Value::Str(message)) => Exception::runtime(message.as_ref()),
			Some(other) => Exception::type_error(format!("exception class/object expected, got {}", other.inspect())),
			None => Exception::runtime("unhandled exception"),
		})
	});
	vm.define_method(OBJECT, "inspect", Arity::NONE, |vm, recv, _| vm.alloc(Value::str(recv.inspect())));
	vm.define_method(OBJECT, "to_s", Arity::NONE, |vm, recv, _| match recv {
		Value::Str(_) => Ok(recv.clone()),
		other => vm.alloc(Value::str(other.to_string())),
	});
	vm.define_method(OBJECT, "nil?", Arity::NONE, |_, recv, _| Ok(recv.is_nil().into()));
	vm.define_method(OBJECT, "class", Arity::NONE, |vm, recv, _| vm.alloc(Value::str(recv.class_name())));
	vm.define_method(OBJECT, "respond_to?", Arity::req(1), |vm, recv, args| {
		let name = symbol_arg(&args[0])?;
		Ok(vm.respond_to(recv, name).into())
	});
}

fn define_numeric(vm: &mut Vm) {
	for class in ["Integer", "Float"] {
		vm.define_method(class, "+", Arity::req(1), |_, recv, args| arith(recv, &args[0], '+'));
		vm.define_method(class, "-", Arity::req(1), |_, recv, args| arith(recv, &args[0], '-'));
		vm.define_method(class, "*", Arity::req(1), |_, recv, args| arith(recv, &args[0], '*'));
		vm.define_method(class, "/", Arity::req(1), |_, recv, args| arith(recv, &args[0], '/'));
		vm.define_method(class, "%", Arity::req(1), |_, recv, args| arith(recv, &args[0], '%'));
		vm.define_method(class, "to_f", Arity::NONE, |_, recv, _| Ok(recv.as_float().unwrap_or_default().into()));
		vm.define_method(class, "to_i", Arity::NONE, |_, recv, _| match recv {
			Value::Float(x) if !x.is_finite() => Err(Exception::new("FloatDomainError", x.to_string())),
			Value::Float(x) => Ok(Value::Int(x.trunc() as i64)),
			other => Ok(other.clone()),
		});
	}
}

fn define_string(vm: &mut Vm) {
	vm.define_method("String", "+", Arity::req(1), |vm, recv, args| {
		let (Some(lhs), Some(rhs)) = (recv.as_str(), args[0].as_str()) else {
			return Err(Exception::type_error(format!("no implicit conversion of {} into String", args[0].class_name())));
		};
		vm.alloc(Value::str(format!("{lhs}{rhs}")))
	});
	for name in ["size", "length"] {
		vm.define_method("String", name, Arity::NONE, |_, recv, _| Ok(recv.as_str().map_or(0, |s| s.chars().count()).into()));
	}
}

fn define_array(vm: &mut Vm) {
	vm.define_method("Array", "sort", Arity::NONE, |vm, recv, _| {
		let mut items = recv.as_array().unwrap_or_default().to_vec();
		if let Some((first, rest)) = items.split_first()
			&& let Some(other) = rest.iter().find(|item| compare(first, item).is_none())
		{
			return Err(Exception::new(class::ARGUMENT_ERROR, format!("comparison of {} with {} failed", first.class_name(), other.class_name())));
		}
		items.sort_by(|a, b| compare(a, b).unwrap_or(Ordering::Equal));
		vm.alloc(Value::array(items))
	});
	for name in ["size", "length"] {
		vm.define_method("Array", name, Arity::NONE, |_, recv, _| Ok(recv.as_array().unwrap_or_default().len().into()));
	}
	vm.define_method("Array", "include?", Arity::req(1), |_, recv, args| Ok(recv.as_array().unwrap_or_default().contains(&args[0]).into()));
	vm.define_method("Array", "first", Arity::NONE, |_, recv, _| Ok(recv.as_array().and_then(<[Value]>::first).cloned().unwrap_or_default()));
	vm.define_method("Array", "last", Arity::NONE, |_, recv, _| Ok(recv.as_array().and_then(<[Value]>::last).cloned().unwrap_or_default()));
}

/// Accepts a method name given as a string.
fn symbol_arg(value: &Value) -> Result<&str, Exception> {
	value.as_str().ok_or_else(|| Exception::type_error(format!("{} is not a symbol nor a string", value.inspect())))
}

/// Orders two values of comparable classes.
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
	match (a, b) {
		(Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
		(Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
		_ => a.as_float().zip(b.as_float()).and_then(|(a, b)| a.partial_cmp(&b)),
	}
}

fn arith(lhs: &Value, rhs: &Value, op: char) -> Result<Value, Exception> {
	match (lhs, rhs) {
		(Value::Int(a), Value::Int(b)) => int_arith(*a, *b, op),
		_ => {
			let (Some(a), Some(b)) = (lhs.as_float(), rhs.as_float()) else {
				return Err(Exception::type_error(format!("{} can't be coerced into {}", rhs.class_name(), lhs.class_name())));
			};
			Ok(Value::Float(float_arith(a, b, op)))
		}
	}
}

/// Integer arithmetic with floored division; overflow degrades to float.
fn int_arith(a: i64, b: i64, op: char) -> Result<Value, Exception> {
	if matches!(op, '/' | '%') && b == 0 {
		return Err(Exception::new(class::ZERO_DIVISION_ERROR, "divided by 0"));
	}
	let exact = match op {
		'+' => a.checked_add(b),
		'-' => a.checked_sub(b),
		'*' => a.checked_mul(b),
		'/' => a.checked_div(b).map(|q| if (a % b != 0) && ((a < 0) != (b < 0)) { q - 1 } else { q }),
		_ => a.checked_rem(b).map(|r| if r != 0 && ((r < 0) != (b < 0)) { r + b } else { r }),
	};
	Ok(match exact {
		Some(n) => Value::Int(n),
		None => Value::Float(float_arith(a as f64, b as f64, op)),
	})
}

fn float_arith(a: f64, b: f64, op: char) -> f64 {
	match op {
		'+' => a + b,
		'-' => a - b,
		'*' => a * b,
		'/' => a / b,
		_ => {
			let r = a % b;
			if r != 0.0 && ((r < 0.0) != (b < 0.0)) { r + b } else { r }
		}
	}
}
