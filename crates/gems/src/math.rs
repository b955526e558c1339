use std::f64::consts;
use std::rc::Rc;

use gemcut_host::{Arity, Exception, Host, Value};
use gemcut_vm::Vm;

const MODULE: &str = "Math";
const DOMAIN_ERROR: &str = "Math::DomainError";

type Unary = fn(f64) -> f64;

const UNARY: [(&str, Unary); 12] = [
	("sin", f64::sin),
	("cos", f64::cos),
	("tan", f64::tan),
	("asin", f64::asin),
	("acos", f64::acos),
	("atan", f64::atan),
	("sinh", f64::sinh),
	("cosh", f64::cosh),
	("tanh", f64::tanh),
	("exp", f64::exp),
	("sqrt", f64::sqrt),
	("cbrt", f64::cbrt),
];

pub(crate) fn init(vm: &mut Vm) -> Result<(), Exception> {
	vm.define_module(MODULE)?;
	vm.define_module_constant(MODULE, "PI", Value::Float(consts::PI))?;
	vm.define_module_constant(MODULE, "E", Value::Float(consts::E))?;

	for (name, func) in UNARY {
		vm.define_module_function(
			MODULE,
			name,
			Arity::req(1),
			Rc::new(move |_: &mut Vm, _: &Value, args: &[Value]| {
				let x = float_arg(&args[0])?;
				checked(name, func(x), x.is_nan())
			}),
		)?;
	}
	vm.define_module_function(
		MODULE,
		"log",
		Arity { required: 1, optional: 1 },
		Rc::new(|_: &mut Vm, _: &Value, args: &[Value]| {
			let x = float_arg(&args[0])?;
			let value = match args.get(1) {
				Some(base) => x.ln() / float_arg(base)?.ln(),
				None => x.ln(),
			};
			checked("log", value, x.is_nan())
		}),
	)?;
	for (name, func) in [("log2", f64::log2 as Unary), ("log10", f64::log10)] {
		vm.define_module_function(
			MODULE,
			name,
			Arity::req(1),
			Rc::new(move |_: &mut Vm, _: &Value, args: &[Value]| {
				let x = float_arg(&args[0])?;
				checked(name, func(x), x.is_nan())
			}),
		)?;
	}
	vm.define_module_function(
		MODULE,
		"atan2",
		Arity::req(2),
		Rc::new(|_: &mut Vm, _: &Value, args: &[Value]| Ok(float_arg(&args[0])?.atan2(float_arg(&args[1])?).into())),
	)?;
	vm.define_module_function(
		MODULE,
		"hypot",
		Arity::req(2),
		Rc::new(|_: &mut Vm, _: &Value, args: &[Value]| Ok(float_arg(&args[0])?.hypot(float_arg(&args[1])?).into())),
	)?;
	Ok(())
}

fn float_arg(value: &Value) -> Result<f64, Exception> {
	match value {
		Value::Nil => Err(Exception::type_error("can't convert nil into Float")),
		other => other.as_float().ok_or_else(|| Exception::type_error(format!("can't convert {} into Float", other.class_name()))),
	}
}

/// A NaN produced from a non-NaN argument means the argument was outside the
/// function's domain.
fn checked(name: &str, value: f64, nan_in: bool) -> Result<Value, Exception> {
	if value.is_nan() && !nan_in {
		return Err(Exception::new(DOMAIN_ERROR, format!("Numerical argument is out of domain - \"{name}\"")));
	}
	Ok(Value::Float(value))
}

#[cfg(test)]
mod tests {
	use gemcut_vm::Vm;
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	fn math_vm() -> Vm {
		let mut vm = Vm::default();
		super::init(&mut vm).expect("math gem should initialize");
		vm
	}

	fn eval(vm: &mut Vm, src: &str) -> String {
		match vm.eval(src) {
			Ok(value) => value.inspect(),
			Err(err) => err.to_string(),
		}
	}

	#[rstest]
	#[case("Math.sin 5", "-0.9589242746631385")]
	#[case("Math.cos 0", "1.0")]
	#[case("Math.sqrt 16", "4.0")]
	#[case("Math.cbrt 27", "3.0")]
	#[case("Math.exp 0", "1.0")]
	#[case("Math.log 1", "0.0")]
	#[case("Math.log 8, 2", "3.0")]
	#[case("Math.log10 1000", "3.0")]
	#[case("Math.hypot 3, 4", "5.0")]
	#[case("Math::PI", "3.141592653589793")]
	#[case("Math::E", "2.718281828459045")]
	#[case("Math.sqrt(-1)", "Numerical argument is out of domain - \"sqrt\" (Math::DomainError)")]
	#[case("Math.log(-1)", "Numerical argument is out of domain - \"log\" (Math::DomainError)")]
	#[case("Math.sin 'x'", "can't convert String into Float (TypeError)")]
	#[case("Math.sin nil", "can't convert nil into Float (TypeError)")]
	#[case("Math.sin", "wrong number of arguments (given 0, expected 1) (ArgumentError)")]
	#[case("Math::TAU", "uninitialized constant Math::TAU (NameError)")]
	fn math_functions(#[case] src: &str, #[case] expected: &str) {
		let mut vm = math_vm();
		assert_eq!(eval(&mut vm, src), expected);
	}

	#[test]
	fn reinitializing_reopens_the_module() {
		let mut vm = math_vm();
		super::init(&mut vm).expect("math gem should initialize twice");
		assert_eq!(eval(&mut vm, "Math.sqrt 4"), "2.0");
	}
}
