use gemcut_host::{Arity, Exception, Value};
use gemcut_vm::Vm;

const ANY: Arity = Arity::opt(usize::MAX);

pub(crate) fn init(vm: &mut Vm) -> Result<(), Exception> {
	vm.define_function("puts", ANY, |vm, _, args| {
		let mut out = String::new();
		if args.is_empty() {
			out.push('\n');
		}
		for arg in args {
			write_line(&mut out, arg);
		}
		vm.write_output(&out);
		Ok(Value::Nil)
	});
	vm.define_function("print", ANY, |vm, _, args| {
		let out: String = args.iter().map(ToString::to_string).collect();
		vm.write_output(&out);
		Ok(Value::Nil)
	});
	vm.define_function("p", ANY, |vm, _, args| {
		let mut out = String::new();
		for arg in args {
			out.push_str(&arg.inspect());
			out.push('\n');
		}
		vm.write_output(&out);
		Ok(match args {
			[] => Value::Nil,
			[one] => one.clone(),
			many => vm.alloc(Value::array(many.iter().cloned()))?,
		})
	});
	Ok(())
}

pub(crate) fn fini(vm: &mut Vm) -> Result<(), Exception> {
	tracing::trace!("flushing guest output");
	vm.flush_output();
	Ok(())
}

/// `puts` flattens arrays one element per line and never doubles a trailing
/// newline.
fn write_line(out: &mut String, value: &Value) {
	match value {
		Value::Array(items) if items.is_empty() => out.push('\n'),
		Value::Array(items) => items.iter().for_each(|item| write_line(out, item)),
		other => {
			let text = other.to_string();
			out.push_str(&text);
			if !text.ends_with('\n') {
				out.push('\n');
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	use super::*;

	#[rstest]
	#[case(Value::str("a"), "a\n")]
	#[case(Value::str("a\n"), "a\n")]
	#[case(Value::Nil, "\n")]
	#[case(Value::array([]), "\n")]
	#[case(Value::array([Value::Int(1), Value::array([Value::str("x")])]), "1\nx\n")]
	#[case(Value::Float(2.0), "2.0\n")]
	fn puts_lines(#[case] value: Value, #[case] expected: &str) {
		let mut out = String::new();
		write_line(&mut out, &value);
		assert_eq!(out, expected);
	}
}
