use gemcut_host::{Arity, Exception, Value};
use gemcut_vm::Vm;

type Transform = fn(&str) -> String;

const TRANSFORMS: [(&str, Transform); 7] = [
	("upcase", str::to_uppercase),
	("downcase", str::to_lowercase),
	("capitalize", capitalize),
	("swapcase", swapcase),
	("reverse", reverse),
	("strip", strip),
	("chomp", chomp),
];

pub(crate) fn init(vm: &mut Vm) -> Result<(), Exception> {
	for (name, transform) in TRANSFORMS {
		vm.define_method("String", name, Arity::NONE, move |vm, recv, _| vm.alloc(Value::str(transform(recv.as_str().unwrap_or_default()))));
	}
	vm.define_method("String", "start_with?", Arity::req(1), |_, recv, args| {
		Ok(recv.as_str().unwrap_or_default().starts_with(string_arg(&args[0])?).into())
	});
	vm.define_method("String", "end_with?", Arity::req(1), |_, recv, args| {
		Ok(recv.as_str().unwrap_or_default().ends_with(string_arg(&args[0])?).into())
	});
	vm.define_method("String", "include?", Arity::req(1), |_, recv, args| {
		Ok(recv.as_str().unwrap_or_default().contains(string_arg(&args[0])?).into())
	});
	Ok(())
}

fn string_arg(value: &Value) -> Result<&str, Exception> {
	value.as_str().ok_or_else(|| Exception::type_error(format!("no implicit conversion of {} into String", value.class_name())))
}

fn capitalize(s: &str) -> String {
	let mut chars = s.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
		None => String::new(),
	}
}

fn reverse(s: &str) -> String {
	s.chars().rev().collect()
}

fn strip(s: &str) -> String {
	s.trim().to_string()
}

/// Drops one trailing line terminator.
fn chomp(s: &str) -> String {
	let s = s.strip_suffix('\n').map_or(s, |s| s.strip_suffix('\r').unwrap_or(s));
	s.to_string()
}

fn swapcase(s: &str) -> String {
	s.chars()
		.flat_map(|c| -> Box<dyn Iterator<Item = char>> {
			if c.is_uppercase() {
				Box::new(c.to_lowercase())
			} else {
				Box::new(c.to_uppercase())
			}
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use gemcut_vm::Vm;
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	#[rstest]
	#[case("'abc'.upcase", r#""ABC""#)]
	#[case("'ABC'.downcase", r#""abc""#)]
	#[case("'hELLO'.capitalize", r#""Hello""#)]
	#[case("'aBc'.swapcase", r#""AbC""#)]
	#[case("'abc'.reverse", r#""cba""#)]
	#[case("'  x '.strip", r#""x""#)]
	#[case("\"x\\n\".chomp", r#""x""#)]
	#[case("'x'.chomp", r#""x""#)]
	#[case("''.capitalize", r#""""#)]
	#[case("'mruby-print'.start_with? 'mruby-'", "true")]
	#[case("'mruby-print'.end_with? 'math'", "false")]
	#[case("'mruby-print'.include? 'by-p'", "true")]
	#[case("'x'.start_with? 1", "no implicit conversion of Integer into String (TypeError)")]
	fn string_methods(#[case] src: &str, #[case] expected: &str) {
		let mut vm = Vm::default();
		super::init(&mut vm).expect("string-ext should initialize");
		let out = match vm.eval(src) {
			Ok(value) => value.inspect(),
			Err(err) => err.to_string(),
		};
		assert_eq!(out, expected);
	}
}
