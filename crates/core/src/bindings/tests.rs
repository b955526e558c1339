use gemcut_host::class;
use gemcut_vm::Vm;
use pretty_assertions::assert_eq;
use rstest::rstest;

use super::*;
use crate::{Catalog, GemDef, Status};

fn define_hello(vm: &mut Vm) -> Result<(), Exception> {
	vm.define_function("hello", Arity::NONE, |vm, _, _| vm.alloc(Value::str("hi")));
	Ok(())
}

fn cut() -> Gemcut<Vm> {
	let catalog = Catalog::new([
		GemDef::new("hello").init(define_hello),
		GemDef::new("greeter").deps(&["hello"]),
		GemDef::new("denied").unavailable(),
	])
	.expect("catalog should build");
	Gemcut::new(catalog.leak())
}

fn vm_with_module(cut: Gemcut<Vm>) -> Vm {
	let mut vm = Vm::default();
	cut.define_module(&mut vm).expect("module should be defined");
	vm
}

fn eval(vm: &mut Vm, src: &str) -> String {
	match vm.eval(src) {
		Ok(value) => value.inspect(),
		Err(err) => err.to_string(),
	}
}

#[test]
fn module_is_defined_once() {
	let cut = cut();
	let mut vm = vm_with_module(cut);
	assert!(vm.has_module(MODULE_NAME));
	assert_eq!(cut.define_module(&mut vm), Err(GemcutError::ModuleAlreadyDefined));
	assert_eq!(cut.ensure_module(&mut vm), Ok(false));
}

#[test]
fn guest_pickup_and_commit() {
	let cut = cut();
	let mut vm = vm_with_module(cut);

	assert_eq!(eval(&mut vm, "Gemcut.committed?"), "false");
	assert_eq!(eval(&mut vm, "Gemcut.require 'greeter'"), "true");
	assert_eq!(eval(&mut vm, "Gemcut.require 'greeter'"), "false");
	assert_eq!(eval(&mut vm, "Gemcut.pickup 'hello'"), "false");
	assert_eq!(eval(&mut vm, "Gemcut.committed_list"), "selection not yet committed (RuntimeError)");
	assert_eq!(eval(&mut vm, "Gemcut.commit"), "nil");
	assert_eq!(eval(&mut vm, "Gemcut.committed_list"), r#"["hello", "greeter"]"#);
	assert_eq!(eval(&mut vm, "Gemcut.committed_count"), "2");
	assert_eq!(eval(&mut vm, "Gemcut.committed?"), "true");
	assert_eq!(eval(&mut vm, "Gemcut.committed?('hello')"), "true");
	assert_eq!(eval(&mut vm, "hello"), r#""hi""#);
	assert_eq!(eval(&mut vm, "Gemcut.commit"), "selection already committed (RuntimeError)");
}

#[rstest]
#[case("Gemcut.pickup 'nope'", "cannot load such file - nope (LoadError)")]
#[case("Gemcut.pickup 'denied'", "cannot load such file - denied (LoadError)")]
#[case("Gemcut.pickup 1", "wrong argument type Integer (expected String) (TypeError)")]
#[case("Gemcut.pickup", "wrong number of arguments (given 0, expected 1) (ArgumentError)")]
#[case("Gemcut.available?('denied')", "false")]
#[case("Gemcut.available?('hello')", "true")]
#[case("Gemcut.available_list", r#"["hello", "greeter", "denied"]"#)]
#[case("Gemcut.available_count", "3")]
#[case("Gemcut.loadable_list", r#"["hello", "greeter"]"#)]
#[case("Gemcut.loadable_count", "2")]
#[case("Gemcut.loadable?('hello')", "true")]
#[case("Gemcut.loadable?('denied')", "false")]
#[case("Gemcut.loadable?('nope')", "false")]
#[case("Gemcut.loadable? 1", "wrong argument type Integer (expected String) (TypeError)")]
#[case("Gemcut.committed?(nil)", "false")]
fn guest_queries(#[case] src: &str, #[case] expected: &str) {
	let mut vm = vm_with_module(cut());
	assert_eq!(eval(&mut vm, src), expected);
}

#[test]
fn guest_pickup_reports_fresh_selection() {
	let cut = cut();
	let mut vm = vm_with_module(cut);

	assert_eq!(eval(&mut vm, "Gemcut.pickup 'hello'"), "true");
	assert_eq!(eval(&mut vm, "Gemcut.pickup 'greeter'"), "true");
	assert_eq!(eval(&mut vm, "Gemcut.pickup 'hello'"), "false");
	assert_eq!(cut.is_selected(&mut vm, "greeter"), Ok(true));
	assert_eq!(cut.is_selected(&mut vm, "denied"), Ok(false));
	eval(&mut vm, "Gemcut.clear");
	assert_eq!(eval(&mut vm, "Gemcut.require 'hello'"), "true");
}

#[test]
fn lock_blocks_selection_but_not_queries() {
	let cut = cut();
	let mut vm = vm_with_module(cut);
	eval(&mut vm, "Gemcut.lock!");

	assert_eq!(cut.status(&mut vm), Ok(Status::Locked));
	assert_eq!(eval(&mut vm, "Gemcut.pickup 'hello'"), "currently feature is locked (SecurityError)");
	assert_eq!(eval(&mut vm, "Gemcut.commit"), "currently feature is locked (SecurityError)");
	assert_eq!(eval(&mut vm, "Gemcut.available_count"), "3");
}

#[test]
fn seal_removes_the_module() {
	let cut = cut();
	let mut vm = vm_with_module(cut);
	eval(&mut vm, "Gemcut.seal");

	assert_eq!(cut.status(&mut vm), Ok(Status::Sealed));
	assert!(!vm.has_module(MODULE_NAME));
	assert_eq!(eval(&mut vm, "Gemcut"), "uninitialized constant Gemcut (NameError)");
	assert_eq!(cut.define_module(&mut vm), Err(GemcutError::Sealed));
	assert_eq!(cut.ensure_module(&mut vm), Ok(false));
	assert_eq!(cut.pickup(&mut vm, "hello"), Err(GemcutError::Sealed));
}

#[test]
fn sealed_functions_raise_security_error() {
	let cut = cut();
	let mut vm = vm_with_module(cut);
	cut.state(&mut vm).expect("state").status = Status::Sealed;

	let err = vm.eval("Gemcut.available_count").expect_err("sealed call should raise");
	assert!(err.is(class::SECURITY_ERROR));
	assert_eq!(err.message(), "currently feature is sealed");
}
