//! Selection and commit behaviour against the reference runtime.

use std::cell::RefCell;
use std::sync::LazyLock;

use gemcut_core::{Catalog, GemDef, Gemcut, GemcutError, Status, noraise};
use gemcut_host::{Arity, Exception, Host, Value, class};
use gemcut_vm::{Script, Vm};
use pretty_assertions::assert_eq;

/// Appends `name` to the guest array in `$trace`.
fn trace(vm: &mut Vm, name: &str) -> Result<(), Exception> {
	let mut items = vm.gvar_get("$trace").as_array().map(<[Value]>::to_vec).unwrap_or_default();
	items.push(vm.alloc(Value::str(name))?);
	let array = vm.alloc(Value::array(items))?;
	vm.gvar_set("$trace", array);
	Ok(())
}

fn traced(vm: &Vm) -> Vec<String> {
	vm.gvar_get("$trace").as_array().unwrap_or_default().iter().map(ToString::to_string).collect()
}

fn init_base(vm: &mut Vm) -> Result<(), Exception> {
	trace(vm, "init base")
}

fn init_mid(vm: &mut Vm) -> Result<(), Exception> {
	trace(vm, "init mid")
}

fn init_app(vm: &mut Vm) -> Result<(), Exception> {
	// re-entrant queries see the gem as installed already
	let installed = CUT.is_committed(vm, Some("app")).map_err(Exception::from)?;
	trace(vm, &format!("init app installed={installed}"))
}

fn init_broken(vm: &mut Vm) -> Result<(), Exception> {
	trace(vm, "init broken")?;
	vm.eval("raise 'broken gem'").map(drop)
}

fn init_leaky(vm: &mut Vm) -> Result<(), Exception> {
	for _ in 0..16 {
		vm.alloc(Value::str("leak"))?;
	}
	Ok(())
}

fn init_nested(vm: &mut Vm) -> Result<(), Exception> {
	let depth = vm.context().depth();
	trace(vm, &format!("init nested depth={depth}"))?;
	CUT.pickup(vm, "base").map_err(Exception::from)
}

thread_local! {
	static FINALIZED: RefCell<Vec<&'static str>> = const { RefCell::new(Vec::new()) };
}

fn finalized() -> Vec<&'static str> {
	FINALIZED.with_borrow(Clone::clone)
}

fn fini_base(_: &mut Vm) -> Result<(), Exception> {
	FINALIZED.with_borrow_mut(|log| log.push("fini base"));
	Ok(())
}

fn fini_app(vm: &mut Vm) -> Result<(), Exception> {
	FINALIZED.with_borrow_mut(|log| log.push("fini app"));
	vm.eval("raise 'finalizer failure'").map(drop)
}

fn fini_mid(_: &mut Vm) -> Result<(), Exception> {
	FINALIZED.with_borrow_mut(|log| log.push("fini mid"));
	Ok(())
}

static CATALOG: LazyLock<&'static Catalog<Vm>> = LazyLock::new(|| {
	Catalog::new([
		GemDef::new("app").init(init_app).fini(fini_app).deps(&["mid", "base"]),
		GemDef::new("mid").init(init_mid).fini(fini_mid).deps(&["base"]),
		GemDef::new("base").init(init_base).fini(fini_base),
		GemDef::new("plain"),
		GemDef::new("broken").init(init_broken).deps(&["base"]),
		GemDef::new("leaky").init(init_leaky),
		GemDef::new("nested").init(init_nested),
		GemDef::new("denied").unavailable(),
		GemDef::new("needs-denied").deps(&["plain", "denied"]),
	])
	.map(Catalog::leak)
	.unwrap_or_else(|err| panic!("test catalog should build: {err}"))
});

static CUT: LazyLock<Gemcut<Vm>> = LazyLock::new(|| Gemcut::new(*CATALOG));

fn setup() -> (Gemcut<Vm>, Vm) {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
	FINALIZED.with_borrow_mut(Vec::clear);
	(*CUT, Vm::default())
}

#[test]
fn dependencies_initialize_first() {
	let (cut, mut vm) = setup();
	cut.pickup(&mut vm, "app").expect("app should be picked up");
	assert_eq!(cut.selected_list(&mut vm).expect("selection"), ["base", "mid", "app"]);

	cut.commit(&mut vm).expect("commit should succeed");
	assert_eq!(cut.committed_list(&mut vm).expect("committed list"), ["base", "mid", "app"]);
	assert_eq!(traced(&vm), ["init base", "init mid", "init app installed=true"]);
}

#[test]
fn second_commit_is_rejected_without_rerunning() {
	let (cut, mut vm) = setup();
	cut.pickup(&mut vm, "mid").expect("pickup");
	cut.commit(&mut vm).expect("first commit");
	let first = cut.committed_list(&mut vm).expect("committed list");

	assert_eq!(cut.commit(&mut vm), Err(GemcutError::AlreadyCommitted));
	assert_eq!(cut.committed_list(&mut vm).expect("committed list"), first);
	assert_eq!(traced(&vm), ["init base", "init mid"]);
}

#[test]
fn pickup_after_commit_is_rejected() {
	let (cut, mut vm) = setup();
	cut.commit(&mut vm).expect("commit");
	assert_eq!(cut.pickup(&mut vm, "base"), Err(GemcutError::AlreadyCommitted));
	assert_eq!(cut.clear(&mut vm), Ok(()));
	assert_eq!(cut.committed_count(&mut vm), Ok(0));
}

#[test]
fn failed_pickup_leaves_selection_untouched() {
	let (cut, mut vm) = setup();
	cut.pickup(&mut vm, "base").expect("pickup");

	assert_eq!(cut.pickup(&mut vm, "nonexistent-gem"), Err(GemcutError::NotFound("nonexistent-gem".into())));
	assert_eq!(cut.pickup(&mut vm, "denied"), Err(GemcutError::Unavailable("denied".into())));
	// "plain" resolves before "denied" fails, and must not stick
	assert_eq!(cut.pickup(&mut vm, "needs-denied"), Err(GemcutError::Unavailable("denied".into())));
	assert_eq!(cut.selected_list(&mut vm).expect("selection"), ["base"]);
}

#[test]
fn pickup_multi_continues_past_failures() {
	let (cut, mut vm) = setup();
	let err = cut.pickup_multi(&mut vm, ["ghost", "plain", "denied", "base"]).expect_err("two names should fail");

	assert_eq!(err.count(), 2);
	assert_eq!(err.first(), &GemcutError::NotFound("ghost".into()));
	assert_eq!(err.iter().nth(1), Some(&GemcutError::Unavailable("denied".into())));
	assert_eq!(cut.selected_list(&mut vm).expect("selection"), ["base", "plain"]);
	assert_eq!(GemcutError::from(err), GemcutError::NotFound("ghost".into()));

	assert_eq!(cut.pickup_multi(&mut vm, Vec::<String>::new()), Ok(()));
}

#[test]
fn clear_restarts_selection() {
	let (cut, mut vm) = setup();
	cut.pickup(&mut vm, "app").expect("pickup");
	cut.clear(&mut vm).expect("clear");
	cut.pickup(&mut vm, "plain").expect("pickup");
	cut.commit(&mut vm).expect("commit");
	assert_eq!(cut.committed_list(&mut vm).expect("committed list"), ["plain"]);
	assert!(traced(&vm).is_empty());
}

#[test]
fn empty_commit_skips_the_sweep() {
	let (cut, mut vm) = setup();
	let before = vm.context().id();
	cut.commit(&mut vm).expect("empty commit");

	assert_eq!(cut.committed_list(&mut vm), Ok(vec![]));
	assert_eq!(cut.is_committed(&mut vm, None), Ok(true));
	assert_eq!(vm.context().id(), before);
	assert!(cut.state(&mut vm).expect("state").installed().is_empty());

	let err = vm.eval("Math.sin 5").expect_err("math was never picked up");
	assert!(err.is(class::NAME_ERROR));
}

#[test]
fn queries_before_commit() {
	let (cut, mut vm) = setup();
	assert_eq!(cut.committed_list(&mut vm), Err(GemcutError::NotYetCommitted));
	assert_eq!(cut.committed_count(&mut vm), Err(GemcutError::NotYetCommitted));
	assert_eq!(cut.is_committed(&mut vm, None), Ok(false));
	assert_eq!(cut.is_committed(&mut vm, Some("base")), Ok(false));
	assert_eq!(noraise::committed_count(cut, &mut vm), -1);
	assert_eq!(noraise::committed_list(cut, &mut vm), None);
	assert!(!noraise::is_committed(cut, &mut vm, None));
	assert_eq!(noraise::selected_list(cut, &mut vm), Some(vec![]));
}

#[test]
fn catalog_wide_queries() {
	let (cut, _) = setup();
	assert_eq!(cut.available_count(), 9);
	assert_eq!(cut.loadable_count(), 8);
	assert!(cut.is_available("plain"));
	assert!(!cut.is_available("denied"));
	assert!(!cut.is_available("ghost"));
	assert!(cut.available_list().contains(&"denied"));
	assert!(!cut.loadable_list().contains(&"denied"));
}

#[test]
fn initializer_failure_keeps_partial_activation() {
	let (cut, mut vm) = setup();
	cut.pickup_multi(&mut vm, ["broken", "leaky"]).expect("pickup");
	let roots = vm.arena_len();

	let err = cut.commit(&mut vm).expect_err("broken initializer should fail");
	let GemcutError::Initializer { gem, error } = &err else {
		panic!("unexpected error {err:?}");
	};
	assert_eq!(gem, "broken");
	assert_eq!(error, &Exception::runtime("broken gem"));
	assert_eq!(err.to_exception(), Exception::runtime("broken gem"));

	// base and broken were installed, leaky never ran
	assert_eq!(cut.committed_list(&mut vm).expect("committed list"), ["base", "broken"]);
	assert_eq!(cut.commit(&mut vm), Err(GemcutError::AlreadyCommitted));
	assert_eq!(vm.arena_len(), roots);
	assert_eq!(vm.context().depth(), 0);
}

#[test]
fn arena_is_restored_after_leaky_initializers() {
	let (cut, mut vm) = setup();
	vm.alloc(Value::str("caller root")).expect("root");
	let before = vm.arena().roots().to_vec();

	cut.pickup(&mut vm, "leaky").expect("pickup");
	cut.commit(&mut vm).expect("commit");
	assert_eq!(vm.arena().roots(), before.as_slice());
}

#[test]
fn initializers_run_in_isolated_context() {
	let (cut, mut vm) = setup();
	vm.define_function("commit_from_guest", Arity::NONE, |vm, _, _| {
		CUT.commit(vm)?;
		Ok(Value::Nil)
	});
	cut.pickup(&mut vm, "nested").expect("pickup");
	let caller = vm.context().id();

	let err = vm.eval("commit_from_guest").expect_err("re-entrant pickup should fail the commit");
	// the guest frame that triggered the commit is not visible to the initializer
	assert_eq!(traced(&vm), ["init nested depth=0"]);
	assert_eq!(err, Exception::runtime("selection already committed"));
	assert_eq!(vm.context().id(), caller);
	assert_eq!(vm.context().depth(), 0);
}

#[test]
fn finalizers_run_in_reverse_and_survive_failures() {
	let (cut, mut vm) = setup();
	cut.pickup_multi(&mut vm, ["app", "plain"]).expect("pickup");
	cut.commit(&mut vm).expect("commit");
	assert!(finalized().is_empty());

	drop(vm);
	assert_eq!(finalized(), ["fini app", "fini mid", "fini base"]);
}

#[test]
fn finalizers_cover_partially_committed_instances() {
	let (cut, mut vm) = setup();
	cut.pickup_multi(&mut vm, ["broken", "mid"]).expect("pickup");
	cut.commit(&mut vm).expect_err("broken initializer should fail");

	// broken was marked installed before its initializer raised
	drop(vm);
	assert_eq!(finalized(), ["fini mid", "fini base"]);
}

#[test]
fn imitation_copies_selection() {
	let (cut, mut src) = setup();
	cut.pickup(&mut src, "mid").expect("pickup");

	let mut dest = Vm::default();
	cut.pickup(&mut dest, "plain").expect("pickup");
	cut.imitate_to(&mut dest, &src).expect("imitate");
	cut.commit(&mut dest).expect("commit");
	assert_eq!(cut.committed_list(&mut dest).expect("committed list"), ["base", "mid", "plain"]);

	assert_eq!(cut.imitate_to(&mut dest, &src), Err(GemcutError::AlreadyCommitted));
	let untouched = Vm::default();
	let mut fresh = Vm::default();
	cut.imitate_to(&mut fresh, &untouched).expect("imitating an untouched instance");
	assert_eq!(cut.selected_list(&mut fresh), Ok(vec![]));
}

#[test]
fn locked_instance_rejects_mutation() {
	let (cut, mut vm) = setup();
	cut.pickup(&mut vm, "base").expect("pickup");
	cut.lock(&mut vm).expect("lock");

	assert_eq!(cut.pickup(&mut vm, "plain"), Err(GemcutError::Locked));
	assert_eq!(cut.clear(&mut vm), Err(GemcutError::Locked));
	assert_eq!(cut.commit(&mut vm), Err(GemcutError::Locked));
	assert_eq!(cut.selected_list(&mut vm).expect("queries still work"), ["base"]);

	cut.seal(&mut vm).expect("seal");
	cut.lock(&mut vm).expect("lock");
	assert_eq!(cut.status(&mut vm), Ok(Status::Sealed));
}

#[test]
fn state_from_another_catalog_is_rejected() {
	let (cut, mut vm) = setup();
	cut.pickup(&mut vm, "base").expect("pickup");

	let other = Gemcut::new(Catalog::<Vm>::new([GemDef::new("base")]).expect("catalog").leak());
	assert_eq!(other.pickup(&mut vm, "base"), Err(GemcutError::CatalogMismatch));
	assert_eq!(other.peek(&vm).map(|state| state.is_some()), Err(GemcutError::CatalogMismatch));
	assert_eq!(noraise::committed_count(other, &mut vm), -1);
}

#[test]
fn open_with_gems_commits_a_fresh_instance() {
	let (cut, mut src) = setup();
	cut.pickup(&mut src, "plain").expect("pickup");

	let mut vm = cut.open_with_gems(Some(&src), ["mid"]).expect("instance should open");
	assert_eq!(cut.committed_list(&mut vm).expect("committed list"), ["base", "mid", "plain"]);

	let err = cut.open_with_gems(None, ["ghost"]).expect_err("unknown gem should fail");
	assert_eq!(err, GemcutError::NotFound("ghost".into()));
	let err = cut.open_with_gems(None, ["broken"]).expect_err("broken gem should fail");
	assert!(matches!(err, GemcutError::Initializer { ref gem, .. } if gem == "broken"));
}

#[test]
fn load_with_gems_commits_unless_the_payload_did() {
	let (cut, _) = setup();

	let mut vm = cut.load_with_gems(None, &Script::from("Gemcut.pickup 'mid'")).expect("payload should load");
	assert_eq!(cut.committed_list(&mut vm).expect("committed list"), ["base", "mid"]);

	let mut vm = cut.load_with_gems(None, &Script::from("Gemcut.pickup 'base'; Gemcut.commit; $after = Gemcut.committed_count")).expect("payload should load");
	assert_eq!(vm.gvar_get("$after"), Value::Int(1));
	assert_eq!(cut.committed_count(&mut vm), Ok(1));

	let err = cut.load_with_gems(None, &Script::from("Gemcut.pickup 'ghost'")).expect_err("payload should raise");
	assert_eq!(err, GemcutError::Host(Exception::load_error("ghost")));
}
