use gemcut_vm::Vm;
use pretty_assertions::assert_eq;

use super::*;

fn names(catalog: &Catalog<Vm>) -> Vec<&'static str> {
	catalog.iter().map(GemSpec::name).collect()
}

#[test]
fn dependencies_get_lower_ids() {
	let catalog = Catalog::<Vm>::new([
		GemDef::new("app").deps(&["json", "print"]),
		GemDef::new("print"),
		GemDef::new("json").deps(&["string-ext"]),
		GemDef::new("string-ext"),
	])
	.expect("catalog should build");

	assert_eq!(names(&catalog), ["string-ext", "json", "print", "app"]);
	for gem in catalog.iter() {
		assert!(gem.deps().iter().all(|&dep| dep < gem.id()), "{gem:?}");
	}
	let app = catalog.lookup("app").expect("app should be listed");
	let deps: Vec<_> = catalog[app].deps().iter().map(|&id| catalog[id].name()).collect();
	assert_eq!(deps, ["json", "print"]);
}

#[test]
fn independent_gems_keep_declaration_order() {
	let catalog = Catalog::<Vm>::new([GemDef::new("b"), GemDef::new("a"), GemDef::new("c")]).expect("catalog should build");
	assert_eq!(names(&catalog), ["b", "a", "c"]);
	assert_eq!(catalog.lookup("c").map(GemId::index), Some(2));
	assert_eq!(catalog.lookup("C"), None);
}

#[test]
fn rejects_duplicate_names() {
	let err = Catalog::<Vm>::new([GemDef::new("a"), GemDef::new("a")]).expect_err("duplicate should fail");
	assert_eq!(err, CatalogError::DuplicateName("a"));
}

#[test]
fn rejects_unknown_dependencies() {
	let err = Catalog::<Vm>::new([GemDef::new("a").deps(&["ghost"])]).expect_err("unknown dep should fail");
	assert_eq!(err, CatalogError::UnknownDependency { gem: "a", dep: "ghost" });
}

#[test]
fn rejects_self_dependencies() {
	let err = Catalog::<Vm>::new([GemDef::new("a").deps(&["a"])]).expect_err("self dep should fail");
	assert_eq!(err, CatalogError::SelfDependency("a"));
}

#[test]
fn rejects_cycles() {
	let err = Catalog::<Vm>::new([GemDef::new("a").deps(&["b"]), GemDef::new("b").deps(&["c"]), GemDef::new("c").deps(&["a"])])
		.expect_err("cycle should fail");
	assert_eq!(err, CatalogError::Cycle(vec!["a", "b", "c", "a"]));
	assert_eq!(err.to_string(), "dependency cycle: a -> b -> c -> a");
}

#[test]
fn deny_marks_gems_unavailable() {
	let catalog = CatalogBuilder::<Vm>::new()
		.gem(GemDef::new("io"))
		.gem(GemDef::new("print"))
		.gem(GemDef::new("socket").unavailable())
		.deny("io")
		.deny("not-in-catalog")
		.build()
		.expect("catalog should build");

	let available: Vec<_> = catalog.iter().filter(|gem| gem.is_available()).map(GemSpec::name).collect();
	assert_eq!(available, ["print"]);
	assert_eq!(catalog.len(), 3);
}

#[test]
fn empty_catalog_is_valid() {
	let catalog = Catalog::<Vm>::new([]).expect("empty catalog should build");
	assert!(catalog.is_empty());
	assert_eq!(catalog.get(GemId::new(0)).map(GemSpec::name), None);
	assert_eq!(names(&catalog), names(&Catalog::default()));
}
