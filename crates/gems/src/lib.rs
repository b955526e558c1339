//! Builtin gems for the reference runtime.
//!
//! Every gem here is compiled in but inert until a runtime instance picks it
//! up and commits through [`gemcut()`]. `mruby-io` is listed for
//! completeness and denied at build time.

mod array_ext;
mod enum_ext;
mod math;
mod print;
mod sprintf;
mod string_ext;

use std::sync::LazyLock;

use gemcut_core::{Catalog, CatalogBuilder, GemDef, Gemcut};
use gemcut_host::Exception;
use gemcut_vm::Vm;

pub use crate::sprintf::format;

/// Gems the reference build knows about, in declaration order.
pub const GEMS: [GemDef<Vm>; 8] = [
	GemDef::new("mruby-print").init(print::init).fini(print::fini),
	GemDef::new("mruby-sprintf").init(sprintf::init),
	GemDef::new("mruby-math").init(math::init),
	GemDef::new("mruby-string-ext").init(string_ext::init),
	GemDef::new("mruby-enum-ext").init(enum_ext::init),
	GemDef::new("mruby-array-ext").init(array_ext::init).deps(&["mruby-enum-ext"]),
	GemDef::new("mruby-gemcut").init(init_gemcut),
	GemDef::new("mruby-io"),
];

/// Gems compiled in but never activatable.
pub const DENIED: [&str; 1] = ["mruby-io"];

static CATALOG: LazyLock<&'static Catalog<Vm>> = LazyLock::new(|| {
	let builder = DENIED.into_iter().fold(CatalogBuilder::new().gems(GEMS), |builder, name| builder.deny(name));
	let catalog = builder.build().unwrap_or_else(|err| {
		tracing::error!(%err, "builtin gem catalog rejected");
		Catalog::default()
	});
	catalog.leak()
});

/// The process-wide builtin catalog.
pub fn catalog() -> &'static Catalog<Vm> {
	*CATALOG
}

/// Gemcut handle bound to [`catalog()`].
pub fn gemcut() -> Gemcut<Vm> {
	Gemcut::new(catalog())
}

/// Exposes the `Gemcut` guest module to the instance being committed.
fn init_gemcut(vm: &mut Vm) -> Result<(), Exception> {
	let defined = gemcut().ensure_module(vm)?;
	tracing::trace!(defined, "gemcut module requested by gem");
	Ok(())
}
