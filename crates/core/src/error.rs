//! Error types for gem selection, activation and configuration.

use std::path::PathBuf;

use gemcut_host::Exception;
use thiserror::Error;

/// Errors reported by the selection and activation protocol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GemcutError {
	/// The name is not in the catalog.
	#[error("gem not found: {0}")]
	NotFound(String),

	/// The gem is listed but denied by the build configuration.
	#[error("gem unavailable: {0}")]
	Unavailable(String),

	#[error("selection already committed")]
	AlreadyCommitted,

	#[error("selection not yet committed")]
	NotYetCommitted,

	#[error("guest module already defined")]
	ModuleAlreadyDefined,

	/// Selection and activation were locked from guest code.
	#[error("currently feature is locked")]
	Locked,

	/// Everything was sealed from guest code.
	#[error("currently feature is sealed")]
	Sealed,

	/// Dependency resolution reached a gem that is still being resolved.
	/// Catalogs from [`CatalogBuilder::build`](crate::CatalogBuilder::build)
	/// reject cycles up front, so only a catalog assembled some other way
	/// can produce this.
	#[error("dependency cycle through gem {0}")]
	DependencyCycle(String),

	/// The instance already carries state created by a different catalog.
	#[error("instance state belongs to a different catalog")]
	CatalogMismatch,

	/// A gem initializer raised. `error` is the original guest error.
	#[error("initializer of gem {gem} failed: {error}")]
	Initializer {
		gem: String,
		error: Exception,
	},

	/// The host runtime raised outside of any initializer.
	#[error(transparent)]
	Host(#[from] Exception),
}

impl GemcutError {
	/// Converts the error into the exception raised to guest callers.
	///
	/// Initializer and host failures hand back the original exception.
	pub fn to_exception(&self) -> Exception {
		match self {
			Self::NotFound(name) | Self::Unavailable(name) => Exception::load_error(name),
			Self::Locked | Self::Sealed => Exception::security(self.to_string()),
			Self::Initializer { error, .. } | Self::Host(error) => error.clone(),
			other => Exception::runtime(other.to_string()),
		}
	}
}

impl From<GemcutError> for Exception {
	fn from(err: GemcutError) -> Self {
		err.to_exception()
	}
}

/// Every failure collected by [`Gemcut::pickup_multi`](crate::Gemcut::pickup_multi).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} of the requested gems could not be picked up, first: {first}", .rest.len() + 1)]
pub struct PickupFailures {
	first: GemcutError,
	rest: Vec<GemcutError>,
}

impl PickupFailures {
	/// Wraps the collected failures; `None` when nothing failed.
	pub(crate) fn collect(failures: Vec<GemcutError>) -> Option<Self> {
		let mut failures = failures.into_iter();
		let first = failures.next()?;
		Some(Self { first, rest: failures.collect() })
	}

	pub fn first(&self) -> &GemcutError {
		&self.first
	}

	/// Number of names that failed.
	pub fn count(&self) -> usize {
		self.rest.len() + 1
	}

	pub fn iter(&self) -> impl Iterator<Item = &GemcutError> {
		std::iter::once(&self.first).chain(&self.rest)
	}
}

/// Collapses to the first failure.
impl From<PickupFailures> for GemcutError {
	fn from(failures: PickupFailures) -> Self {
		failures.first
	}
}

/// Errors raised while building a catalog from gem definitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
	#[error("duplicate gem name: {0}")]
	DuplicateName(&'static str),

	#[error("gem {gem} depends on unknown gem {dep}")]
	UnknownDependency {
		gem: &'static str,
		dep: &'static str,
	},

	#[error("gem {0} depends on itself")]
	SelfDependency(&'static str),

	/// The dependency graph is not acyclic. Lists the gems along the cycle.
	#[error("dependency cycle: {}", .0.join(" -> "))]
	Cycle(Vec<&'static str>),

	#[error("catalog holds {0} gems, more than a gem id can address")]
	TooLarge(usize),
}

/// Errors that can occur when loading gemcut configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	#[error(transparent)]
	Catalog(#[from] CatalogError),
}
