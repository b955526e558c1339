use std::borrow::Cow;

/// Well-known guest exception class names.
pub mod class {
	pub const ARGUMENT_ERROR: &str = "ArgumentError";
	pub const FATAL: &str = "fatal";
	pub const LOAD_ERROR: &str = "LoadError";
	pub const NAME_ERROR: &str = "NameError";
	pub const NO_MEMORY_ERROR: &str = "NoMemoryError";
	pub const NO_METHOD_ERROR: &str = "NoMethodError";
	pub const RANGE_ERROR: &str = "RangeError";
	pub const RUNTIME_ERROR: &str = "RuntimeError";
	pub const SECURITY_ERROR: &str = "SecurityError";
	pub const SYNTAX_ERROR: &str = "SyntaxError";
	pub const SYSTEM_STACK_ERROR: &str = "SystemStackError";
	pub const TYPE_ERROR: &str = "TypeError";
	pub const ZERO_DIVISION_ERROR: &str = "ZeroDivisionError";
}

/// A raised guest error object.
///
/// Displays the way the guest inspects exceptions: `message (Class)`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} ({class})")]
pub struct Exception {
	class: Cow<'static, str>,
	message: String,
}

impl Exception {
	pub fn new(class: impl Into<Cow<'static, str>>, message: impl Into<String>) -> Self {
		Self {
			class: class.into(),
			message: message.into(),
		}
	}

	pub fn runtime(message: impl Into<String>) -> Self {
		Self::new(class::RUNTIME_ERROR, message)
	}

	/// `LoadError` raised for a feature that cannot be activated.
	pub fn load_error(name: &str) -> Self {
		Self::new(class::LOAD_ERROR, format!("cannot load such file - {name}"))
	}

	pub fn no_method(name: &str) -> Self {
		Self::new(class::NO_METHOD_ERROR, format!("undefined method '{name}'"))
	}

	pub fn uninitialized_constant(name: &str) -> Self {
		Self::new(class::NAME_ERROR, format!("uninitialized constant {name}"))
	}

	pub fn type_error(message: impl Into<String>) -> Self {
		Self::new(class::TYPE_ERROR, message)
	}

	pub fn security(message: impl Into<String>) -> Self {
		Self::new(class::SECURITY_ERROR, message)
	}

	pub fn class(&self) -> &str {
		&self.class
	}

	pub fn message(&self) -> &str {
		&self.message
	}

	pub fn is(&self, class: &str) -> bool {
		self.class == class
	}
}
