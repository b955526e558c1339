use std::fmt::{self, Write as _};
use std::rc::Rc;

/// A guest value as seen across the host boundary.
///
/// Strings, arrays and hashes are heap objects; the rest are immediates.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
	#[default]
	Nil,
	Bool(bool),
	Int(i64),
	Float(f64),
	Str(Rc<str>),
	Array(Rc<[Value]>),
	Hash(Rc<[(Value, Value)]>),
	/// Reference to a module constant, by name.
	Module(Rc<str>),
}

impl Value {
	pub fn str(s: impl Into<Rc<str>>) -> Self {
		Self::Str(s.into())
	}

	pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
		Self::Array(items.into_iter().collect())
	}

	pub fn is_nil(&self) -> bool {
		matches!(self, Self::Nil)
	}

	/// Guest truthiness: everything except `nil` and `false`.
	pub fn truthy(&self) -> bool {
		!matches!(self, Self::Nil | Self::Bool(false))
	}

	/// Whether the value is a collectable object that must be rooted.
	pub fn is_heap(&self) -> bool {
		matches!(self, Self::Str(_) | Self::Array(_) | Self::Hash(_))
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Str(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_int(&self) -> Option<i64> {
		match self {
			Self::Int(i) => Some(*i),
			_ => None,
		}
	}

	pub fn as_float(&self) -> Option<f64> {
		match self {
			Self::Float(f) => Some(*f),
			Self::Int(i) => Some(*i as f64),
			_ => None,
		}
	}

	pub fn as_array(&self) -> Option<&[Value]> {
		match self {
			Self::Array(items) => Some(items),
			_ => None,
		}
	}

	/// Name of the guest class the value belongs to.
	pub fn class_name(&self) -> &str {
		match self {
			Self::Nil => "NilClass",
			Self::Bool(true) => "TrueClass",
			Self::Bool(false) => "FalseClass",
			Self::Int(_) => "Integer",
			Self::Float(_) => "Float",
			Self::Str(_) => "String",
			Self::Array(_) => "Array",
			Self::Hash(_) => "Hash",
			Self::Module(_) => "Module",
		}
	}

	/// Guest `inspect` representation.
	pub fn inspect(&self) -> String {
		let mut out = String::new();
		self.write_inspect(&mut out);
		out
	}

	fn write_inspect(&self, out: &mut String) {
		match self {
			Self::Nil => out.push_str("nil"),
			Self::Str(s) => {
				out.push('"');
				for c in s.chars() {
					match c {
						'"' => out.push_str("\\\""),
						'\\' => out.push_str("\\\\"),
						'\n' => out.push_str("\\n"),
						'\t' => out.push_str("\\t"),
						c => out.push(c),
					}
				}
				out.push('"');
			}
			Self::Array(items) => {
				out.push('[');
				for (i, item) in items.iter().enumerate() {
					if i > 0 {
						out.push_str(", ");
					}
					item.write_inspect(out);
				}
				out.push(']');
			}
			Self::Hash(pairs) => {
				out.push('{');
				for (i, (key, value)) in pairs.iter().enumerate() {
					if i > 0 {
						out.push_str(", ");
					}
					key.write_inspect(out);
					out.push_str("=>");
					value.write_inspect(out);
				}
				out.push('}');
			}
			other => {
				let _ = write!(out, "{other}");
			}
		}
	}
}

/// Guest `to_s` representation.
impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Nil => Ok(()),
			Self::Bool(b) => write!(f, "{b}"),
			Self::Int(i) => write!(f, "{i}"),
			Self::Float(x) => write_float(f, *x),
			Self::Str(s) => f.write_str(s),
			Self::Module(name) => f.write_str(name),
			Self::Array(_) | Self::Hash(_) => f.write_str(&self.inspect()),
		}
	}
}

fn write_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
	if x.is_nan() {
		f.write_str("NaN")
	} else if x.is_infinite() {
		f.write_str(if x > 0.0 { "Infinity" } else { "-Infinity" })
	} else if x.fract() == 0.0 && x.abs() < 1e16 {
		write!(f, "{x:.1}")
	} else {
		write!(f, "{x}")
	}
}

impl From<bool> for Value {
	fn from(b: bool) -> Self {
		Self::Bool(b)
	}
}

impl From<i64> for Value {
	fn from(i: i64) -> Self {
		Self::Int(i)
	}
}

impl From<usize> for Value {
	fn from(n: usize) -> Self {
		Self::Int(n as i64)
	}
}

impl From<f64> for Value {
	fn from(x: f64) -> Self {
		Self::Float(x)
	}
}

impl From<&str> for Value {
	fn from(s: &str) -> Self {
		Self::Str(s.into())
	}
}

impl From<String> for Value {
	fn from(s: String) -> Self {
		Self::Str(s.into())
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(v: Option<T>) -> Self {
		v.map_or(Self::Nil, Into::into)
	}
}

impl<T: Into<Value>> From<Vec<T>> for Value {
	fn from(items: Vec<T>) -> Self {
		Self::Array(items.into_iter().map(Into::into).collect())
	}
}
