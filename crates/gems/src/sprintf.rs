//! `format`, `sprintf` and `String#%`.

use std::fmt::Write as _;
use std::iter::Peekable;
use std::str::Chars;

use gemcut_host::{Arity, Exception, Value, class};
use gemcut_vm::Vm;

pub(crate) fn init(vm: &mut Vm) -> Result<(), Exception> {
	for name in ["format", "sprintf"] {
		vm.define_function(name, Arity { required: 1, optional: usize::MAX - 1 }, |vm, _, args| {
			let fmt = args[0].as_str().ok_or_else(|| Exception::type_error(format!("no implicit conversion of {} into String", args[0].class_name())))?;
			let out = format(fmt, &args[1..])?;
			vm.alloc(Value::str(out))
		});
	}
	vm.define_method("String", "%", Arity::req(1), |vm, recv, args| {
		let fmt = recv.as_str().unwrap_or_default();
		let out = match &args[0] {
			Value::Array(items) => format(fmt, items)?,
			other => format(fmt, std::slice::from_ref(other))?,
		};
		vm.alloc(Value::str(out))
	});
	Ok(())
}

#[derive(Debug, Default, Clone, Copy)]
struct Spec {
	left: bool,
	plus: bool,
	space: bool,
	zero: bool,
	alt: bool,
	width: usize,
	precision: Option<usize>,
}

/// Formats `args` according to the directives in `fmt`.
///
/// Supports the `-+ 0#` flags, width, precision and the `s p d i u f e g x X
/// o b c %` conversions.
pub fn format(fmt: &str, args: &[Value]) -> Result<String, Exception> {
	let mut out = String::with_capacity(fmt.len());
	let mut args = args.iter();
	let mut chars = fmt.chars().peekable();

	while let Some(c) = chars.next() {
		if c != '%' {
			out.push(c);
			continue;
		}
		let spec = parse_spec(&mut chars)?;
		let Some(conv) = chars.next() else {
			return Err(argument_error("incomplete format specifier; use %% (double %) instead"));
		};
		if conv == '%' {
			out.push('%');
			continue;
		}
		let arg = args.next().ok_or_else(|| argument_error("too few arguments"))?;
		let body = match conv {
			's' => truncate(arg.to_string(), spec.precision),
			'p' => truncate(arg.inspect(), spec.precision),
			'c' => char_arg(arg)?,
			'd' | 'i' | 'u' => {
				let n = to_int(arg)?;
				signed(&spec, n.to_string(), n < 0)
			}
			'x' | 'X' | 'o' | 'b' | 'B' => radix(&spec, to_int(arg)?, conv),
			'f' | 'e' | 'E' | 'g' | 'G' => float(&spec, to_float(arg)?, conv),
			other => return Err(argument_error(format!("malformed format string - %{other}"))),
		};
		let zero = match conv {
			'd' | 'i' | 'u' | 'x' | 'X' | 'o' | 'b' | 'B' => spec.zero && spec.precision.is_none(),
			'f' | 'e' | 'E' | 'g' | 'G' => spec.zero,
			_ => false,
		};
		pad(&mut out, &spec, &body, zero);
	}
	Ok(out)
}

fn parse_spec(chars: &mut Peekable<Chars<'_>>) -> Result<Spec, Exception> {
	let mut spec = Spec::default();
	while let Some(&c) = chars.peek() {
		match c {
			'-' => spec.left = true,
			'+' => spec.plus = true,
			' ' => spec.space = true,
			'0' => spec.zero = true,
			'#' => spec.alt = true,
			_ => break,
		}
		chars.next();
	}
	spec.width = digits(chars, "width")?.unwrap_or(0);
	if chars.next_if_eq(&'.').is_some() {
		spec.precision = Some(digits(chars, "precision")?.unwrap_or(0));
	}
	Ok(spec)
}

/// Largest width or precision a directive may ask for.
const MAX_DIGITS: usize = i32::MAX as usize;

fn digits(chars: &mut Peekable<Chars<'_>>, what: &str) -> Result<Option<usize>, Exception> {
	let mut value: Option<usize> = None;
	while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
		chars.next();
		let next = value.unwrap_or(0).checked_mul(10).and_then(|v| v.checked_add(d as usize)).filter(|&v| v <= MAX_DIGITS);
		value = Some(next.ok_or_else(|| argument_error(format!("{what} too big")))?);
	}
	Ok(value)
}

fn argument_error(message: impl Into<String>) -> Exception {
	Exception::new(class::ARGUMENT_ERROR, message)
}

fn to_int(arg: &Value) -> Result<i64, Exception> {
	match arg {
		Value::Int(i) => Ok(*i),
		Value::Float(x) if x.is_finite() => Ok(x.trunc() as i64),
		Value::Float(x) => Err(Exception::new("FloatDomainError", x.to_string())),
		Value::Str(s) => s.trim().parse().map_err(|_| argument_error(format!("invalid value for Integer(): {}", arg.inspect()))),
		Value::Nil => Err(Exception::type_error("can't convert nil into Integer")),
		other => Err(Exception::type_error(format!("can't convert {} into Integer", other.class_name()))),
	}
}

fn to_float(arg: &Value) -> Result<f64, Exception> {
	match arg {
		Value::Str(s) => s.trim().parse().map_err(|_| argument_error(format!("invalid value for Float(): {}", arg.inspect()))),
		Value::Nil => Err(Exception::type_error("can't convert nil into Float")),
		other => other.as_float().ok_or_else(|| Exception::type_error(format!("can't convert {} into Float", other.class_name()))),
	}
}

fn char_arg(arg: &Value) -> Result<String, Exception> {
	match arg {
		Value::Str(s) => Ok(s.chars().take(1).collect()),
		other => {
			let code = to_int(other)?;
			u32::try_from(code)
				.ok()
				.and_then(char::from_u32)
				.map(String::from)
				.ok_or_else(|| Exception::new(class::RANGE_ERROR, format!("{code} out of char range")))
		}
	}
}

fn truncate(text: String, precision: Option<usize>) -> String {
	match precision {
		Some(n) => text.chars().take(n).collect(),
		None => text,
	}
}

/// Prefixes the sign a non-negative number gets from `+` or ` `.
fn signed(spec: &Spec, digits: String, negative: bool) -> String {
	if negative {
		digits
	} else if spec.plus {
		format!("+{digits}")
	} else if spec.space {
		format!(" {digits}")
	} else {
		digits
	}
}

fn radix(spec: &Spec, n: i64, conv: char) -> String {
	let magnitude = n.unsigned_abs();
	let mut digits = match conv {
		'x' => format!("{magnitude:x}"),
		'X' => format!("{magnitude:X}"),
		'o' => format!("{magnitude:o}"),
		_ => format!("{magnitude:b}"),
	};
	if let Some(precision) = spec.precision
		&& digits.len() < precision
	{
		digits.insert_str(0, &"0".repeat(precision - digits.len()));
	}
	if spec.alt && n != 0 {
		let prefix = match conv {
			'x' => "0x",
			'X' => "0X",
			'o' => "0",
			'b' => "0b",
			_ => "0B",
		};
		digits.insert_str(0, prefix);
	}
	if n < 0 {
		digits.insert(0, '-');
	}
	signed(spec, digits, n < 0)
}

fn float(spec: &Spec, x: f64, conv: char) -> String {
	if !x.is_finite() {
		let text = if x.is_nan() { "NaN" } else { "Inf" };
		return signed(spec, if x < 0.0 { format!("-{text}") } else { text.to_string() }, x < 0.0);
	}
	let precision = spec.precision.unwrap_or(6);
	let body = match conv {
		'f' => format!("{x:.precision$}"),
		'e' | 'E' => exponent(x, precision, conv == 'E'),
		_ => general(x, precision.max(1), conv == 'G', spec.alt),
	};
	let negative = body.starts_with('-');
	signed(spec, body, negative)
}

/// C-style exponent notation with at least two exponent digits.
fn exponent(x: f64, precision: usize, upper: bool) -> String {
	let text = format!("{x:.precision$e}");
	let (mantissa, exp) = text.split_once('e').unwrap_or((&text, "0"));
	let (sign, exp) = match exp.strip_prefix('-') {
		Some(rest) => ('-', rest),
		None => ('+', exp),
	};
	let mut out = String::with_capacity(text.len() + 2);
	let _ = write!(out, "{mantissa}{}{sign}{exp:0>2}", if upper { 'E' } else { 'e' });
	out
}

fn general(x: f64, precision: usize, upper: bool, alt: bool) -> String {
	let exp = if x == 0.0 { 0 } else { x.abs().log10().floor() as i32 };
	let mut text = if exp < -4 || exp >= precision as i32 {
		exponent(x, precision - 1, upper)
	} else {
		let decimals = (precision as i32 - 1 - exp).max(0) as usize;
		format!("{x:.decimals$}")
	};
	if !alt {
		text = strip_fraction_zeros(&text);
	}
	text
}

fn strip_fraction_zeros(text: &str) -> String {
	let (mantissa, suffix) = match text.find(['e', 'E']) {
		Some(at) => text.split_at(at),
		None => (text, ""),
	};
	if !mantissa.contains('.') {
		return text.to_string();
	}
	let mantissa = mantissa.trim_end_matches('0').trim_end_matches('.');
	format!("{mantissa}{suffix}")
}

/// Pads `body` to the requested width. Zero padding goes after the sign.
fn pad(out: &mut String, spec: &Spec, body: &str, zero: bool) {
	let len = body.chars().count();
	if len >= spec.width {
		out.push_str(body);
		return;
	}
	let fill = spec.width - len;
	if spec.left {
		out.push_str(body);
		out.extend(std::iter::repeat_n(' ', fill));
	} else if zero {
		let sign_len = body.starts_with(['-', '+', ' ']) as usize;
		let (sign, digits) = body.split_at(sign_len);
		out.push_str(sign);
		out.extend(std::iter::repeat_n('0', fill));
		out.push_str(digits);
	} else {
		out.extend(std::iter::repeat_n(' ', fill));
		out.push_str(body);
	}
}
