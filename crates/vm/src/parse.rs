//! Lexer and parser for the guest language.
//!
//! The language is a small expression subset: literals, arrays, braceless
//! hash arguments, global variables, constants, method calls with or without
//! parentheses and the arithmetic operators, which dispatch as methods on the
//! left operand.

use std::rc::Rc;

use gemcut_host::{Exception, Value, class};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
	/// Immediate literal (`nil`, booleans, numbers).
	Lit(Value),
	Str(Rc<str>),
	Array(Vec<Expr>),
	Hash(Vec<(Expr, Expr)>),
	Const(Rc<str>),
	ScopedConst(Box<Expr>, Rc<str>),
	Gvar(Rc<str>),
	GvarSet(Rc<str>, Box<Expr>),
	Not(Box<Expr>),
	Call {
		recv: Option<Box<Expr>>,
		name: Rc<str>,
		args: Vec<Expr>,
		/// Bare identifier without receiver, arguments or parentheses.
		vcall: bool,
	},
}

/// A parsed compilation unit, ready to run with [`crate::Vm::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
	pub(crate) stmts: Vec<Expr>,
}

impl Program {
	pub fn parse(source: &str) -> Result<Self, Exception> {
		let tokens = lex(source)?;
		let mut parser = Parser { tokens, pos: 0 };
		parser.program()
	}

	pub fn len(&self) -> usize {
		self.stmts.len()
	}

	pub fn is_empty(&self) -> bool {
		self.stmts.is_empty()
	}
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
	Str(String),
	Int(i64),
	Float(f64),
	Ident(String),
	Const(String),
	Gvar(String),
	Nil,
	True,
	False,
	Dot,
	Scope,
	Comma,
	LParen,
	RParen,
	LBracket,
	RBracket,
	Plus,
	Minus,
	Star,
	Slash,
	Percent,
	Bang,
	Arrow,
	Assign,
	Sep,
	Eof,
}

fn syntax_error(line: usize, message: impl std::fmt::Display) -> Exception {
	Exception::new(class::SYNTAX_ERROR, format!("line {line}: {message}"))
}

fn is_ident_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || c == '_'
}

fn lex(source: &str) -> Result<Vec<(Tok, usize)>, Exception> {
	let mut out = Vec::new();
	let mut chars = source.chars().peekable();
	let mut line = 1;

	while let Some(&c) = chars.peek() {
		match c {
			'\n' => {
				chars.next();
				out.push((Tok::Sep, line));
				line += 1;
			}
			';' => {
				chars.next();
				out.push((Tok::Sep, line));
			}
			c if c.is_whitespace() => {
				chars.next();
			}
			'#' => {
				while chars.peek().is_some_and(|&c| c != '\n') {
					chars.next();
				}
			}
			'\'' | '"' => {
				chars.next();
				let mut s = String::new();
				loop {
					match chars.next() {
						None => return Err(syntax_error(line, "unterminated string")),
						Some(q) if q == c => break,
						Some('\\') => match (c, chars.next()) {
							(_, None) => return Err(syntax_error(line, "unterminated string")),
							('\'', Some(e @ ('\'' | '\\'))) => s.push(e),
							('\'', Some(e)) => {
								s.push('\\');
								s.push(e);
							}
							(_, Some('n')) => s.push('\n'),
							(_, Some('t')) => s.push('\t'),
							(_, Some(e)) => s.push(e),
						},
						Some('\n') => {
							line += 1;
							s.push('\n');
						}
						Some(ch) => s.push(ch),
					}
				}
				out.push((Tok::Str(s), line));
			}
			'0'..='9' => {
				let mut digits = String::new();
				let mut float = false;
				while let Some(&d) = chars.peek() {
					if d.is_ascii_digit() {
						digits.push(d);
					} else if d == '_' {
					} else if d == '.' && !float {
						let mut ahead = chars.clone();
						ahead.next();
						if !ahead.peek().is_some_and(char::is_ascii_digit) {
							break;
						}
						float = true;
						digits.push(d);
					} else {
						break;
					}
					chars.next();
				}
				let tok = if float {
					Tok::Float(digits.parse().map_err(|e| syntax_error(line, e))?)
				} else {
					Tok::Int(digits.parse().map_err(|e| syntax_error(line, e))?)
				};
				out.push((tok, line));
			}
			'$' => {
				chars.next();
				let mut name = String::from("$");
				while let Some(&d) = chars.peek().filter(|&&d| is_ident_char(d)) {
					name.push(d);
					chars.next();
				}
				if name.len() == 1 {
					return Err(syntax_error(line, "empty global variable name"));
				}
				out.push((Tok::Gvar(name), line));
			}
			c if c.is_ascii_alphabetic() || c == '_' => {
				let mut name = String::new();
				while let Some(&d) = chars.peek().filter(|&&d| is_ident_char(d)) {
					name.push(d);
					chars.next();
				}
				if let Some(&suffix @ ('?' | '!')) = chars.peek() {
					let mut ahead = chars.clone();
					ahead.next();
					if ahead.peek() != Some(&'=') {
						name.push(suffix);
						chars.next();
					}
				}
				let tok = match name.as_str() {
					"nil" => Tok::Nil,
					"true" => Tok::True,
					"false" => Tok::False,
					_ if c.is_ascii_uppercase() => Tok::Const(name),
					_ => Tok::Ident(name),
				};
				out.push((tok, line));
			}
			_ => {
				chars.next();
				let tok = match c {
					'.' => Tok::Dot,
					',' => Tok::Comma,
					'(' => Tok::LParen,
					')' => Tok::RParen,
					'[' => Tok::LBracket,
					']' => Tok::RBracket,
					'+' => Tok::Plus,
					'-' => Tok::Minus,
					'*' => Tok::Star,
					'/' => Tok::Slash,
					'%' => Tok::Percent,
					'!' => Tok::Bang,
					':' if chars.next_if_eq(&':').is_some() => Tok::Scope,
					'=' if chars.next_if_eq(&'>').is_some() => Tok::Arrow,
					'=' => Tok::Assign,
					other => return Err(syntax_error(line, format!("unexpected character '{other}'"))),
				};
				out.push((tok, line));
			}
		}
	}
	out.push((Tok::Eof, line));
	Ok(out)
}

struct Parser {
	tokens: Vec<(Tok, usize)>,
	pos: usize,
}

impl Parser {
	fn peek(&self) -> &Tok {
		&self.tokens[self.pos.min(self.tokens.len() - 1)].0
	}

	fn line(&self) -> usize {
		self.tokens[self.pos.min(self.tokens.len() - 1)].1
	}

	fn bump(&mut self) -> Tok {
		let tok = self.peek().clone();
		if self.pos < self.tokens.len() - 1 {
			self.pos += 1;
		}
		tok
	}

	fn eat(&mut self, tok: &Tok) -> bool {
		if self.peek() == tok {
			self.bump();
			true
		} else {
			false
		}
	}

	fn expect(&mut self, tok: &Tok, what: &str) -> Result<(), Exception> {
		if self.eat(tok) {
			Ok(())
		} else {
			Err(syntax_error(self.line(), format!("expected {what}, found {:?}", self.peek())))
		}
	}

	fn program(&mut self) -> Result<Program, Exception> {
		let mut stmts = Vec::new();
		loop {
			while self.eat(&Tok::Sep) {}
			if self.peek() == &Tok::Eof {
				break;
			}
			stmts.push(self.stmt()?);
			if !matches!(self.peek(), Tok::Sep | Tok::Eof) {
				return Err(syntax_error(self.line(), format!("unexpected {:?}", self.peek())));
			}
		}
		Ok(Program { stmts })
	}

	fn stmt(&mut self) -> Result<Expr, Exception> {
		if let Tok::Gvar(name) = self.peek().clone()
			&& self.tokens.get(self.pos + 1).is_some_and(|(tok, _)| tok == &Tok::Assign)
		{
			self.pos += 2;
			let value = self.expr()?;
			return Ok(Expr::GvarSet(name.into(), Box::new(value)));
		}
		self.expr()
	}

	fn expr(&mut self) -> Result<Expr, Exception> {
		let mut lhs = self.term()?;
		loop {
			let op = match self.peek() {
				Tok::Plus => "+",
				Tok::Minus => "-",
				_ => return Ok(lhs),
			};
			self.bump();
			let rhs = self.term()?;
			lhs = binary(lhs, op, rhs);
		}
	}

	fn term(&mut self) -> Result<Expr, Exception> {
		let mut lhs = self.unary()?;
		loop {
			let op = match self.peek() {
				Tok::Star => "*",
				Tok::Slash => "/",
				Tok::Percent => "%",
				_ => return Ok(lhs),
			};
			self.bump();
			let rhs = self.unary()?;
			lhs = binary(lhs, op, rhs);
		}
	}

	fn unary(&mut self) -> Result<Expr, Exception> {
		if self.eat(&Tok::Bang) {
			return Ok(Expr::Not(Box::new(self.unary()?)));
		}
		if self.eat(&Tok::Minus) {
			return match self.bump() {
				Tok::Int(i) => self.postfix(Expr::Lit(Value::Int(-i))),
				Tok::Float(x) => self.postfix(Expr::Lit(Value::Float(-x))),
				other => Err(syntax_error(self.line(), format!("unary minus applied to {other:?}"))),
			};
		}
		let primary = self.primary()?;
		self.postfix(primary)
	}

	fn postfix(&mut self, mut expr: Expr) -> Result<Expr, Exception> {
		loop {
			if self.eat(&Tok::Dot) {
				let name = match self.bump() {
					Tok::Ident(name) | Tok::Const(name) => name,
					other => return Err(syntax_error(self.line(), format!("expected method name, found {other:?}"))),
				};
				let args = self.call_args()?.unwrap_or_default();
				expr = Expr::Call {
					recv: Some(Box::new(expr)),
					name: name.into(),
					args,
					vcall: false,
				};
			} else if self.eat(&Tok::Scope) {
				let Tok::Const(name) = self.bump() else {
					return Err(syntax_error(self.line(), "expected constant after '::'"));
				};
				expr = Expr::ScopedConst(Box::new(expr), name.into());
			} else {
				return Ok(expr);
			}
		}
	}

	fn primary(&mut self) -> Result<Expr, Exception> {
		let line = self.line();
		Ok(match self.bump() {
			Tok::Nil => Expr::Lit(Value::Nil),
			Tok::True => Expr::Lit(Value::Bool(true)),
			Tok::False => Expr::Lit(Value::Bool(false)),
			Tok::Int(i) => Expr::Lit(Value::Int(i)),
			Tok::Float(x) => Expr::Lit(Value::Float(x)),
			Tok::Str(s) => Expr::Str(s.into()),
			Tok::Gvar(name) => Expr::Gvar(name.into()),
			Tok::Const(name) => Expr::Const(name.into()),
			Tok::LParen => {
				let inner = self.expr()?;
				self.expect(&Tok::RParen, "')'")?;
				inner
			}
			Tok::LBracket => {
				let mut items = Vec::new();
				if !self.eat(&Tok::RBracket) {
					loop {
						items.push(self.expr()?);
						if self.eat(&Tok::RBracket) {
							break;
						}
						self.expect(&Tok::Comma, "',' or ']'")?;
					}
				}
				Expr::Array(items)
			}
			Tok::Ident(name) => match self.call_args()? {
				Some(args) => Expr::Call {
					recv: None,
					name: name.into(),
					args,
					vcall: false,
				},
				None => Expr::Call {
					recv: None,
					name: name.into(),
					args: Vec::new(),
					vcall: true,
				},
			},
			other => return Err(syntax_error(line, format!("unexpected {other:?}"))),
		})
	}

	/// Parses parenthesized or command-style arguments, if any follow.
	fn call_args(&mut self) -> Result<Option<Vec<Expr>>, Exception> {
		if self.eat(&Tok::LParen) {
			if self.eat(&Tok::RParen) {
				return Ok(Some(Vec::new()));
			}
			let args = self.arg_list()?;
			self.expect(&Tok::RParen, "')'")?;
			return Ok(Some(args));
		}
		if starts_argument(self.peek()) {
			return self.arg_list().map(Some);
		}
		Ok(None)
	}

	fn arg_list(&mut self) -> Result<Vec<Expr>, Exception> {
		let mut args = Vec::new();
		let mut pairs = Vec::new();
		loop {
			let arg = self.expr()?;
			if self.eat(&Tok::Arrow) {
				pairs.push((arg, self.expr()?));
			} else if !pairs.is_empty() {
				return Err(syntax_error(self.line(), "positional argument after hash argument"));
			} else {
				args.push(arg);
			}
			if !self.eat(&Tok::Comma) {
				break;
			}
		}
		if !pairs.is_empty() {
			args.push(Expr::Hash(pairs));
		}
		Ok(args)
	}
}

fn starts_argument(tok: &Tok) -> bool {
	matches!(
		tok,
		Tok::Str(_) | Tok::Int(_) | Tok::Float(_) | Tok::Ident(_) | Tok::Const(_) | Tok::Gvar(_) | Tok::Nil | Tok::True | Tok::False | Tok::LBracket | Tok::Bang
	)
}

fn binary(lhs: Expr, op: &str, rhs: Expr) -> Expr {
	Expr::Call {
		recv: Some(Box::new(lhs)),
		name: op.into(),
		args: vec![rhs],
		vcall: false,
	}
}
