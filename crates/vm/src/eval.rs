use gemcut_host::{Exception, Value, class};

use crate::Vm;
use crate::parse::Expr;

impl Vm {
	pub(crate) fn eval_expr(&mut self, expr: &Expr) -> Result<Value, Exception> {
		match expr {
			Expr::Lit(value) => Ok(value.clone()),
			Expr::Str(s) => self.alloc(Value::Str(s.clone())),
			Expr::Array(items) => {
				let items = items.iter().map(|item| self.eval_expr(item)).collect::<Result<Vec<_>, _>>()?;
				self.alloc(Value::Array(items.into()))
			}
			Expr::Hash(pairs) => {
				let mut out = Vec::with_capacity(pairs.len());
				for (key, value) in pairs {
					let key = self.eval_expr(key)?;
					let value = self.eval_expr(value)?;
					out.push((key, value));
				}
				self.alloc(Value::Hash(out.into()))
			}
			Expr::Const(name) => self.const_get(name),
			Expr::ScopedConst(scope, name) => {
				let scope = self.eval_expr(scope)?;
				self.scoped_const_get(&scope, name)
			}
			Expr::Gvar(name) => Ok(self.gvar_get(name)),
			Expr::GvarSet(name, value) => {
				let value = self.eval_expr(value)?;
				self.gvar_set(name, value.clone());
				Ok(value)
			}
			Expr::Not(inner) => Ok(Value::Bool(!self.eval_expr(inner)?.truthy())),
			Expr::Call { recv, name, args, vcall } => {
				let recv = recv.as_deref().map(|recv| self.eval_expr(recv)).transpose()?;
				let args = args.iter().map(|arg| self.eval_expr(arg)).collect::<Result<Vec<_>, _>>()?;
				match recv {
					Some(recv) => self.call(&recv, name, &args),
					None if *vcall && !self.respond_to(&Value::Nil, name) => {
						Err(Exception::new(class::NAME_ERROR, format!("undefined local variable or method '{name}'")))
					}
					None => self.call_function(name, &args),
				}
			}
		}
	}
}
