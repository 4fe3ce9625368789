// Functions
//
//  Copyright (C) 2014-2023 Ryan Specialty, LLC.
//
//  This file is part of Element Core.
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Intrinsic and custom functions.
//!
//! A [`Function`] is resolved once per declaration and is immutable
//!   thereafter.
//! Calling a function goes through [`Context::invoke`],
//!   which is responsible for the recursion guard and constraint checks;
//!     this module is responsible only for producing the body.

use super::{
    applied::{self, Application},
    ResolvedBlock, ResolvedPort, Value,
};
use crate::{
    decl::{Body, Decl},
    resolve::{Context, ResolveErrorKind, ResolveResult},
    sym::GlobalSymbolIntern,
};
use std::{fmt, rc::Rc};

/// Native implementation of an intrinsic function.
///
/// Arguments have already been checked against the function's ports.
pub type NativeFn = Rc<dyn Fn(&mut Context, &[Value]) -> ResolveResult<Value>>;

/// Implementation of a [`Function`].
#[derive(Clone)]
pub enum FunctionBody {
    /// A declared body evaluated against the scope in which the function
    ///   was declared.
    Custom {
        decl: Rc<Decl>,
        scope: Rc<ResolvedBlock>,
    },
    Native(NativeFn),
}

impl fmt::Debug for FunctionBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom { decl, scope } => f
                .debug_struct("Custom")
                .field("decl", &decl.id)
                .field("scope", scope)
                .finish(),
            Self::Native(_) => write!(f, "Native"),
        }
    }
}

#[derive(Debug)]
pub struct Function {
    path: String,
    ports: Vec<ResolvedPort>,
    ret: Value,
    body: FunctionBody,
}

impl Function {
    /// Resolve a function declared in `scope`.
    ///
    /// Intrinsic bodies are looked up in the context's
    ///   [intrinsic registry](crate::intrinsic::IntrinsicRegistry) by
    ///   fully qualified identifier.
    pub fn resolve(
        ctx: &mut Context,
        decl: &Rc<Decl>,
        scope: &Rc<ResolvedBlock>,
    ) -> ResolveResult<Value> {
        let path = scope.qualify(decl.id);

        let body = match &decl.body {
            Body::Intrinsic(_) => match ctx.intrinsics.function(&path) {
                Ok(f) => FunctionBody::Native(f),
                Err(kind) => return Err(ctx.error(kind)),
            },
            Body::Expr(_) | Body::Scope(_) => FunctionBody::Custom {
                decl: decl.clone(),
                scope: scope.clone(),
            },
            Body::Terminal => {
                return Err(ctx.error(ResolveErrorKind::InvalidExpression(
                    format!("function '{path}' has no body"),
                )))
            }
        };

        let ports = ResolvedPort::resolve_all(ctx, decl.ports.as_ref(), scope)?;
        let ret = match &decl.ret {
            Some(expr) => ctx.evaluate_in(expr, scope)?,
            None => ctx.any(),
        };

        Ok(Value::Function(Rc::new(Self {
            path,
            ports,
            ret,
            body,
        })))
    }

    /// A function implemented natively that is not declared anywhere,
    ///   such as a member of an intrinsic's result.
    pub fn native(
        path: impl Into<String>,
        ports: Vec<ResolvedPort>,
        ret: Value,
        f: NativeFn,
    ) -> Value {
        Value::Function(Rc::new(Self {
            path: path.into(),
            ports,
            ret,
            body: FunctionBody::Native(f),
        }))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn ports(&self) -> &[ResolvedPort] {
        &self.ports
    }

    pub fn ret(&self) -> &Value {
        &self.ret
    }

    pub fn body(&self) -> &FunctionBody {
        &self.body
    }

    pub fn is_intrinsic(&self) -> bool {
        matches!(self.body, FunctionBody::Native(_))
    }

    /// Call this function,
    ///   or partially apply it if too few arguments were provided.
    pub fn call(
        self: &Rc<Self>,
        ctx: &mut Context,
        args: Vec<Value>,
    ) -> ResolveResult<Value> {
        let this = Value::Function(self.clone());

        match applied::apply(ctx, &this, &self.ports, args)? {
            Application::Partial(value) => Ok(value),
            Application::Full(args) => {
                ctx.invoke(&this, &self.ports, &self.ret, &args, |ctx| {
                    self.evaluate(ctx, &args)
                })
            }
        }
    }

    fn evaluate(&self, ctx: &mut Context, args: &[Value]) -> ResolveResult<Value> {
        let (decl, scope) = match &self.body {
            // Intrinsics are not expected to handle error values.
            FunctionBody::Native(_) if args.iter().any(Value::is_error) => {
                return Ok(Value::Error)
            }
            FunctionBody::Native(f) => return f(ctx, args),
            FunctionBody::Custom { decl, scope } => (decl, scope),
        };

        let bindings = self
            .ports
            .iter()
            .take_while(|port| !port.variadic)
            .zip(args)
            .filter_map(|(port, arg)| port.id.map(|id| (id, arg.clone())));

        let frame = ResolvedBlock::frame(scope, &self.path, bindings);

        match &decl.body {
            Body::Expr(expr) => ctx.evaluate_in(expr, &frame),
            Body::Scope(members) => {
                let block = ResolvedBlock::build(
                    ctx,
                    members.clone(),
                    Some(frame),
                    self.path.clone(),
                )?;

                block.index(ctx, "return".intern())
            }
            Body::Intrinsic(_) | Body::Terminal => diagnostic_unreachable!(
                vec![],
                "custom function '{}' has no evaluable body",
                self.path,
            ),
        }
    }
}
