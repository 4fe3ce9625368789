// Partial application and uncurrying
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

//! Values derived from other callable values.
//!
//! Partial Application
//! ===================
//! Calling a function with fewer arguments than it has required ports
//!   (those preceding any variadic port)
//!   binds those arguments and yields an [`AppliedFunction`] accepting the
//!   rest.
//! Applied functions are never nested:
//!   partially applying an applied function extends its bound prefix,
//!     and so the wrapped value is always the canonical definition.
//! Once enough arguments are available,
//!   the wrapped value is called with the bound prefix followed by the new
//!   arguments,
//!     which re-enters the call protocol exactly as if all arguments had
//!     been provided at once.
//!
//! Uncurrying
//! ==========
//! [`uncurry`] composes `a` with `b` into a single function whose ports
//!   are those of `a` followed by all but the first of `b`;
//!     the result of `a` is provided to the first port of `b`.

use super::{ResolvedPort, Value};
use crate::{
    resolve::{Context, ResolveErrorKind, ResolveResult},
    sym::SymbolId,
};
use fxhash::FxHashSet;
use std::{iter, rc::Rc};

/// Result of matching arguments against the ports of a callee.
#[derive(Debug)]
pub(super) enum Application {
    /// Too few arguments;
    ///   the callee has been partially applied.
    Partial(Value),
    /// The callee should be invoked with these arguments.
    Full(Vec<Value>),
}

/// Number of ports preceding the variadic port,
///   if any.
fn required(ports: &[ResolvedPort]) -> usize {
    ports.iter().take_while(|port| !port.variadic).count()
}

/// Decide whether `args` fully apply `callee`.
///
/// Calling a function that has required ports with no arguments at all is
///   an error rather than a no-op partial application.
/// Surplus arguments are not diagnosed here,
///   since the callee's argument check will do so.
pub(super) fn apply(
    ctx: &mut Context,
    callee: &Value,
    ports: &[ResolvedPort],
    args: Vec<Value>,
) -> ResolveResult<Application> {
    let required = required(ports);

    match args.len() {
        0 if required > 0 => {
            Err(ctx.error(ResolveErrorKind::ArgumentCountMismatch {
                callee: ctx.describe(callee),
                expected: required.to_string(),
                given: 0,
            }))
        }
        given if given < required => {
            Ok(Application::Partial(AppliedFunction::new(callee, args)))
        }
        _ => Ok(Application::Full(args)),
    }
}

/// A callable value with a prefix of its arguments already bound.
#[derive(Debug)]
pub struct AppliedFunction {
    inner: Value,
    bound: Vec<Value>,
    /// Ports of `inner` not yet bound.
    ports: Vec<ResolvedPort>,
}

impl AppliedFunction {
    /// Bind `args` as a prefix of the arguments of `callee`.
    pub fn new(callee: &Value, args: Vec<Value>) -> Value {
        let (inner, bound): (Value, Vec<Value>) = match callee {
            Value::Applied(applied) => (
                applied.inner.clone(),
                applied.bound.iter().cloned().chain(args).collect(),
            ),
            _ => (callee.clone(), args),
        };

        let ports = inner
            .input_ports()
            .iter()
            .skip(bound.len())
            .cloned()
            .collect();

        Value::Applied(Rc::new(Self {
            inner,
            bound,
            ports,
        }))
    }

    /// The wrapped value,
    ///   which is never itself an [`AppliedFunction`].
    pub fn inner(&self) -> &Value {
        &self.inner
    }

    pub fn bound(&self) -> &[Value] {
        &self.bound
    }

    pub fn ports(&self) -> &[ResolvedPort] {
        &self.ports
    }

    pub fn call(&self, ctx: &mut Context, args: Vec<Value>) -> ResolveResult<Value> {
        if args.is_empty() && required(&self.ports) > 0 {
            return Err(ctx.error(ResolveErrorKind::ArgumentCountMismatch {
                callee: format!(
                    "{} applied to {} argument(s)",
                    ctx.describe(&self.inner),
                    self.bound.len(),
                ),
                expected: required(&self.ports).to_string(),
                given: 0,
            }));
        }

        let args = self.bound.iter().cloned().chain(args).collect();
        self.inner.call(ctx, args)
    }
}

/// The composition of two callable values.
#[derive(Debug)]
pub struct UncurriedFunction {
    a: Value,
    b: Value,
    ports: Vec<ResolvedPort>,
    ret: Value,
}

impl UncurriedFunction {
    pub fn a(&self) -> &Value {
        &self.a
    }

    pub fn b(&self) -> &Value {
        &self.b
    }

    pub fn ports(&self) -> &[ResolvedPort] {
        &self.ports
    }

    pub fn ret(&self) -> &Value {
        &self.ret
    }

    /// Call `a` with its share of `args` and then `b` with that result
    ///   followed by the remaining arguments.
    ///
    /// Constraints are checked by the calls to `a` and `b` themselves.
    pub fn call(
        &self,
        ctx: &mut Context,
        this: &Value,
        args: Vec<Value>,
    ) -> ResolveResult<Value> {
        let mut args = match apply(ctx, this, &self.ports, args)? {
            Application::Partial(value) => return Ok(value),
            Application::Full(args) => args,
        };

        // `a` has no variadic port,
        //   so all of its ports are required.
        let rest = args.split_off(self.a.input_ports().len());
        let result = self.a.call(ctx, args)?;

        self.b.call(ctx, iter::once(result).chain(rest).collect())
    }
}

/// Compose `a` and `b` such that the result of `a` is the first argument
///   of `b`.
///
/// Composition fails with [`ResolveErrorKind::FunctionCannotBeUncurried`]
///   if either value is not callable,
///   `b` has no ports to receive the result of `a`,
///   `a` has a variadic port
///     (which would consume every argument intended for `b`),
///   or `a` and `b` share a port identifier.
pub fn uncurry(ctx: &mut Context, a: &Value, b: &Value) -> ResolveResult<Value> {
    if a.is_error() || b.is_error() {
        return Ok(Value::Error);
    }

    let fail = |ctx: &Context, why: String| {
        Err(ctx.error(ResolveErrorKind::FunctionCannotBeUncurried(why)))
    };

    if let Some(v) = [a, b].into_iter().find(|v| !v.is_callable()) {
        return fail(ctx, format!("{} is not a function", ctx.describe(v)));
    }

    let (aports, bports) = (a.input_ports(), b.input_ports());

    if bports.is_empty() {
        return fail(
            ctx,
            format!("{} has no port to receive a result", ctx.describe(b)),
        );
    }

    if aports.iter().any(|port| port.variadic) {
        return fail(
            ctx,
            format!(
                "{} has a variadic port and cannot be followed",
                ctx.describe(a)
            ),
        );
    }

    let aids: FxHashSet<SymbolId> =
        aports.iter().filter_map(|port| port.id).collect();

    if let Some(dup) = bports.iter().filter_map(|p| p.id).find(|id| aids.contains(id))
    {
        return fail(
            ctx,
            format!(
                "port '{dup}' is declared by both {} and {}",
                ctx.describe(a),
                ctx.describe(b),
            ),
        );
    }

    let ports = aports.iter().chain(&bports[1..]).cloned().collect();
    let ret = b.return_constraint(ctx);

    Ok(Value::Uncurried(Rc::new(UncurriedFunction {
        a: a.clone(),
        b: b.clone(),
        ports,
        ret,
    })))
}
