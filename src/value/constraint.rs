// Constraints
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

//! Constraints that are not types.
//!
//! Structs and structural tuples are constraints too,
//!   but they are handled by their own modules.
//! This module provides the universal `Any` constraint and function
//!   constraints,
//!     which describe the signature of a callable value.
//!
//! A function constraint is satisfied by a callable value having the same
//!   number of ports where each port and the return of the constraint is
//!   either `Any` or identical to that of the value.
//! There is no subtyping or variance.

use super::{ResolvedBlock, ResolvedPort, Value};
use crate::{
    decl::{Body, Decl},
    intrinsic::IntrinsicConstraint,
    resolve::{Context, ResolveErrorKind, ResolveResult},
};
use std::rc::Rc;

#[derive(Debug)]
pub enum ConstraintKind {
    /// Satisfied by every value.
    Any,
    /// Satisfied by callable values of the given signature.
    Function { ports: Vec<ResolvedPort>, ret: Value },
}

#[derive(Debug)]
pub struct Constraint {
    path: String,
    kind: ConstraintKind,
}

impl Constraint {
    /// The universal constraint.
    ///
    /// A [`Context`] creates exactly one of these and provides it through
    ///   [`Context::any`];
    ///     use that instead.
    pub fn any() -> Value {
        Value::Constraint(Rc::new(Self {
            path: "Any".into(),
            kind: ConstraintKind::Any,
        }))
    }

    pub fn resolve(
        ctx: &mut Context,
        decl: &Rc<Decl>,
        scope: &Rc<ResolvedBlock>,
    ) -> ResolveResult<Value> {
        let path = scope.qualify(decl.id);

        match &decl.body {
            Body::Intrinsic(_) => {
                return match ctx.intrinsics.constraint(&path) {
                    Ok(IntrinsicConstraint::Any) => Ok(ctx.any()),
                    Err(kind) => Err(ctx.error(kind)),
                }
            }
            Body::Terminal => (),
            Body::Expr(_) | Body::Scope(_) => {
                return Err(ctx.error(ResolveErrorKind::InvalidExpression(
                    format!("constraint '{path}' cannot have a body"),
                )))
            }
        }

        let ports = ResolvedPort::resolve_all(ctx, decl.ports.as_ref(), scope)?;
        let ret = match &decl.ret {
            Some(expr) => ctx.evaluate_in(expr, scope)?,
            None => ctx.any(),
        };

        Ok(Value::Constraint(Rc::new(Self {
            path,
            kind: ConstraintKind::Function { ports, ret },
        })))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> &ConstraintKind {
        &self.kind
    }

    pub fn is_any(&self) -> bool {
        matches!(self.kind, ConstraintKind::Any)
    }

    pub fn ports(&self) -> &[ResolvedPort] {
        match &self.kind {
            ConstraintKind::Any => &[],
            ConstraintKind::Function { ports, .. } => ports,
        }
    }

    /// Whether `value` satisfies this constraint.
    ///
    /// A callable value of the right arity whose signature differs
    ///   produces an error naming the first offending port,
    ///     rather than `false`.
    pub fn matches(&self, ctx: &mut Context, value: &Value) -> ResolveResult<bool> {
        let (ports, ret) = match &self.kind {
            ConstraintKind::Any => return Ok(true),
            ConstraintKind::Function { ports, ret } => (ports, ret),
        };

        let target = value.inner();
        let vports = value.input_ports();

        if !target.is_callable() || vports.len() != ports.len() {
            return Ok(false);
        }

        let mismatch = ports.iter().zip(vports).find(|(expected, actual)| {
            expected.variadic != actual.variadic
                || !compatible(&expected.constraint, &actual.constraint)
        });

        if let Some((expected, actual)) = mismatch {
            return Err(ctx.error(ResolveErrorKind::ConstraintNotSatisfied {
                value: format!(
                    "port '{}' of {} ({})",
                    actual.name(),
                    ctx.describe(value),
                    ctx.describe(&actual.constraint),
                ),
                constraint: format!(
                    "{} of constraint '{}'",
                    ctx.describe(&expected.constraint),
                    self.path,
                ),
                port: expected.name(),
            }));
        }

        let actual_ret = value.return_constraint(ctx);

        match compatible(ret, &actual_ret) {
            true => Ok(true),
            false => Err(ctx.error(ResolveErrorKind::ConstraintNotSatisfied {
                value: format!(
                    "return of {} ({})",
                    ctx.describe(value),
                    ctx.describe(&actual_ret),
                ),
                constraint: format!(
                    "{} of constraint '{}'",
                    ctx.describe(ret),
                    self.path,
                ),
                port: "return".into(),
            })),
        }
    }
}

/// Whether a component `actual` of a signature satisfies the
///   corresponding component `expected` of a function constraint.
fn compatible(expected: &Value, actual: &Value) -> bool {
    match expected {
        Value::Constraint(c) if c.is_any() => true,
        _ => expected.is_identical(actual),
    }
}
