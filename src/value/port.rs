// Resolved ports and argument checking
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

//! Ports and the checking of arguments against them.

use super::{ResolvedBlock, Value};
use crate::{
    decl::PortDecl,
    iter::CollectAll,
    resolve::{Context, ResolveErrorKind, ResolveResult},
    sym::{GlobalSymbolIntern, SymbolId},
};
use fxhash::FxHashSet;
use std::rc::Rc;

/// A formal parameter whose constraint and default have been resolved.
///
/// Ports are immutable once resolved.
#[derive(Debug, Clone)]
pub struct ResolvedPort {
    /// Identifier,
    ///   or [`None`] for a discard.
    pub id: Option<SymbolId>,
    pub constraint: Value,
    pub default: Option<Value>,
    /// Whether this is the variadic port,
    ///   which ends positional checking of arguments.
    pub variadic: bool,
}

impl ResolvedPort {
    pub fn new(id: &str, constraint: Value) -> Self {
        Self {
            id: Some(id.intern()),
            constraint,
            default: None,
            variadic: false,
        }
    }

    pub fn variadic(any: Value) -> Self {
        Self {
            id: None,
            constraint: any,
            default: None,
            variadic: true,
        }
    }

    /// Resolve a port declared in `scope`.
    ///
    /// An absent constraint is `Any`.
    /// The default value is evaluated eagerly.
    pub fn resolve(
        ctx: &mut Context,
        decl: &PortDecl,
        scope: &Rc<ResolvedBlock>,
    ) -> ResolveResult<Self> {
        let constraint = match &decl.constraint {
            Some(expr) => ctx.evaluate_in(expr, scope)?,
            None => ctx.any(),
        };

        let default = match &decl.default {
            Some(expr) => Some(ctx.evaluate_in(expr, scope)?),
            None => None,
        };

        Ok(Self {
            id: decl.id,
            constraint,
            default,
            variadic: decl.variadic,
        })
    }

    /// Resolve every port of a declaration,
    ///   reporting every failure.
    ///
    /// Duplicate identifiers are [`ResolveErrorKind::MultipleDefinitions`].
    pub fn resolve_all(
        ctx: &mut Context,
        decls: Option<&Vec<PortDecl>>,
        scope: &Rc<ResolvedBlock>,
    ) -> ResolveResult<Vec<Self>> {
        let decls = decls.map(Vec::as_slice).unwrap_or_default();
        let mut seen = FxHashSet::default();

        if let Some(dup) = decls
            .iter()
            .filter_map(|p| p.id)
            .find(|id| !seen.insert(*id))
        {
            return Err(ctx.error(ResolveErrorKind::MultipleDefinitions(dup)));
        }

        decls
            .iter()
            .map(|decl| Self::resolve(ctx, decl, scope))
            .collect_all()
    }

    /// Name of this port for display.
    pub fn name(&self) -> String {
        match (self.id, self.variadic) {
            (_, true) => "...".into(),
            (Some(id), false) => id.to_string(),
            (None, false) => "_".into(),
        }
    }

    /// The default value of this port,
    ///   which is its declared default or else the default of its
    ///   constraint.
    pub fn default_value(&self, ctx: &mut Context) -> ResolveResult<Value> {
        match &self.default {
            Some(value) => Ok(value.clone()),
            None => self.constraint.default_value(ctx),
        }
    }
}

/// Check `args` of a call to `callee` against `ports`.
///
/// Without a variadic port,
///   there must be exactly one argument per port;
///     otherwise there must be at least one argument per port preceding
///     the variadic port,
///       and arguments past it are not checked.
/// Every constraint violation is reported,
///   not just the first.
pub fn check_inputs(
    ctx: &mut Context,
    callee: &Value,
    ports: &[ResolvedPort],
    args: &[Value],
) -> ResolveResult<()> {
    let variadic_at = ports.iter().position(|p| p.variadic);

    let (count_ok, expected) = match variadic_at {
        Some(n) => (args.len() >= n, format!("at least {n}")),
        None => (args.len() == ports.len(), ports.len().to_string()),
    };

    if !count_ok {
        return Err(ctx.error(ResolveErrorKind::ArgumentCountMismatch {
            callee: ctx.describe(callee),
            expected,
            given: args.len(),
        }));
    }

    ports
        .iter()
        .take_while(|p| !p.variadic)
        .zip(args)
        .map(|(port, arg)| check_port(ctx, port, arg))
        .collect_all()
}

fn check_port(
    ctx: &mut Context,
    port: &ResolvedPort,
    arg: &Value,
) -> ResolveResult<()> {
    match port.constraint.matches_constraint(ctx, arg)? {
        true => Ok(()),
        false => Err(ctx.error(ResolveErrorKind::ConstraintNotSatisfied {
            value: ctx.describe(arg),
            constraint: ctx.describe(&port.constraint),
            port: port.name(),
        })),
    }
}

/// Check the result of a call against the declared return constraint.
pub fn check_return(
    ctx: &mut Context,
    ret: &Value,
    result: &Value,
) -> ResolveResult<()> {
    match ret.matches_constraint(ctx, result)? {
        true => Ok(()),
        false => Err(ctx.error(ResolveErrorKind::ConstraintNotSatisfied {
            value: ctx.describe(result),
            constraint: ctx.describe(ret),
            port: "return".into(),
        })),
    }
}
