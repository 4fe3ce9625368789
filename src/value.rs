// Resolved values
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

//! Values produced by resolution.
//!
//! Every resolvable entity is a [`Value`]:
//!   scalars (as [instructions](crate::ir)),
//!   functions,
//!   struct types and their instances,
//!   namespaces,
//!   constraints,
//!   anonymous tuples,
//!   and the transient wrappers produced by partial application and
//!     uncurrying.
//!
//! [`Value`] is a closed enumeration and every operation of the value
//!   protocol is an exhaustive match over it.
//! The absence of a capability
//!   (e.g. calling something that is not a function)
//!   is a [`ResolveError`](crate::resolve::ResolveError),
//!     never a panic.
//!
//! Identity
//! ========
//! Types and functions are compared by _identity_:
//!   two struct values are the same type only if they are the same
//!   [`Rc`],
//!     which holds because every declaration is resolved at most once per
//!     [`ResolvedBlock`].
//! Scalars and instances are compared _structurally_,
//!   which is cheap for scalars since instructions are hash-consed.
//! See [`Value::is_identical`] and the [`PartialEq`] implementation.
//!
//! Errors as Values
//! ================
//! [`Value::Error`] stands in for a value whose resolution already failed
//!   and was reported.
//! It satisfies every constraint,
//!   and calling or indexing it yields itself,
//!   so that a single root failure does not produce a cascade of
//!   secondary diagnostics.

mod applied;
mod block;
mod constraint;
mod function;
mod port;
mod structs;
mod tuple;

pub use applied::{uncurry, AppliedFunction, UncurriedFunction};
pub use block::ResolvedBlock;
pub use constraint::{Constraint, ConstraintKind};
pub use function::{Function, FunctionBody, NativeFn};
pub use port::{check_inputs, check_return, ResolvedPort};
pub use structs::{Struct, StructInstance};
pub use tuple::{StructuralTuple, TupleInstance, TupleRegistry, TypeKey};

use crate::{
    ir::InstrIx,
    resolve::{Context, ResolveErrorKind, ResolveResult},
    sym::SymbolId,
};
use std::{
    fmt::{self, Display},
    rc::Rc,
};

/// A resolved entity.
#[derive(Debug, Clone)]
pub enum Value {
    /// A scalar `Num` or `Bool`.
    Instruction(InstrIx),
    Function(Rc<Function>),
    Struct(Rc<Struct>),
    Instance(Rc<StructInstance>),
    Namespace(Rc<ResolvedBlock>),
    Applied(Rc<AppliedFunction>),
    Uncurried(Rc<UncurriedFunction>),
    Constraint(Rc<Constraint>),
    Tuple(Rc<StructuralTuple>),
    TupleInstance(Rc<TupleInstance>),
    /// A value whose resolution failed.
    Error,
}

/// Supplies the next instruction of a serialized value during
///   [`Value::deserialize`].
pub type NextInstr<'a> = dyn FnMut(&mut Context) -> ResolveResult<InstrIx> + 'a;

impl Value {
    /// Human-readable name of the kind of this value.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Instruction(_) => "Instruction",
            Self::Function(_) => "Function",
            Self::Struct(_) => "Struct",
            Self::Instance(_) => "Instance",
            Self::Namespace(_) => "Namespace",
            Self::Applied(_) => "AppliedFunction",
            Self::Uncurried(_) => "UncurriedFunction",
            Self::Constraint(_) => "Constraint",
            Self::Tuple(_) => "StructuralTuple",
            Self::TupleInstance(_) => "TupleInstance",
            Self::Error => "Error",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }

    pub fn as_instruction(&self) -> Option<InstrIx> {
        match self {
            Self::Instruction(ix) => Some(*ix),
            _ => None,
        }
    }

    /// Whether this value can be called.
    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            Self::Function(_)
                | Self::Struct(_)
                | Self::Applied(_)
                | Self::Uncurried(_)
        )
    }

    /// Whether this is a function without ports,
    ///   which is invoked automatically wherever a value is required.
    pub fn is_nullary(&self) -> bool {
        matches!(self, Self::Function(f) if f.ports().is_empty())
    }

    /// Ports accepted by a call to this value,
    ///   which is empty if the value is not callable.
    pub fn input_ports(&self) -> &[ResolvedPort] {
        match self {
            Self::Function(f) => f.ports(),
            Self::Struct(s) => s.fields(),
            Self::Applied(a) => a.ports(),
            Self::Uncurried(u) => u.ports(),
            Self::Constraint(c) => c.ports(),
            _ => &[],
        }
    }

    /// Constraint on the value produced by calling this value.
    ///
    /// A type is its own return constraint.
    pub fn return_constraint(&self, ctx: &Context) -> Value {
        match self {
            Self::Function(f) => f.ret().clone(),
            Self::Applied(a) => a.inner().return_constraint(ctx),
            Self::Uncurried(u) => u.ret().clone(),
            Self::Constraint(c) => match c.kind() {
                ConstraintKind::Function { ret, .. } => ret.clone(),
                ConstraintKind::Any => self.clone(),
            },
            Self::Struct(_) | Self::Tuple(_) | Self::Error => self.clone(),
            _ => ctx.any(),
        }
    }

    /// Identifiers accessible through [`Value::index`].
    pub fn members(&self) -> Vec<SymbolId> {
        match self {
            Self::Namespace(block) => block.members().to_vec(),
            Self::Struct(s) => s.members(),
            Self::Instance(i) => i.members(),
            Self::TupleInstance(t) => t.members(),
            _ => vec![],
        }
    }

    pub fn call(&self, ctx: &mut Context, args: Vec<Value>) -> ResolveResult<Value> {
        match self {
            Self::Error => Ok(Self::Error),
            Self::Function(f) => f.call(ctx, args),
            Self::Struct(s) => s.construct(ctx, args),
            Self::Applied(a) => a.call(ctx, args),
            Self::Uncurried(u) => u.call(ctx, self, args),
            _ => Err(ctx.error(ResolveErrorKind::NotFunction(ctx.describe(self)))),
        }
    }

    pub fn index(&self, ctx: &mut Context, id: SymbolId) -> ResolveResult<Value> {
        match self {
            Self::Error => Ok(Self::Error),
            Self::Namespace(block) => block.index(ctx, id),
            Self::Struct(s) => s.index(ctx, id),
            Self::Instance(i) => i.index(ctx, self, id),
            Self::TupleInstance(t) => t.index(ctx, id),
            Self::Instruction(ix) => {
                let ty = ctx.graph.ty(*ix);
                let s = ctx.scalar_struct(ty)?;
                structs::instance_member(ctx, &s, self, id)
            }
            _ => Err(ctx.error(ResolveErrorKind::NotIndexable(ctx.describe(self)))),
        }
    }

    /// Whether `value` satisfies this value as a constraint.
    pub fn matches_constraint(
        &self,
        ctx: &mut Context,
        value: &Value,
    ) -> ResolveResult<bool> {
        if self.is_error() || value.is_error() {
            return Ok(true);
        }

        match self {
            Self::Constraint(c) => c.matches(ctx, value),
            Self::Struct(s) => s.matches(ctx, value),
            Self::Tuple(t) => Ok(matches!(
                value,
                Self::TupleInstance(i) if Rc::ptr_eq(i.ty(), t)
            )),
            _ => Err(ctx.error(ResolveErrorKind::NotConstraint(ctx.describe(self)))),
        }
    }

    /// The default value of this type.
    pub fn default_value(&self, ctx: &mut Context) -> ResolveResult<Value> {
        match self {
            Self::Error => Ok(Self::Error),
            Self::Struct(s) => s.default_value(ctx),
            Self::Tuple(t) => t.default_value(ctx),
            _ => Err(ctx.error(ResolveErrorKind::TypeError(format!(
                "{} has no default value",
                ctx.describe(self)
            )))),
        }
    }

    /// Append the flat instruction sequence representing this value to
    ///   `out`.
    pub fn serialize(
        &self,
        ctx: &mut Context,
        out: &mut Vec<InstrIx>,
    ) -> ResolveResult<()> {
        match self {
            Self::Instruction(ix) => {
                out.push(*ix);
                Ok(())
            }
            Self::Instance(i) => {
                i.values().iter().try_for_each(|v| v.serialize(ctx, out))
            }
            Self::TupleInstance(t) => {
                t.values().try_for_each(|v| v.serialize(ctx, out))
            }
            _ => Err(ctx.error(ResolveErrorKind::SerializationError(format!(
                "{} is not serializable",
                ctx.describe(self)
            )))),
        }
    }

    /// Produce a value of the same shape as this one from the
    ///   instructions provided by `next`.
    ///
    /// This is the inverse of [`Value::serialize`].
    pub fn deserialize(
        &self,
        ctx: &mut Context,
        next: &mut NextInstr,
    ) -> ResolveResult<Value> {
        match self {
            Self::Instruction(ix) => {
                let found = next(ctx)?;
                let (expected, actual) = (ctx.graph.ty(*ix), ctx.graph.ty(found));

                match expected == actual {
                    true => Ok(Self::Instruction(found)),
                    false => Err(ctx.error(ResolveErrorKind::SerializationError(
                        format!(
                            "'{}' deserialized to incorrect type: \
                                is '{actual}', expected '{expected}'",
                            ctx.graph.summary(found),
                        ),
                    ))),
                }
            }
            Self::Instance(i) => i.deserialize(ctx, next).map(Self::Instance),
            Self::TupleInstance(t) => {
                t.deserialize(ctx, next).map(Self::TupleInstance)
            }
            _ => Err(ctx.error(ResolveErrorKind::SerializationError(format!(
                "{} cannot be deserialized",
                ctx.describe(self)
            )))),
        }
    }

    /// The type that this value is an instance of,
    ///   if any.
    pub fn instance_type(&self, ctx: &mut Context) -> ResolveResult<Option<Value>> {
        match self {
            Self::Instruction(ix) => {
                let ty = ctx.graph.ty(*ix);
                ctx.scalar_struct(ty).map(|s| Some(Self::Struct(s)))
            }
            Self::Instance(i) => Ok(Some(Self::Struct(i.ty().clone()))),
            Self::TupleInstance(t) => Ok(Some(Self::Tuple(t.ty().clone()))),
            _ => Ok(None),
        }
    }

    /// The value wrapped by a transient wrapper,
    ///   or `self`.
    pub fn inner(&self) -> &Value {
        match self {
            Self::Applied(a) => a.inner().inner(),
            _ => self,
        }
    }

    /// Whether `self` and `other` are the very same value.
    ///
    /// This is reference identity for everything but scalars,
    ///   which are identical if their instructions are.
    pub fn is_identical(&self, other: &Value) -> bool {
        use Value::*;

        match (self, other) {
            (Instruction(a), Instruction(b)) => a == b,
            (Function(a), Function(b)) => Rc::ptr_eq(a, b),
            (Struct(a), Struct(b)) => Rc::ptr_eq(a, b),
            (Instance(a), Instance(b)) => Rc::ptr_eq(a, b),
            (Namespace(a), Namespace(b)) => Rc::ptr_eq(a, b),
            (Applied(a), Applied(b)) => Rc::ptr_eq(a, b),
            (Uncurried(a), Uncurried(b)) => Rc::ptr_eq(a, b),
            (Constraint(a), Constraint(b)) => Rc::ptr_eq(a, b),
            (Tuple(a), Tuple(b)) => Rc::ptr_eq(a, b),
            (TupleInstance(a), TupleInstance(b)) => Rc::ptr_eq(a, b),
            (Error, Error) => true,
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;

        match (self, other) {
            (Instance(a), Instance(b)) => {
                Rc::ptr_eq(a.ty(), b.ty()) && a.values() == b.values()
            }
            (TupleInstance(a), TupleInstance(b)) => {
                Rc::ptr_eq(a.ty(), b.ty()) && a.values().eq(b.values())
            }
            (Applied(a), Applied(b)) => {
                a.inner() == b.inner() && a.bound() == b.bound()
            }
            _ => self.is_identical(other),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instruction(ix) => write!(f, "instruction {ix}"),
            Self::Function(x) => write!(f, "function '{}'", x.path()),
            Self::Struct(s) => write!(f, "struct '{}'", s.path()),
            Self::Instance(i) => write!(f, "instance of '{}'", i.ty().path()),
            Self::Namespace(b) => write!(f, "namespace '{}'", b.path()),
            Self::Applied(a) => write!(
                f,
                "{} applied to {} argument(s)",
                a.inner(),
                a.bound().len()
            ),
            Self::Uncurried(u) => write!(f, "{} uncurried with {}", u.a(), u.b()),
            Self::Constraint(c) => write!(f, "constraint '{}'", c.path()),
            Self::Tuple(t) => write!(f, "tuple {t}"),
            Self::TupleInstance(t) => write!(f, "instance of tuple {}", t.ty()),
            Self::Error => write!(f, "<error>"),
        }
    }
}

#[cfg(test)]
mod test;
