// Memberwise application
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

//! `memberwise(function, ...)`
//!
//! Applies `function` to corresponding fields of one or more instances of
//!   the same struct,
//!     constructing a new instance of that struct from the results.
//! For example,
//!   `memberwise(add, Vector3(1, 2, 3), Vector3(10, 20, 30))`
//!   is `Vector3(11, 22, 33)`.

use super::arity;
use crate::{
    iter::CollectAll,
    resolve::{Context, ResolveErrorKind, ResolveErrors, ResolveResult},
    value::{StructInstance, Value},
};
use std::rc::Rc;

pub(super) fn memberwise(ctx: &mut Context, args: &[Value]) -> ResolveResult<Value> {
    let (f, rest) = match args {
        [f, rest @ ..] => (f, rest),
        [] => return Err(arity(ctx, "memberwise", 1, args)),
    };

    let instances = rest
        .iter()
        .map(|arg| match arg.inner() {
            Value::Instance(inst) => Ok(inst.clone()),
            other => Err(unsatisfied(
                ctx,
                other,
                format!(
                    "expected a struct instance, found {}",
                    ctx.describe(other)
                ),
            )),
        })
        .collect_all::<Vec<Rc<StructInstance>>>()?;

    let ty = match instances.first() {
        Some(first) => first.ty().clone(),
        None => {
            return Err(ctx.error(ResolveErrorKind::ConstraintNotSatisfied {
                value: "no instances".into(),
                constraint: "at least one struct instance".into(),
                port: "memberwise".into(),
            }))
        }
    };

    if let Some(other) = instances.iter().find(|i| !Rc::ptr_eq(i.ty(), &ty)) {
        let other = Value::Instance(other.clone());

        return Err(unsatisfied(
            ctx,
            &other,
            format!("an instance of '{}'", ty.path()),
        ));
    }

    let fields = (0..ty.fields().len())
        .map(|i| {
            let members = instances.iter().map(|inst| inst.values()[i].clone());
            f.call(ctx, members.collect())
        })
        .collect_all::<Vec<_>>()?;

    ty.construct(ctx, fields)
}

fn unsatisfied(ctx: &Context, value: &Value, constraint: String) -> ResolveErrors {
    ctx.error(ResolveErrorKind::ConstraintNotSatisfied {
        value: ctx.describe(value),
        constraint,
        port: "memberwise".into(),
    })
}
