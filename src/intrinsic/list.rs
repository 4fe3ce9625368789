// List intrinsic
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

//! `list(...)`
//!
//! A list is an instance of the record struct `List` holding an indexing
//!   function `at` and the number of elements `count`.
//! Indexing by a non-constant index selects among the elements at
//!   runtime;
//!     see [`select`].

use super::{scalar, select};
use crate::{
    ir::ScalarType,
    resolve::{Context, ResolveErrorKind, ResolveResult},
    sym::GlobalSymbolIntern,
    value::{Function, ResolvedPort, StructInstance, Value},
};
use std::rc::Rc;

pub(super) fn list(ctx: &mut Context, args: &[Value]) -> ResolveResult<Value> {
    let root = ctx.root().clone();

    let ty = match root.index(ctx, "List".intern())? {
        Value::Struct(s) if s.fields().len() == 2 => s,
        other => {
            return Err(ctx.error(ResolveErrorKind::TypeError(format!(
                "{} is not a list record",
                ctx.describe(&other)
            ))))
        }
    };

    let num = Value::Struct(ctx.scalar_struct(ScalarType::Num)?);
    let elements: Rc<[Value]> = args.into();

    let at = Function::native(
        "list.at",
        vec![ResolvedPort::new("index", num)],
        ctx.any(),
        Rc::new(move |ctx: &mut Context, args: &[Value]| {
            let index = match args {
                [index] => scalar(ctx, index, ScalarType::Num)?,
                _ => return Err(super::arity(ctx, "list.at", 1, args)),
            };

            select(ctx, index, &elements)
        }),
    );

    let count = Value::Instruction(ctx.graph.num(args.len() as f32));

    Ok(Value::Instance(Rc::new(StructInstance::new_unchecked(
        ty,
        vec![at, count],
    ))))
}
