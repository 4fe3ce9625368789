// Control intrinsics
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

//! Selection and iteration.
//!
//! There is no control flow in the instruction graph other than
//!   [`Switch`](crate::ir::Instruction::Switch) and
//!   [`Loop`](crate::ir::Instruction::Loop);
//!     these intrinsics reduce arbitrary serializable values to them by
//!     operating on each serialized instruction independently.

use super::{arity, scalar};
use crate::{
    global,
    ir::{create_loop, select_index, InstrIx, ScalarType},
    iter::CollectAll,
    resolve::{Context, ResolveErrorKind, ResolveResult},
    sym::GlobalSymbolIntern,
    value::Value,
};

/// Select one of `options` by `selector`.
///
/// A constant selector chooses an option directly,
///   which permits options that cannot be serialized
///     (such as functions).
/// Otherwise every option must serialize to the same shape,
///   and each instruction of the result switches among the corresponding
///   instructions of the options.
///
/// Two options are selected by truth
///   (the second if the selector is positive);
///   more are selected by index,
///     clamped to the bounds of `options`.
pub(crate) fn select(
    ctx: &mut Context,
    selector: InstrIx,
    options: &[Value],
) -> ResolveResult<Value> {
    let first = match options.first() {
        Some(first) => first,
        None => {
            return Err(ctx.error(ResolveErrorKind::ArgumentOutOfRange(
                "cannot select from zero options".into(),
            )))
        }
    };

    if let Some(c) = ctx.graph.as_constant(selector).filter(|c| !c.is_nan()) {
        return Ok(options[select_index(c.value(), options.len())].clone());
    }

    if options.iter().all(|option| option == first) {
        return Ok(first.clone());
    }

    let serialized: Vec<Vec<InstrIx>> = options
        .iter()
        .map(|option| ctx.serialize(option))
        .collect_all()?;

    let width = serialized[0].len();

    if let Some(i) = serialized.iter().position(|s| s.len() != width) {
        return Err(ctx.error(ResolveErrorKind::SerializationError(format!(
            "option {i} of a selection has {} instruction(s), \
                but the first has {width}",
            serialized[i].len(),
        ))));
    }

    // Each slot must switch among operands of a single type,
    //   since the result is deserialized against the first option.
    for slot in 0..width {
        let ty = ctx.graph.ty(serialized[0][slot]);

        if let Some(i) = serialized
            .iter()
            .position(|s| ctx.graph.ty(s[slot]) != ty)
        {
            return Err(ctx.error(ResolveErrorKind::TypeError(format!(
                "option {i} of a selection has an instruction of type '{}' \
                    where the first has '{ty}'",
                ctx.graph.ty(serialized[i][slot]),
            ))));
        }
    }

    let switched = (0..width)
        .map(|slot| {
            let operands = serialized.iter().map(|s| s[slot]).collect();
            ctx.graph.switch(selector, operands)
        })
        .collect::<Vec<_>>();

    ctx.deserialize(first, &switched)
}

/// `if(condition, ifTrue, ifFalse)`
pub(super) fn if_(ctx: &mut Context, args: &[Value]) -> ResolveResult<Value> {
    match args {
        [condition, if_true, if_false] => {
            let selector = scalar(ctx, condition, ScalarType::Bool)?;
            select(ctx, selector, &[if_false.clone(), if_true.clone()])
        }
        _ => Err(arity(ctx, "if", 3, args)),
    }
}

/// `for(initial, condition, body)`
///
/// Iterates `body` over the state `initial` while `condition` of that
///   state holds,
///     yielding the final state.
/// The state may be any serializable value;
///   `body` must produce a value of the same shape.
pub(super) fn for_(ctx: &mut Context, args: &[Value]) -> ResolveResult<Value> {
    let (initial, condition, body) = match args {
        [initial, condition, body] => (initial, condition, body),
        _ => return Err(arity(ctx, "for", 3, args)),
    };

    let init = ctx.serialize(initial)?;

    let group = create_loop(
        ctx,
        &init,
        |ctx, states| {
            let state = ctx.deserialize(initial, states)?;
            let cond = condition.call(ctx, vec![state])?;
            scalar(ctx, &cond, ScalarType::Bool)
        },
        |ctx, states| {
            let state = ctx.deserialize(initial, states)?;
            let next = body.call(ctx, vec![state])?;
            let out = ctx.serialize(&next)?;

            // Validates both shape and element types against the initial
            //   state.
            ctx.deserialize(initial, &out)?;
            Ok(out)
        },
    )?;

    let elements = (0..init.len())
        .map(|i| ctx.graph.group_element(group, i as u16))
        .collect::<Vec<_>>();

    ctx.deserialize(initial, &elements)
}

/// `fold(list, initial, accumulator)`
///
/// The list is unrolled at compile time,
///   and so its `count` must be a constant
///     no greater than [`global::FOLD_UNROLL_LIMIT`].
pub(super) fn fold(ctx: &mut Context, args: &[Value]) -> ResolveResult<Value> {
    let (list, initial, accumulator) = match args {
        [list, initial, accumulator] => (list, initial, accumulator),
        _ => return Err(arity(ctx, "fold", 3, args)),
    };

    let count = list.index(ctx, "count".intern())?;
    let count_ix = scalar(ctx, &count, ScalarType::Num)?;

    let n = match ctx.graph.as_constant(count_ix) {
        Some(c)
            if c.value() >= 0.
                && c.value() <= global::FOLD_UNROLL_LIMIT as f32 =>
        {
            c.value() as usize
        }
        Some(c) => {
            return Err(ctx.error(ResolveErrorKind::ArgumentOutOfRange(format!(
                "list count {c} is not a length between 0 and {}",
                global::FOLD_UNROLL_LIMIT,
            ))))
        }
        None => {
            return Err(ctx.error(ResolveErrorKind::NotCompileConstant(format!(
                "list count {}",
                ctx.describe(&count)
            ))))
        }
    };

    let at = list.index(ctx, "at".intern())?;

    (0..n).try_fold(initial.clone(), |acc, i| {
        let index = Value::Instruction(ctx.graph.num(i as f32));
        let item = at.call(ctx, vec![index])?;

        accumulator.call(ctx, vec![acc, item])
    })
}
