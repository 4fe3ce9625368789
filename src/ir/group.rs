// Loop construction
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

//! Construction of [`Instruction::Loop`] groups.
//!
//! A loop is described by the serialized initial state and two functions
//!   of the current state:
//!     the condition under which iteration continues,
//!     and the state of the next iteration.
//! Those functions are evaluated _symbolically_ over
//!   [`Instruction::State`] placeholders,
//!     producing the loop's condition and body as instructions.
//!
//! Construction proceeds in three evaluations:
//!
//!   1. The condition is evaluated over states of the reserved
//!        [`PROBE_SCOPE`].
//!      If it folds to the constant `True`,
//!        the loop could never terminate.
//!   2. Body and condition are evaluated over probe states,
//!        and every _other_ state they reach belongs to an enclosing loop.
//!      The scope of this loop must differ from all of those,
//!        and so it is one greater than the largest of them.
//!   3. Body and condition are evaluated again over states of the final
//!        scope.

use super::{Constant, InstrGraph, InstrIx, Instruction};
use crate::{
    iter::Accumulate,
    resolve::{Context, ResolveErrorKind, ResolveResult},
};
use std::iter;

/// Scope of the placeholder states used while probing a loop.
///
/// No finished loop is ever assigned this scope.
pub const PROBE_SCOPE: u16 = u16::MAX;

impl InstrGraph {
    pub fn state(&mut self, id: u16, scope: u16, init: InstrIx) -> InstrIx {
        self.add(Instruction::State { id, scope, init })
    }

    /// Reference the final value of slot `i` of the loop `group`.
    ///
    /// Panics
    /// ======
    /// `group` must be a loop with more than `i` states.
    pub fn group_element(&mut self, group: InstrIx, i: u16) -> InstrIx {
        match self.get(group) {
            Instruction::Loop { states, .. } if (i as usize) < states.len() => {
                self.add(Instruction::GroupElement(group, i))
            }
            other => diagnostic_panic!(
                vec![],
                "group element {i} is out of range of {group} ({other:?})"
            ),
        }
    }
}

/// Create a loop over `initial` states.
///
/// `condition` and `body` are functions of the current state;
///   see the [module-level documentation](self) for the protocol by which
///   they are evaluated.
/// The loop itself is returned;
///   use [`InstrGraph::group_element`] to reference its results.
///
/// `body` must yield exactly one instruction per state.
pub fn create_loop<C, B>(
    ctx: &mut Context,
    initial: &[InstrIx],
    mut condition: C,
    mut body: B,
) -> ResolveResult<InstrIx>
where
    C: FnMut(&mut Context, &[InstrIx]) -> ResolveResult<InstrIx>,
    B: FnMut(&mut Context, &[InstrIx]) -> ResolveResult<Vec<InstrIx>>,
{
    let probe = states(ctx, initial, PROBE_SCOPE)?;
    let probed = condition(ctx, &probe)?;

    if ctx.graph.as_constant(probed) == Some(Constant::bool(true)) {
        return Err(ctx.error(ResolveErrorKind::InfiniteLoop(
            "loop condition is always true".into(),
        )));
    }

    let (cond, next) = iterate(ctx, &probe, &mut condition, &mut body)?;
    let roots: Vec<_> = next.iter().copied().chain(iter::once(cond)).collect();

    let scope = match ctx.graph.max_state_scope(&roots, PROBE_SCOPE) {
        None => 0,
        Some(outer) if outer + 1 < PROBE_SCOPE => outer + 1,
        Some(outer) => diagnostic_panic!(
            vec![],
            "loop scopes exhausted: enclosing loop has scope {outer}"
        ),
    };

    let states = states(ctx, initial, scope)?;
    let (cond, next) = iterate(ctx, &states, &mut condition, &mut body)?;

    Ok(ctx.graph.add(Instruction::Loop {
        states: states.into(),
        condition: cond,
        body: next.into(),
    }))
}

fn states(
    ctx: &mut Context,
    initial: &[InstrIx],
    scope: u16,
) -> ResolveResult<Vec<InstrIx>> {
    initial
        .iter()
        .enumerate()
        .map(|(i, init)| match u16::try_from(i) {
            Ok(id) => Ok(ctx.graph.state(id, scope, *init)),
            Err(_) => Err(ctx.error(ResolveErrorKind::ArgumentOutOfRange(
                format!("loop state has more than {} slots", u16::MAX),
            ))),
        })
        .collect()
}

/// Evaluate one symbolic iteration,
///   reporting failures of both the body and the condition.
fn iterate<C, B>(
    ctx: &mut Context,
    states: &[InstrIx],
    condition: &mut C,
    body: &mut B,
) -> ResolveResult<(InstrIx, Vec<InstrIx>)>
where
    C: FnMut(&mut Context, &[InstrIx]) -> ResolveResult<InstrIx>,
    B: FnMut(&mut Context, &[InstrIx]) -> ResolveResult<Vec<InstrIx>>,
{
    let next = body(ctx, states);
    let cond = condition(ctx, states);

    match (next, cond) {
        (Ok(next), Ok(cond)) if next.len() == states.len() => Ok((cond, next)),
        (Ok(next), Ok(_)) => diagnostic_panic!(
            vec![],
            "loop body produced {} states, but the loop has {}",
            next.len(),
            states.len(),
        ),
        (Err(mut e), Err(e2)) => {
            e.accumulate(e2);
            Err(e)
        }
        (Err(e), Ok(_)) | (Ok(_), Err(e)) => Err(e),
    }
}
