// Common subexpression elimination
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

//! Common subexpression elimination.
//!
//! Since the graph is hash-consed,
//!   every structurally identical subexpression already shares a single
//!   [`InstrIx`].
//! What remains is to tell the backend to evaluate each of them only once,
//!   which is done by wrapping every non-leaf instruction in an
//!   [`Instruction::Cached`].
//!
//! This is required for loops,
//!   not just an optimization:
//!     the condition and body of a loop must observe the same value of
//!     any shared term within an iteration.

use super::{InstrGraph, InstrIx, Instruction};
use fxhash::FxHashMap;

/// Rewrite `roots` so that every non-leaf instruction reachable from them
///   is [cached](InstrGraph::cached).
///
/// The rewritten roots are returned in the same order.
pub fn cache_subexpressions(
    graph: &mut InstrGraph,
    roots: &[InstrIx],
) -> Vec<InstrIx> {
    let mut memo = FxHashMap::default();

    roots
        .iter()
        .map(|root| cache(graph, &mut memo, *root))
        .collect()
}

fn cache(
    graph: &mut InstrGraph,
    memo: &mut FxHashMap<InstrIx, InstrIx>,
    ix: InstrIx,
) -> InstrIx {
    use Instruction::*;

    if let Some(done) = memo.get(&ix) {
        return *done;
    }

    let mut sub = |graph: &mut InstrGraph, x: InstrIx| cache(graph, memo, x);

    let result = match graph.get(ix).clone() {
        Constant(_) | Input { .. } | Cached(_) => ix,

        State { id, scope, init } => {
            let init = sub(graph, init);
            graph.state(id, scope, init)
        }

        Cast(ty, a) => {
            let a = sub(graph, a);
            let x = graph.cast(ty, a);
            graph.cached(x)
        }

        Unary(op, a) => {
            let a = sub(graph, a);
            let x = graph.unary(op, a);
            graph.cached(x)
        }

        Binary(op, a, b) => {
            let (a, b) = (sub(graph, a), sub(graph, b));
            let x = graph.binary(op, a, b);
            graph.cached(x)
        }

        Switch(sel, ops) => {
            let sel = sub(graph, sel);
            let ops = ops.iter().map(|op| sub(graph, *op)).collect();
            let x = graph.switch(sel, ops);
            graph.cached(x)
        }

        Loop {
            states,
            condition,
            body,
        } => {
            let states: Vec<_> = states.iter().map(|s| sub(graph, *s)).collect();
            let condition = sub(graph, condition);
            let body: Vec<_> = body.iter().map(|b| sub(graph, *b)).collect();

            graph.add(Loop {
                states: states.into(),
                condition,
                body: body.into(),
            })
        }

        GroupElement(group, i) => {
            let group = sub(graph, group);
            graph.add(GroupElement(group, i))
        }
    };

    memo.insert(ix, result);
    result
}
