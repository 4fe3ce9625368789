// Native compilation backend
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

//! Compilation of the instruction graph into native [`Program`]s.
//!
//! The instruction graph is a pure dataflow graph;
//!   a [`Program`] is a sequence of statements over mutable locals.
//! Compilation walks the graph from its roots:
//!
//!   - constants, inputs and operators become [`NativeExpr`]s,
//!       with explicit [conversions](NativeExpr::Convert) to the widths
//!       declared by the [operator table](table);
//!   - [`Instruction::Cached`] nodes are assigned to a local the first time
//!       they are encountered and read from it thereafter;
//!   - switches become [conditionals](NativeExpr::Cond) or
//!       [multi-way switches](NativeExpr::Switch);
//!   - and loops become [`NativeStmt::Loop`]s.
//!
//! Every scalar is represented natively by the canonical type of its
//!   [`ScalarType`]
//!     (see [`native_type`]).
//!
//! Loops
//! =====
//! Each state of a loop is held in a local that is assigned its initial
//!   value before the loop.
//! Within the loop,
//!   the condition is computed and the loop exits if it does not hold;
//!   the value of every state for the next iteration is then computed
//!     into a temporary,
//!   and only after all of them have been computed are the states
//!     assigned.
//! State updates are therefore atomic:
//!   no part of the body observes a state of the _next_ iteration.
//!
//! Locals computed within a loop are only valid within it,
//!   and so each loop is compiled with a private copy of the cache that is
//!   discarded when the loop ends.

mod program;
mod table;

pub use program::{
    LocalId, NativeExpr, NativeStmt, NativeType, Program, Scalar,
};
pub use table::{binary, eval_binary, eval_unary, unary, OpSignature};

use crate::ir::{
    cache_subexpressions, InstrGraph, InstrIx, Instruction, ScalarType,
};
use fxhash::FxHashMap;
use std::rc::Rc;

/// Native representation of a scalar of type `ty`.
pub fn native_type(ty: ScalarType) -> NativeType {
    match ty {
        ScalarType::Num => NativeType::F32,
        ScalarType::Bool => NativeType::Bool,
    }
}

/// Compile the instructions `roots` into a [`Program`] producing one
///   result per root.
///
/// `params` are the native types of the values that the host supplies for
///   each [`Instruction::Input`] slot.
/// If `cse` is set,
///   common subexpressions are [cached](cache_subexpressions) first.
///
/// Panics
/// ======
/// Every input slot must be within `params`,
///   and every [`Instruction::State`] must be reachable only through its
///   loop.
/// Both are guaranteed for graphs produced by resolution.
pub fn compile(
    graph: &mut InstrGraph,
    params: Vec<NativeType>,
    roots: &[InstrIx],
    cse: bool,
) -> Program {
    let roots = match cse {
        true => cache_subexpressions(graph, roots),
        false => roots.to_vec(),
    };

    let mut compiler = Compiler {
        graph,
        program: Program::new(params),
        scope: Scope::default(),
    };

    let mut body = Vec::new();
    let results = roots
        .iter()
        .map(|root| compiler.expr(*root, &mut body))
        .collect();

    let mut program = compiler.program;
    program.set_body(body, results);
    program
}

/// Locals visible at some point of compilation.
#[derive(Debug, Default, Clone)]
struct Scope {
    cached: FxHashMap<InstrIx, LocalId>,
    states: FxHashMap<(u16, u16), LocalId>,
    groups: FxHashMap<InstrIx, Rc<[LocalId]>>,
}

struct Compiler<'g> {
    graph: &'g InstrGraph,
    program: Program,
    scope: Scope,
}

impl<'g> Compiler<'g> {
    /// Convert `expr` to `ty` unless it already is.
    fn coerce(&self, expr: NativeExpr, ty: NativeType) -> NativeExpr {
        match self.program.type_of(&expr) == ty {
            true => expr,
            false => NativeExpr::Convert(ty, Box::new(expr)),
        }
    }

    /// An expression computing `ix`,
    ///   appending to `out` any statements it depends on.
    ///
    /// The expression is of the [canonical type](native_type) of `ix`.
    fn expr(&mut self, ix: InstrIx, out: &mut Vec<NativeStmt>) -> NativeExpr {
        use Instruction as I;
        use NativeExpr as E;

        let graph = self.graph;

        match graph.get(ix) {
            I::Constant(c) => E::Const(match c.ty() {
                ScalarType::Num => Scalar::F32(c.value()),
                ScalarType::Bool => Scalar::Bool(c.value() > 0.),
            }),

            &I::Input { slot, ty } => {
                if slot as usize >= self.program.params().len() {
                    diagnostic_panic!(
                        vec![],
                        "input slot {slot} is out of range of {} parameter(s)",
                        self.program.params().len(),
                    );
                }

                self.coerce(E::Param(slot), native_type(ty))
            }

            &I::Cast(ty, a) => {
                let a = self.expr(a, out);
                self.coerce(a, native_type(ty))
            }

            &I::Unary(op, a) => {
                let sig = table::unary(op);
                let a = self.operand(a, sig.operands[0], out);

                self.coerce(E::Unary(op, Box::new(a)), native_type(op.result_type()))
            }

            &I::Binary(op, a, b) => {
                let sig = table::binary(op);
                let a = self.operand(a, sig.operands[0], out);
                let b = self.operand(b, sig.operands[1], out);

                self.coerce(
                    E::Binary(op, Box::new(a), Box::new(b)),
                    native_type(op.result_type()),
                )
            }

            I::Switch(sel, ops) => match &ops[..] {
                [only] => self.expr(*only, out),
                [if_false, if_true] => {
                    let cond = self.operand(*sel, NativeType::Bool, out);
                    let a = self.expr(*if_true, out);
                    let b = self.expr(*if_false, out);

                    E::Cond(Box::new(cond), Box::new(a), Box::new(b))
                }
                ops => {
                    let index = self.operand(*sel, NativeType::I32, out);
                    let cases = ops
                        .iter()
                        .map(|op| self.expr(*op, out))
                        .collect::<Vec<_>>();

                    E::Switch(Box::new(index), cases.into())
                }
            },

            &I::Cached(a) => match self.scope.cached.get(&ix) {
                Some(local) => E::Local(*local),
                None => {
                    let value = self.expr(a, out);
                    let local = self.program.local(self.program.type_of(&value));

                    out.push(NativeStmt::Assign(local, value));
                    self.scope.cached.insert(ix, local);
                    E::Local(local)
                }
            },

            &I::State { id, scope, .. } => match self.scope.states.get(&(scope, id)) {
                Some(local) => E::Local(*local),
                None => diagnostic_panic!(
                    vec![],
                    "state {scope}.{id} ({ix}) referenced outside of its loop",
                ),
            },

            &I::GroupElement(group, i) => {
                let locals = self.group(group, out);

                match locals.get(i as usize) {
                    Some(local) => E::Local(*local),
                    None => diagnostic_panic!(
                        vec![],
                        "group element {i} is out of range of loop {group}",
                    ),
                }
            }

            I::Loop { .. } => diagnostic_panic!(
                vec![],
                "loop {ix} used as a scalar; \
                    only its group elements produce values",
            ),
        }
    }

    /// An expression computing `ix` converted to `ty`.
    fn operand(
        &mut self,
        ix: InstrIx,
        ty: NativeType,
        out: &mut Vec<NativeStmt>,
    ) -> NativeExpr {
        let expr = self.expr(ix, out);
        self.coerce(expr, ty)
    }

    /// Locals holding the states of the loop `group`,
    ///   compiling the loop if it has not yet been.
    fn group(
        &mut self,
        group: InstrIx,
        out: &mut Vec<NativeStmt>,
    ) -> Rc<[LocalId]> {
        if let Some(locals) = self.scope.groups.get(&group) {
            return locals.clone();
        }

        let graph = self.graph;

        let (states, condition, body) = match graph.get(group) {
            Instruction::Loop {
                states,
                condition,
                body,
            } => (states, *condition, body),
            other => diagnostic_panic!(
                vec![],
                "group element references non-loop {group} ({other:?})",
            ),
        };

        // Initial values are computed outside of the loop.
        let state_locals = states
            .iter()
            .map(|state| match graph.get(*state) {
                &Instruction::State { id, scope, init } => {
                    let value = self.expr(init, out);
                    let local = self.program.local(self.program.type_of(&value));

                    out.push(NativeStmt::Assign(local, value));
                    ((scope, id), local)
                }
                other => diagnostic_panic!(
                    vec![],
                    "loop {group} has non-state {state} ({other:?})",
                ),
            })
            .collect::<Vec<_>>();

        let outer = self.scope.clone();

        self.scope.states.extend(state_locals.iter().copied());

        let mut stmts = Vec::new();

        let cond = self.operand(condition, NativeType::Bool, &mut stmts);
        stmts.push(NativeStmt::BreakIfNot(cond));

        let temps = body
            .iter()
            .map(|next| {
                let value = self.expr(*next, &mut stmts);
                let temp = self.program.local(self.program.type_of(&value));

                stmts.push(NativeStmt::Assign(temp, value));
                temp
            })
            .collect::<Vec<_>>();

        stmts.extend(state_locals.iter().zip(temps).map(|((_, local), temp)| {
            let ty = self.program.local_type(*local);
            NativeStmt::Assign(*local, self.coerce(NativeExpr::Local(temp), ty))
        }));

        out.push(NativeStmt::Loop(stmts));
        self.scope = outer;

        let locals: Rc<[LocalId]> =
            state_locals.into_iter().map(|(_, local)| local).collect();

        self.scope.groups.insert(group, locals.clone());
        locals
    }
}

#[cfg(test)]
mod test;
