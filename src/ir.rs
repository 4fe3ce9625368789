// Scalar instruction graph
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

//! Intermediate representation of scalar computations.
//!
//! Every scalar value produced by resolution is a node of a single
//!   [`InstrGraph`] owned by the compilation
//!   [`Context`](crate::resolve::Context).
//! The graph is a pure dataflow graph:
//!   nodes are [`Instruction`]s and each edge points from an instruction to
//!   one of its operands.
//!
//! The graph is _hash-consed_:
//!   adding an instruction that is structurally identical to one already
//!   present yields the existing [`InstrIx`],
//!     and so two [`InstrIx`]s are equal exactly when the instructions
//!     they denote are structurally equal.
//! This is what makes instruction identity usable for common
//!   subexpression elimination ([`cache_subexpressions`]).
//!
//! Instructions are never constructed directly by callers.
//! The constructors of [`InstrGraph`]
//!   (e.g. [`InstrGraph::binary`])
//!   _create and optimize_:
//!     constant operands are folded,
//!     NaN is propagated,
//!     and algebraic identities
//!       (such as `a + 0 = a`)
//!     are applied before a node is ever added.
//!
//! Loops
//! =====
//! Iteration is represented by an [`Instruction::Loop`] over a tuple of
//!   [`Instruction::State`] slots.
//! A loop is not itself a scalar;
//!   each slot of its final state is referenced by an
//!   [`Instruction::GroupElement`].
//! See [`create_loop`] for how loops are constructed.

mod cse;
mod group;
mod op;

pub use cse::cache_subexpressions;
pub use group::{create_loop, PROBE_SCOPE};
pub use op::{BinaryOp, UnaryOp};

use crate::{diagnose::panic::DiagnosticPanic, global};
use fixedbitset::FixedBitSet;
use fxhash::FxHashMap;
use petgraph::graph::{DiGraph, NodeIndex};
use std::fmt::{self, Debug, Display};

/// Index of an [`Instruction`] within an [`InstrGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstrIx(NodeIndex<global::InstrIxSize>);
assert_eq_size!(InstrIx, global::InstrIxSize);

impl InstrIx {
    pub fn index(self) -> usize {
        self.0.index()
    }
}

impl Display for InstrIx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index())
    }
}

/// Primitive type of a scalar instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Num,
    Bool,
}

impl ScalarType {
    /// Identifier of the intrinsic struct representing this type.
    pub fn struct_name(self) -> &'static str {
        match self {
            Self::Num => "Num",
            Self::Bool => "Bool",
        }
    }
}

impl Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.struct_name())
    }
}

/// A constant scalar.
///
/// Booleans are represented as `1` (true) and `0` (false),
///   and any value may be NaN.
/// Constants compare by bit pattern so that they may be hash-consed;
///   every NaN is normalized to a single bit pattern so that NaNs compare
///   equal to one another.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Constant {
    bits: u32,
    ty: ScalarType,
}

impl Constant {
    fn new(value: f32, ty: ScalarType) -> Self {
        let bits = match value.is_nan() {
            true => f32::NAN.to_bits(),
            false => value.to_bits(),
        };

        Self { bits, ty }
    }

    pub fn num(value: f32) -> Self {
        Self::new(value, ScalarType::Num)
    }

    pub fn bool(value: bool) -> Self {
        Self::new(if value { 1. } else { 0. }, ScalarType::Bool)
    }

    pub fn nan(ty: ScalarType) -> Self {
        Self::new(f32::NAN, ty)
    }

    pub fn value(self) -> f32 {
        f32::from_bits(self.bits)
    }

    pub fn ty(self) -> ScalarType {
        self.ty
    }

    pub fn is_nan(self) -> bool {
        self.value().is_nan()
    }
}

impl Debug for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Constant({:?}, {})", self.value(), self.ty)
    }
}

impl Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.ty, self.value()) {
            (ScalarType::Bool, v) if v.is_nan() => write!(f, "NaN"),
            (ScalarType::Bool, v) if v > 0. => write!(f, "True"),
            (ScalarType::Bool, _) => write!(f, "False"),
            (ScalarType::Num, v) => write!(f, "{v}"),
        }
    }
}

/// A node of the [`InstrGraph`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Instruction {
    Constant(Constant),

    /// A scalar supplied by the host at the given slot of the flattened
    ///   argument list.
    Input { slot: u32, ty: ScalarType },

    /// Conversion between [`ScalarType`]s.
    Cast(ScalarType, InstrIx),

    Unary(UnaryOp, InstrIx),

    Binary(BinaryOp, InstrIx, InstrIx),

    /// Select one of the operands by the value of the selector.
    ///
    /// With two operands,
    ///   a selector greater than zero selects the second;
    ///     otherwise the selector is truncated to an index and clamped to
    ///     the range of operands.
    Switch(InstrIx, Box<[InstrIx]>),

    /// Marks an instruction to be evaluated once and shared by every use.
    Cached(InstrIx),

    /// One slot of the iteration state of a loop.
    ///
    /// `scope` distinguishes the states of nested loops;
    ///   `init` is the value of the slot before the first iteration.
    State { id: u16, scope: u16, init: InstrIx },

    /// Iterate `body` over `states` for as long as `condition` holds.
    ///
    /// `states` are [`Instruction::State`] nodes and `body` holds,
    ///   for each of them,
    ///   its value for the next iteration.
    Loop {
        states: Box<[InstrIx]>,
        condition: InstrIx,
        body: Box<[InstrIx]>,
    },

    /// The final value of the given state slot of a loop.
    GroupElement(InstrIx, u16),
}

impl Instruction {
    /// Instructions referenced by this one,
    ///   in order.
    pub fn operands(&self) -> Vec<InstrIx> {
        use Instruction::*;

        match self {
            Constant(_) | Input { .. } => vec![],
            Cast(_, a) | Unary(_, a) | Cached(a) | GroupElement(a, _) => {
                vec![*a]
            }
            State { init, .. } => vec![*init],
            Binary(_, a, b) => vec![*a, *b],
            Switch(sel, ops) => {
                std::iter::once(*sel).chain(ops.iter().copied()).collect()
            }
            Loop {
                states,
                condition,
                body,
            } => states
                .iter()
                .copied()
                .chain(std::iter::once(*condition))
                .chain(body.iter().copied())
                .collect(),
        }
    }
}

/// Hash-consed dataflow graph of [`Instruction`]s.
///
/// Nodes are never removed,
///   so every [`InstrIx`] remains valid for the lifetime of the graph.
pub struct InstrGraph {
    graph: DiGraph<Instruction, (), global::InstrIxSize>,

    /// Index of every instruction by its structure.
    index: FxHashMap<Instruction, InstrIx>,
}

impl Default for InstrGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for InstrGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Whole graphs are far too large to be useful in traces.
        write!(
            f,
            "[IR: {} instructions, {} edges]",
            self.graph.node_count(),
            self.graph.edge_count(),
        )
    }
}

impl InstrGraph {
    pub fn new() -> Self {
        Self::with_capacity(global::INIT_INSTRUCTION_CAPACITY)
    }

    pub fn with_capacity(nodes: usize) -> Self {
        Self {
            graph: DiGraph::with_capacity(nodes, nodes * 2),
            index: FxHashMap::default(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Add an instruction as-is,
    ///   or retrieve the index of a structurally identical one.
    ///
    /// No optimization is performed;
    ///   prefer the create-and-optimize constructors.
    pub fn add(&mut self, instr: Instruction) -> InstrIx {
        if let Some(ix) = self.index.get(&instr) {
            return *ix;
        }

        let operands = instr.operands();
        let ix = InstrIx(self.graph.add_node(instr.clone()));

        for operand in operands {
            self.graph.add_edge(ix.0, operand.0, ());
        }

        self.index.insert(instr, ix);
        ix
    }

    pub fn get(&self, ix: InstrIx) -> &Instruction {
        match self.graph.node_weight(ix.0) {
            Some(instr) => instr,
            None => diagnostic_panic!(
                vec![],
                "instruction {ix} is not part of this graph"
            ),
        }
    }

    /// The constant denoted by `ix`,
    ///   if any.
    pub fn as_constant(&self, ix: InstrIx) -> Option<Constant> {
        match self.get(ix) {
            Instruction::Constant(c) => Some(*c),
            _ => None,
        }
    }

    /// The type of the scalar produced by `ix`.
    ///
    /// Panics
    /// ======
    /// A [`Instruction::Loop`] does not produce a scalar;
    ///   only its [`Instruction::GroupElement`]s do.
    pub fn ty(&self, ix: InstrIx) -> ScalarType {
        use Instruction::*;

        match self.get(ix) {
            Constant(c) => c.ty(),
            Input { ty, .. } | Cast(ty, _) => *ty,
            Unary(op, _) => op.result_type(),
            Binary(op, _, _) => op.result_type(),
            Switch(_, ops) => self.ty(ops[0]),
            Cached(a) | State { init: a, .. } => self.ty(*a),
            GroupElement(group, i) => match self.get(*group) {
                Loop { states, .. } => self.ty(states[*i as usize]),
                other => diagnostic_panic!(
                    vec![],
                    "group element {i} of {ix} references non-group {other:?}"
                ),
            },
            Loop { .. } => diagnostic_panic!(
                vec![],
                "loop {ix} does not produce a scalar; \
                    use its group elements instead"
            ),
        }
    }

    pub fn constant(&mut self, c: Constant) -> InstrIx {
        self.add(Instruction::Constant(c))
    }

    pub fn num(&mut self, value: f32) -> InstrIx {
        self.constant(Constant::num(value))
    }

    pub fn bool(&mut self, value: bool) -> InstrIx {
        self.constant(Constant::bool(value))
    }

    pub fn input(&mut self, slot: u32, ty: ScalarType) -> InstrIx {
        self.add(Instruction::Input { slot, ty })
    }

    pub fn unary(&mut self, op: UnaryOp, a: InstrIx) -> InstrIx {
        match self.as_constant(a) {
            Some(c) => self.constant(op.eval(c.value())),
            None => self.add(Instruction::Unary(op, a)),
        }
    }

    pub fn binary(&mut self, op: BinaryOp, a: InstrIx, b: InstrIx) -> InstrIx {
        let (ca, cb) = (self.as_constant(a), self.as_constant(b));
        let (va, vb) = (ca.map(Constant::value), cb.map(Constant::value));

        if ca.map_or(false, Constant::is_nan) || cb.map_or(false, Constant::is_nan)
        {
            return self.constant(Constant::nan(op.result_type()));
        }

        if let (Some(x), Some(y)) = (va, vb) {
            return self.constant(op.eval(x, y));
        }

        match op {
            BinaryOp::Pow if vb == Some(0.) || va == Some(1.) => self.num(1.),
            BinaryOp::Pow if va == Some(0.) => self.num(0.),
            BinaryOp::Pow if vb == Some(1.) => a,
            BinaryOp::Pow if vb == Some(2.) => {
                self.add(Instruction::Binary(BinaryOp::Mul, a, a))
            }

            BinaryOp::Add if va == Some(0.) => b,
            BinaryOp::Add if vb == Some(0.) => a,

            BinaryOp::Sub if vb == Some(0.) => a,

            BinaryOp::Mul if va == Some(0.) || vb == Some(0.) => self.num(0.),
            BinaryOp::Mul if va == Some(1.) => b,
            BinaryOp::Mul if vb == Some(1.) => a,

            BinaryOp::Div if vb == Some(1.) => a,
            BinaryOp::Div if vb.is_some() => {
                let recip = self.num(1. / vb.unwrap_or(1.));
                self.add(Instruction::Binary(BinaryOp::Mul, a, recip))
            }

            BinaryOp::Rem if va == Some(0.) => self.num(0.),

            BinaryOp::Log if va == Some(1.) => self.num(0.),
            BinaryOp::Log if va.map_or(false, |x| x < 0.) => {
                self.constant(Constant::nan(ScalarType::Num))
            }

            _ => self.add(Instruction::Binary(op, a, b)),
        }
    }

    /// Select among `operands` by `selector`.
    ///
    /// Panics
    /// ======
    /// There must be at least one operand;
    ///   callers are expected to have diagnosed empty selections.
    pub fn switch(&mut self, selector: InstrIx, operands: Vec<InstrIx>) -> InstrIx {
        let first = *operands.first().diagnostic_expect(
            vec![],
            "switch requires at least one operand",
        );

        if operands.iter().all(|op| *op == first) {
            return first;
        }

        match self.as_constant(selector) {
            Some(c) if !c.is_nan() => {
                operands[select_index(c.value(), operands.len())]
            }
            _ => self.add(Instruction::Switch(selector, operands.into())),
        }
    }

    pub fn cast(&mut self, ty: ScalarType, a: InstrIx) -> InstrIx {
        if self.ty(a) == ty {
            return a;
        }

        match (ty, self.as_constant(a)) {
            (ScalarType::Bool, Some(c)) if c.is_nan() => {
                self.constant(Constant::nan(ScalarType::Bool))
            }
            (ScalarType::Bool, Some(c)) => self.bool(c.value() > 0.),
            (ScalarType::Num, Some(c)) => self.num(c.value()),
            (_, None) => self.add(Instruction::Cast(ty, a)),
        }
    }

    /// Mark `a` to be evaluated only once.
    ///
    /// Leaves and instructions that are already cached are returned
    ///   unchanged.
    pub fn cached(&mut self, a: InstrIx) -> InstrIx {
        use Instruction::*;

        match self.get(a) {
            Constant(_) | Input { .. } | State { .. } | Cached(_) => a,
            _ => self.add(Cached(a)),
        }
    }

    /// Largest scope of any [`Instruction::State`] reachable from `roots`,
    ///   ignoring states of scope `exclude`.
    pub fn max_state_scope(
        &self,
        roots: &[InstrIx],
        exclude: u16,
    ) -> Option<u16> {
        let mut visited = FixedBitSet::with_capacity(self.graph.node_count());
        let mut stack: Vec<_> = roots.iter().map(|ix| ix.0).collect();
        let mut max = None;

        while let Some(node) = stack.pop() {
            if visited.put(node.index()) {
                continue;
            }

            if let Instruction::State { scope, .. } = self.graph[node] {
                if scope != exclude {
                    max = max.max(Some(scope));
                }
            }

            stack.extend(self.graph.neighbors(node));
        }

        max
    }

    /// A human-readable rendering of the instruction `ix`,
    ///   expanding operands up to a fixed depth.
    pub fn summary(&self, ix: InstrIx) -> String {
        self.summary_depth(ix, 4)
    }

    fn summary_depth(&self, ix: InstrIx, depth: usize) -> String {
        use Instruction::*;

        if depth == 0 {
            return ix.to_string();
        }

        let sub = |x: &InstrIx| self.summary_depth(*x, depth - 1);

        match self.get(ix) {
            Constant(c) => c.to_string(),
            Input { slot, ty } => format!("in{slot}:{ty}"),
            Cast(ty, a) => format!("{ty}({})", sub(a)),
            Unary(op, a) => format!("{op}({})", sub(a)),
            Binary(op, a, b) => format!("{op}({}, {})", sub(a), sub(b)),
            Switch(sel, ops) => format!(
                "switch({})[{}]",
                sub(sel),
                ops.iter().map(sub).collect::<Vec<_>>().join(", ")
            ),
            Cached(a) => format!("cached({})", sub(a)),
            State { id, scope, .. } => format!("state{scope}.{id}"),
            Loop { states, .. } => format!("loop{ix}/{}", states.len()),
            GroupElement(group, i) => format!("{}.{i}", sub(group)),
        }
    }
}

/// Index selected by a constant `selector` among `len` operands.
pub(crate) fn select_index(selector: f32, len: usize) -> usize {
    match len {
        2 if selector > 0. => 1,
        2 => 0,
        _ => (selector.max(0.) as usize).min(len - 1),
    }
}
