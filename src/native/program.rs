// Native programs
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

//! Typed imperative programs and their execution.
//!
//! A [`Program`] is the output of [native compilation](super):
//!   a list of statements over typed mutable locals,
//!   followed by the expressions of its results.
//! Unlike the instruction graph,
//!   programs are imperative:
//!     locals are assigned in order,
//!     and loops run until a [`NativeStmt::BreakIfNot`] fails.
//!
//! Every expression has a single [`NativeType`] and operators are applied
//!   only to operands of the types declared by the
//!   [operator table](super::table);
//!     all conversions are explicit [`NativeExpr::Convert`]s.

use super::table;
use crate::ir::{BinaryOp, UnaryOp};
use std::fmt::{self, Display};

/// Representation of a native scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeType {
    F32,
    F64,
    Bool,
    I32,
}

impl Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::F32 => write!(f, "f32"),
            Self::F64 => write!(f, "f64"),
            Self::Bool => write!(f, "bool"),
            Self::I32 => write!(f, "i32"),
        }
    }
}

/// A native scalar value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    F32(f32),
    F64(f64),
    Bool(bool),
    I32(i32),
}

impl Scalar {
    pub fn ty(self) -> NativeType {
        match self {
            Self::F32(_) => NativeType::F32,
            Self::F64(_) => NativeType::F64,
            Self::Bool(_) => NativeType::Bool,
            Self::I32(_) => NativeType::I32,
        }
    }

    /// The zero value of `ty`.
    pub fn zero(ty: NativeType) -> Self {
        match ty {
            NativeType::F32 => Self::F32(0.),
            NativeType::F64 => Self::F64(0.),
            NativeType::Bool => Self::Bool(false),
            NativeType::I32 => Self::I32(0),
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Self::F32(x) => x as f64,
            Self::F64(x) => x,
            Self::Bool(b) => b as u8 as f64,
            Self::I32(i) => i as f64,
        }
    }

    /// Convert to `ty`.
    ///
    /// Numbers are true if greater than zero,
    ///   and truth is `1` or `0`.
    /// Conversion to [`NativeType::I32`] truncates toward zero,
    ///   saturating at its bounds,
    ///   with NaN converted to `0`.
    pub fn convert(self, ty: NativeType) -> Self {
        if self.ty() == ty {
            return self;
        }

        let x = self.as_f64();

        match ty {
            NativeType::F32 => Self::F32(x as f32),
            NativeType::F64 => Self::F64(x),
            NativeType::Bool => Self::Bool(x > 0.),
            NativeType::I32 => Self::I32(x as i32),
        }
    }

    /// This value as an `f32`,
    ///   converting if necessary.
    pub fn to_f32(self) -> f32 {
        match self {
            Self::F32(x) => x,
            other => other.as_f64() as f32,
        }
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::F32(x) => write!(f, "{x}f32"),
            Self::F64(x) => write!(f, "{x}f64"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::I32(i) => write!(f, "{i}i32"),
        }
    }
}

/// Index of a local of a [`Program`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalId(u32);

impl LocalId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "l{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NativeExpr {
    Const(Scalar),
    Local(LocalId),
    /// A parameter of the program by position.
    Param(u32),
    Unary(UnaryOp, Box<NativeExpr>),
    Binary(BinaryOp, Box<NativeExpr>, Box<NativeExpr>),
    Convert(NativeType, Box<NativeExpr>),
    /// `if cond { a } else { b }`
    Cond(Box<NativeExpr>, Box<NativeExpr>, Box<NativeExpr>),
    /// Multi-way selection by an [`NativeType::I32`] index,
    ///   clamped to the range of cases.
    Switch(Box<NativeExpr>, Box<[NativeExpr]>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NativeStmt {
    Assign(LocalId, NativeExpr),
    /// Repeat the statements until a [`NativeStmt::BreakIfNot`] among them
    ///   fails.
    Loop(Vec<NativeStmt>),
    /// Exit the innermost loop unless the boolean expression holds.
    BreakIfNot(NativeExpr),
}

/// A compiled native function.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    params: Vec<NativeType>,
    locals: Vec<NativeType>,
    body: Vec<NativeStmt>,
    results: Vec<NativeExpr>,
}

impl Program {
    pub fn new(params: Vec<NativeType>) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    pub fn params(&self) -> &[NativeType] {
        &self.params
    }

    pub fn body(&self) -> &[NativeStmt] {
        &self.body
    }

    pub fn results(&self) -> &[NativeExpr] {
        &self.results
    }

    pub fn local_count(&self) -> usize {
        self.locals.len()
    }

    /// Allocate a new local of type `ty`.
    pub fn local(&mut self, ty: NativeType) -> LocalId {
        let id = LocalId(self.locals.len() as u32);
        self.locals.push(ty);
        id
    }

    pub fn local_type(&self, id: LocalId) -> NativeType {
        self.locals[id.index()]
    }

    pub(super) fn set_body(
        &mut self,
        body: Vec<NativeStmt>,
        results: Vec<NativeExpr>,
    ) {
        self.body = body;
        self.results = results;
    }

    /// The type produced by `expr`.
    pub fn type_of(&self, expr: &NativeExpr) -> NativeType {
        use NativeExpr::*;

        match expr {
            Const(c) => c.ty(),
            Local(id) => self.local_type(*id),
            Param(i) => self.params[*i as usize],
            Unary(op, _) => table::unary(*op).result,
            Binary(op, _, _) => table::binary(*op).result,
            Convert(ty, _) => *ty,
            Cond(_, a, _) => self.type_of(a),
            Switch(_, cases) => cases
                .first()
                .map_or(NativeType::F32, |case| self.type_of(case)),
        }
    }

    /// Run this program with the given arguments,
    ///   producing the value of each result.
    ///
    /// Panics
    /// ======
    /// There must be exactly one argument per parameter;
    ///   arguments are converted to the parameter types.
    pub fn run(&self, args: &[Scalar]) -> Vec<Scalar> {
        if args.len() != self.params.len() {
            diagnostic_panic!(
                vec![],
                "native program expects {} argument(s), but {} were given",
                self.params.len(),
                args.len(),
            );
        }

        let mut machine = Machine {
            args: args
                .iter()
                .zip(&self.params)
                .map(|(arg, ty)| arg.convert(*ty))
                .collect(),
            locals: self.locals.iter().copied().map(Scalar::zero).collect(),
        };

        machine.exec(&self.body);
        self.results.iter().map(|expr| machine.eval(expr)).collect()
    }
}

enum Flow {
    Continue,
    Break,
}

struct Machine {
    args: Vec<Scalar>,
    locals: Vec<Scalar>,
}

impl Machine {
    fn exec(&mut self, stmts: &[NativeStmt]) -> Flow {
        for stmt in stmts {
            match stmt {
                NativeStmt::Assign(id, expr) => {
                    self.locals[id.index()] = self.eval(expr);
                }
                NativeStmt::Loop(body) => {
                    while let Flow::Continue = self.exec(body) {}
                }
                NativeStmt::BreakIfNot(cond) => {
                    let cond = self.eval(cond).convert(NativeType::Bool);

                    if cond == Scalar::Bool(false) {
                        return Flow::Break;
                    }
                }
            }
        }

        Flow::Continue
    }

    fn eval(&self, expr: &NativeExpr) -> Scalar {
        use NativeExpr::*;

        match expr {
            Const(c) => *c,
            Local(id) => self.locals[id.index()],
            Param(i) => self.args[*i as usize],
            Unary(op, a) => table::eval_unary(*op, self.eval(a)),
            Binary(op, a, b) => {
                table::eval_binary(*op, self.eval(a), self.eval(b))
            }
            Convert(ty, a) => self.eval(a).convert(*ty),
            Cond(cond, a, b) => match self.eval(cond).convert(NativeType::Bool) {
                Scalar::Bool(true) => self.eval(a),
                _ => self.eval(b),
            },
            Switch(index, cases) => {
                let i = match self.eval(index).convert(NativeType::I32) {
                    Scalar::I32(i) => i.max(0) as usize,
                    _ => 0,
                };

                self.eval(&cases[i.min(cases.len() - 1)])
            }
        }
    }
}
