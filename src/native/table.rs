// Native operator table
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

//! Native implementations of operators.
//!
//! Each operator is implemented at a fixed width:
//!   transcendental functions,
//!   rounding,
//!   and exponentiation are computed in `f64`,
//!     as with the math library of most hosts;
//!   arithmetic is computed in `f32`;
//!   and comparisons take `f32` operands to `bool`.
//! The compiler converts operands to the declared widths,
//!   so the evaluators here may assume them.

use super::program::{NativeType, Scalar};
use crate::ir::{BinaryOp, UnaryOp};
use arrayvec::ArrayVec;

use NativeType::{Bool, F32, F64};

/// Operand and result types of an operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpSignature {
    pub operands: ArrayVec<NativeType, 2>,
    pub result: NativeType,
}

impl OpSignature {
    fn new<const N: usize>(operands: [NativeType; N], result: NativeType) -> Self {
        Self {
            operands: operands.into_iter().collect(),
            result,
        }
    }
}

pub fn unary(op: UnaryOp) -> OpSignature {
    use UnaryOp::*;

    match op {
        Not => OpSignature::new([Bool], Bool),
        Abs => OpSignature::new([F32], F32),
        Sin | Cos | Tan | Asin | Acos | Atan | Ln | Ceil | Floor => {
            OpSignature::new([F64], F64)
        }
    }
}

pub fn binary(op: BinaryOp) -> OpSignature {
    use BinaryOp::*;

    match op {
        And | Or => OpSignature::new([Bool, Bool], Bool),
        Eq | Neq | Lt | Leq | Gt | Geq => OpSignature::new([F32, F32], Bool),
        Add | Sub | Mul | Div | Rem | Min | Max => {
            OpSignature::new([F32, F32], F32)
        }
        Pow | Log | Atan2 => OpSignature::new([F64, F64], F64),
    }
}

/// Evaluate a unary operator on an operand of its declared type.
pub fn eval_unary(op: UnaryOp, a: Scalar) -> Scalar {
    use Scalar as S;
    use UnaryOp::*;

    match (op, a) {
        (Not, S::Bool(a)) => S::Bool(!a),
        (Abs, S::F32(a)) => S::F32(a.abs()),
        (Sin, S::F64(a)) => S::F64(a.sin()),
        (Cos, S::F64(a)) => S::F64(a.cos()),
        (Tan, S::F64(a)) => S::F64(a.tan()),
        (Asin, S::F64(a)) => S::F64(a.asin()),
        (Acos, S::F64(a)) => S::F64(a.acos()),
        (Atan, S::F64(a)) => S::F64(a.atan()),
        (Ln, S::F64(a)) => S::F64(a.ln()),
        (Ceil, S::F64(a)) => S::F64(a.ceil()),
        (Floor, S::F64(a)) => S::F64(a.floor()),
        (op, a) => diagnostic_panic!(
            vec![],
            "native {op} applied to operand of type {}",
            a.ty()
        ),
    }
}

/// Evaluate a binary operator on operands of its declared types.
pub fn eval_binary(op: BinaryOp, a: Scalar, b: Scalar) -> Scalar {
    use BinaryOp::*;
    use Scalar as S;

    match (op, a, b) {
        (And, S::Bool(a), S::Bool(b)) => S::Bool(a && b),
        (Or, S::Bool(a), S::Bool(b)) => S::Bool(a || b),

        (Eq, S::F32(a), S::F32(b)) => S::Bool(a == b),
        (Neq, S::F32(a), S::F32(b)) => S::Bool(a != b),
        (Lt, S::F32(a), S::F32(b)) => S::Bool(a < b),
        (Leq, S::F32(a), S::F32(b)) => S::Bool(a <= b),
        (Gt, S::F32(a), S::F32(b)) => S::Bool(a > b),
        (Geq, S::F32(a), S::F32(b)) => S::Bool(a >= b),

        (Add, S::F32(a), S::F32(b)) => S::F32(a + b),
        (Sub, S::F32(a), S::F32(b)) => S::F32(a - b),
        (Mul, S::F32(a), S::F32(b)) => S::F32(a * b),
        (Div, S::F32(a), S::F32(b)) => S::F32(a / b),
        (Rem, S::F32(a), S::F32(b)) => S::F32(a % b),
        (Min, S::F32(a), S::F32(b)) => S::F32(a.min(b)),
        (Max, S::F32(a), S::F32(b)) => S::F32(a.max(b)),

        (Pow, S::F64(a), S::F64(b)) => S::F64(a.powf(b)),
        (Log, S::F64(a), _) if a < 0. => S::F64(f64::NAN),
        (Log, S::F64(a), S::F64(b)) => S::F64(a.ln() / b.ln()),
        (Atan2, S::F64(a), S::F64(b)) => S::F64(a.atan2(b)),

        (op, a, b) => diagnostic_panic!(
            vec![],
            "native {op} applied to operands of types {} and {}",
            a.ty(),
            b.ty(),
        ),
    }
}
