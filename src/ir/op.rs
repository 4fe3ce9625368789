// Scalar operators of the instruction graph
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

//! Unary and binary operators.
//!
//! Each operator is exposed to programs as an intrinsic function whose
//!   identifier is the lowercase name of its variant
//!     (e.g. [`BinaryOp::Atan2`] is `atan2`).
//! The [`op_enum!`] macro derives those names so that they cannot drift
//!   from the variants themselves.

use super::{Constant, ScalarType};
use std::fmt::{self, Display};

macro_rules! op_enum {
    (
        $(#[$attr:meta])*
        pub enum $name:ident {
            $(
                $(#[$vattr:meta])*
                $variant:ident,
            )*
        }
    ) => {
        paste::paste! {
            $(#[$attr])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub enum $name {
                $(
                    $(#[$vattr])*
                    $variant,
                )*
            }

            impl $name {
                /// Every operator,
                ///   in declaration order.
                pub const ALL: &'static [Self] = &[$(Self::$variant,)*];

                /// Identifier of the intrinsic function implementing
                ///   this operator.
                pub fn name(self) -> &'static str {
                    match self {
                        $(
                            Self::$variant => stringify!([<$variant:lower>]),
                        )*
                    }
                }
            }

            impl Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.name())
                }
            }
        }
    };
}

op_enum! {
    /// Operators of arity one.
    pub enum UnaryOp {
        /// Boolean negation.
        Not,
        Sin,
        Cos,
        Tan,
        Asin,
        Acos,
        Atan,
        /// Natural logarithm.
        Ln,
        Abs,
        Ceil,
        Floor,
    }
}

op_enum! {
    /// Operators of arity two.
    pub enum BinaryOp {
        Add,
        Sub,
        Mul,
        Div,
        Rem,
        Pow,
        Min,
        Max,
        /// Logarithm of the first operand in the base of the second.
        Log,
        Atan2,
        And,
        Or,
        Eq,
        Neq,
        Lt,
        Leq,
        Gt,
        Geq,
    }
}

fn truth(b: bool) -> Constant {
    Constant::bool(b)
}

impl UnaryOp {
    /// Type of the value produced by this operator.
    pub fn result_type(self) -> ScalarType {
        match self {
            Self::Not => ScalarType::Bool,
            _ => ScalarType::Num,
        }
    }

    /// Type this operator expects of its operand.
    pub fn operand_type(self) -> ScalarType {
        self.result_type()
    }

    /// Evaluate this operator on a constant operand.
    pub fn eval(self, a: f32) -> Constant {
        match self {
            Self::Not if a.is_nan() => Constant::nan(ScalarType::Bool),
            Self::Not => truth(a <= 0.),
            Self::Sin => Constant::num(a.sin()),
            Self::Cos => Constant::num(a.cos()),
            Self::Tan => Constant::num(a.tan()),
            Self::Asin => Constant::num(a.asin()),
            Self::Acos => Constant::num(a.acos()),
            Self::Atan => Constant::num(a.atan()),
            Self::Ln => Constant::num(a.ln()),
            Self::Abs => Constant::num(a.abs()),
            Self::Ceil => Constant::num(a.ceil()),
            Self::Floor => Constant::num(a.floor()),
        }
    }
}

impl BinaryOp {
    pub fn result_type(self) -> ScalarType {
        use BinaryOp::*;

        match self {
            And | Or | Eq | Neq | Lt | Leq | Gt | Geq => ScalarType::Bool,
            _ => ScalarType::Num,
        }
    }

    /// Type this operator expects of both of its operands.
    pub fn operand_type(self) -> ScalarType {
        match self {
            Self::And | Self::Or => ScalarType::Bool,
            _ => ScalarType::Num,
        }
    }

    /// Evaluate this operator on two constant operands.
    ///
    /// Boolean results follow the convention that any value greater than
    ///   zero is true.
    pub fn eval(self, a: f32, b: f32) -> Constant {
        match self {
            Self::And => truth(a * b > 0.),
            Self::Or => truth((a + b) - (a * b) > 0.),
            Self::Neq => truth((a - b).abs() > 0.),
            Self::Eq => UnaryOp::Not.eval(Self::Neq.eval(a, b).value()),
            Self::Lt => truth(b - a > 0.),
            Self::Gt => truth(a - b > 0.),
            Self::Leq => UnaryOp::Not.eval(Self::Gt.eval(a, b).value()),
            Self::Geq => UnaryOp::Not.eval(Self::Lt.eval(a, b).value()),

            Self::Add => Constant::num(a + b),
            Self::Sub => Constant::num(a - b),
            Self::Mul => Constant::num(a * b),
            Self::Div => Constant::num(a / b),
            Self::Rem => Constant::num(a % b),
            Self::Pow => Constant::num((a as f64).powf(b as f64) as f32),
            Self::Min => Constant::num(a.min(b)),
            Self::Max => Constant::num(a.max(b)),
            Self::Log if a < 0. => Constant::nan(ScalarType::Num),
            Self::Log => Constant::num(((a as f64).ln() / (b as f64).ln()) as f32),
            Self::Atan2 => Constant::num(a.atan2(b)),
        }
    }
}
