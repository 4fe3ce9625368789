// Intrinsic registry
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

//! Natively implemented declarations.
//!
//! A declaration with an intrinsic body is bound at resolution time to the
//!   entry of an [`IntrinsicRegistry`] having its fully qualified
//!   identifier
//!     (e.g. `Num.add`).
//! The registry is an ordinary object provided to
//!   [`Context::new`](crate::resolve::Context::new);
//!     there is no global registry.
//! A declaration with no corresponding entry,
//!   or whose entry is of a different kind,
//!   fails to resolve.
//!
//! [`IntrinsicRegistry::with_defaults`] provides the intrinsics declared by
//!   [`prelude`]:
//!
//!   - the constraint `Any`;
//!   - the scalar structs `Num` and `Bool`,
//!       whose associated scopes hold the operators applicable to them;
//!   - every [`UnaryOp`] and [`BinaryOp`] as a function of the same
//!       lowercase name;
//!   - the constants `True`, `False`, `NaN`, `PositiveInfinity` and
//!       `NegativeInfinity`;
//!   - `list` and its record struct `List`;
//!   - the control functions `if`, `for` and `fold`;
//!   - `memberwise`; and
//!   - `uncurry`.

mod control;
mod list;
mod memberwise;

use crate::{
    decl::{Decl, Expr, PortDecl},
    ir::{BinaryOp, InstrIx, ScalarType, UnaryOp},
    iter::CollectAll,
    resolve::{Context, ResolveErrorKind, ResolveErrors, ResolveResult},
    value::{self, NativeFn, Value},
};
use fxhash::FxHashMap;
use std::{fmt, rc::Rc};

pub(crate) use control::select;

/// Intrinsic implementation of a struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntrinsicStruct {
    /// A scalar type whose values are instructions.
    Scalar(ScalarType),
    /// A struct whose instances are ordinary records,
    ///   but which are constructed by other intrinsics.
    Record,
}

/// Intrinsic implementation of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntrinsicConstraint {
    Any,
}

#[derive(Clone)]
pub enum Intrinsic {
    Function(NativeFn),
    Struct(IntrinsicStruct),
    Constraint(IntrinsicConstraint),
}

impl Intrinsic {
    fn kind(&self) -> &'static str {
        match self {
            Self::Function(_) => "function",
            Self::Struct(_) => "struct",
            Self::Constraint(_) => "constraint",
        }
    }
}

impl fmt::Debug for Intrinsic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function(_) => write!(f, "Function"),
            Self::Struct(s) => write!(f, "Struct({s:?})"),
            Self::Constraint(c) => write!(f, "Constraint({c:?})"),
        }
    }
}

/// Intrinsics keyed by fully qualified identifier.
#[derive(Debug, Default, Clone)]
pub struct IntrinsicRegistry {
    entries: FxHashMap<String, Intrinsic>,
}

impl IntrinsicRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry of every intrinsic declared by [`prelude`].
    pub fn with_defaults() -> Self {
        let mut reg = Self::new();

        reg.register("Any", Intrinsic::Constraint(IntrinsicConstraint::Any));
        reg.register("List", Intrinsic::Struct(IntrinsicStruct::Record));

        for ty in [ScalarType::Num, ScalarType::Bool] {
            reg.register(
                ty.struct_name(),
                Intrinsic::Struct(IntrinsicStruct::Scalar(ty)),
            );
        }

        for &op in UnaryOp::ALL {
            let f = unary(op);

            reg.register(op.name(), Intrinsic::Function(f.clone()));
            reg.register(
                format!("{}.{}", op.operand_type(), op.name()),
                Intrinsic::Function(f),
            );
        }

        for &op in BinaryOp::ALL {
            let f = binary(op);

            reg.register(op.name(), Intrinsic::Function(f.clone()));
            reg.register(
                format!("{}.{}", op.operand_type(), op.name()),
                Intrinsic::Function(f),
            );
        }

        let consts = [
            ("True", ScalarType::Bool, 1.),
            ("False", ScalarType::Bool, 0.),
            ("NaN", ScalarType::Num, f32::NAN),
            ("PositiveInfinity", ScalarType::Num, f32::INFINITY),
            ("NegativeInfinity", ScalarType::Num, f32::NEG_INFINITY),
        ];

        for (name, ty, value) in consts {
            let f = constant(ty, value);

            reg.register(name, Intrinsic::Function(f.clone()));
            reg.register(format!("{ty}.{name}"), Intrinsic::Function(f));
        }

        reg.register_function("list", list::list);
        reg.register_function("if", control::if_);
        reg.register_function("for", control::for_);
        reg.register_function("fold", control::fold);
        reg.register_function("memberwise", memberwise::memberwise);
        reg.register_function("uncurry", |ctx, args| match args {
            [a, b] => value::uncurry(ctx, a, b),
            _ => Err(arity(ctx, "uncurry", 2, args)),
        });

        reg
    }

    /// Register an intrinsic,
    ///   replacing and returning any previous intrinsic of the same name.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        intrinsic: Intrinsic,
    ) -> Option<Intrinsic> {
        self.entries.insert(name.into(), intrinsic)
    }

    /// Register a native function.
    pub fn register_function<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&mut Context, &[Value]) -> ResolveResult<Value> + 'static,
    {
        self.register(name, Intrinsic::Function(Rc::new(f)));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get(&self, name: &str, kind: &str) -> Result<&Intrinsic, ResolveErrorKind> {
        self.entries.get(name).ok_or_else(|| {
            ResolveErrorKind::IntrinsicNotFound(format!("{kind} '{name}'"))
        })
    }

    fn mismatch(name: &str, expected: &str, found: &Intrinsic) -> ResolveErrorKind {
        ResolveErrorKind::TypeError(format!(
            "intrinsic '{name}' is a {}, but was declared as a {expected}",
            found.kind()
        ))
    }

    pub fn function(&self, name: &str) -> Result<NativeFn, ResolveErrorKind> {
        match self.get(name, "function")? {
            Intrinsic::Function(f) => Ok(f.clone()),
            other => Err(Self::mismatch(name, "function", other)),
        }
    }

    pub fn structure(&self, name: &str) -> Result<IntrinsicStruct, ResolveErrorKind> {
        match self.get(name, "struct")? {
            Intrinsic::Struct(s) => Ok(*s),
            other => Err(Self::mismatch(name, "struct", other)),
        }
    }

    pub fn constraint(
        &self,
        name: &str,
    ) -> Result<IntrinsicConstraint, ResolveErrorKind> {
        match self.get(name, "constraint")? {
            Intrinsic::Constraint(c) => Ok(*c),
            other => Err(Self::mismatch(name, "constraint", other)),
        }
    }
}

/// Declarations of every intrinsic provided by
///   [`IntrinsicRegistry::with_defaults`].
///
/// Programs are expected to include these alongside their own
///   declarations.
pub fn prelude() -> Vec<Decl> {
    let unary_decl = |op: UnaryOp| {
        let ty = op.operand_type().struct_name();

        Decl::intrinsic_function(
            op.name(),
            vec![PortDecl::of("a", ty)],
            Some(Expr::ident(op.result_type().struct_name())),
        )
    };

    let binary_decl = |op: BinaryOp| {
        let ty = op.operand_type().struct_name();

        Decl::intrinsic_function(
            op.name(),
            vec![PortDecl::of("a", ty), PortDecl::of("b", ty)],
            Some(Expr::ident(op.result_type().struct_name())),
        )
    };

    let const_decl = |name: &str, ty: ScalarType| {
        Decl::intrinsic_value(name, Some(Expr::ident(ty.struct_name())))
    };

    let members_of = |ty: ScalarType| {
        let unaries = UnaryOp::ALL
            .iter()
            .filter(|op| op.operand_type() == ty)
            .map(|op| unary_decl(*op));

        let binaries = BinaryOp::ALL
            .iter()
            .filter(|op| op.operand_type() == ty)
            .map(|op| binary_decl(*op));

        unaries.chain(binaries).collect::<Vec<_>>()
    };

    let mut num = members_of(ScalarType::Num);
    num.extend([
        const_decl("NaN", ScalarType::Num),
        const_decl("PositiveInfinity", ScalarType::Num),
        const_decl("NegativeInfinity", ScalarType::Num),
    ]);

    let mut bool_ = members_of(ScalarType::Bool);
    bool_.extend([
        const_decl("True", ScalarType::Bool),
        const_decl("False", ScalarType::Bool),
    ]);

    let mut decls = vec![
        Decl::intrinsic_constraint("Any"),
        Decl::intrinsic_struct("Num", num),
        Decl::intrinsic_struct("Bool", bool_),
        Decl::intrinsic_struct("List", vec![])
            .with_ports(vec![PortDecl::new("at"), PortDecl::new("count")]),
        Decl::intrinsic_function(
            "list",
            vec![PortDecl::variadic()],
            Some(Expr::ident("List")),
        ),
        Decl::intrinsic_function(
            "if",
            vec![
                PortDecl::of("condition", "Bool"),
                PortDecl::new("ifTrue"),
                PortDecl::new("ifFalse"),
            ],
            None,
        ),
        Decl::intrinsic_function(
            "for",
            vec![
                PortDecl::new("initial"),
                PortDecl::new("condition"),
                PortDecl::new("body"),
            ],
            None,
        ),
        Decl::intrinsic_function(
            "fold",
            vec![
                PortDecl::of("list", "List"),
                PortDecl::new("initial"),
                PortDecl::new("accumulator"),
            ],
            None,
        ),
        Decl::intrinsic_function(
            "memberwise",
            vec![PortDecl::new("function"), PortDecl::variadic()],
            None,
        ),
        Decl::intrinsic_function(
            "uncurry",
            vec![PortDecl::new("a"), PortDecl::new("b")],
            None,
        ),
    ];

    decls.extend(UnaryOp::ALL.iter().map(|op| unary_decl(*op)));
    decls.extend(BinaryOp::ALL.iter().map(|op| binary_decl(*op)));
    decls.extend([
        const_decl("True", ScalarType::Bool),
        const_decl("False", ScalarType::Bool),
        const_decl("NaN", ScalarType::Num),
        const_decl("PositiveInfinity", ScalarType::Num),
        const_decl("NegativeInfinity", ScalarType::Num),
    ]);

    decls
}

fn arity(
    ctx: &Context,
    name: &str,
    expected: usize,
    args: &[Value],
) -> ResolveErrors {
    ctx.error(ResolveErrorKind::ArgumentCountMismatch {
        callee: format!("intrinsic '{name}'"),
        expected: expected.to_string(),
        given: args.len(),
    })
}

/// The instruction of a scalar argument of type `ty`.
pub(crate) fn scalar(
    ctx: &Context,
    value: &Value,
    ty: ScalarType,
) -> ResolveResult<InstrIx> {
    match value {
        Value::Instruction(ix) if ctx.graph.ty(*ix) == ty => Ok(*ix),
        Value::Instruction(_) => Err(ctx.error(ResolveErrorKind::TypeError(
            format!("expected a value of type '{ty}', found {}", ctx.describe(value)),
        ))),
        other => Err(ctx.error(ResolveErrorKind::InvalidCompileTarget(format!(
            "{} is not an instruction; only instructions can be operands",
            ctx.describe(other)
        )))),
    }
}

/// Scalar operands of an operator `name` of arity `N`.
fn operands<const N: usize>(
    ctx: &Context,
    name: &str,
    args: &[Value],
    ty: ScalarType,
) -> ResolveResult<[InstrIx; N]> {
    if args.len() != N {
        return Err(arity(ctx, name, N, args));
    }

    let ixs: Vec<_> = args.iter().map(|arg| scalar(ctx, arg, ty)).collect_all()?;

    ixs.try_into().map_err(|_| arity(ctx, name, N, args))
}

fn unary(op: UnaryOp) -> NativeFn {
    Rc::new(move |ctx: &mut Context, args: &[Value]| {
        let [a] = operands(ctx, op.name(), args, op.operand_type())?;
        Ok(Value::Instruction(ctx.graph.unary(op, a)))
    })
}

fn binary(op: BinaryOp) -> NativeFn {
    Rc::new(move |ctx: &mut Context, args: &[Value]| {
        let [a, b] = operands(ctx, op.name(), args, op.operand_type())?;
        Ok(Value::Instruction(ctx.graph.binary(op, a, b)))
    })
}

fn constant(ty: ScalarType, value: f32) -> NativeFn {
    Rc::new(move |ctx: &mut Context, _: &[Value]| {
        let ix = match ty {
            ScalarType::Num => ctx.graph.num(value),
            ScalarType::Bool => ctx.graph.bool(value > 0.),
        };

        Ok(Value::Instruction(ix))
    })
}
