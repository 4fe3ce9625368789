// Struct types and their instances
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

//! Nominal struct types.
//!
//! A [`Struct`] is both a type and the constructor of its instances.
//! Types are nominal:
//!   an instance satisfies a struct constraint only if it was constructed
//!   by that very struct,
//!     regardless of shape.
//!
//! The scalar types `Num` and `Bool` are intrinsic structs whose
//!   "instances" are [instructions](crate::ir);
//!     they otherwise behave like any other struct,
//!       including access to functions of their associated scope using
//!       member syntax
//!         (e.g. `a.add(b)` for `Num.add(a, b)`).

use super::{NextInstr, ResolvedBlock, ResolvedPort, Value};
use crate::{
    decl::{Body, Decl},
    intrinsic::IntrinsicStruct,
    ir::ScalarType,
    iter::CollectAll,
    resolve::{Context, ResolveErrorKind, ResolveResult},
    sym::SymbolId,
};
use std::rc::Rc;

#[derive(Debug)]
pub struct Struct {
    path: String,
    fields: Vec<ResolvedPort>,
    /// Members declared in the body of the struct.
    associated: Option<Rc<ResolvedBlock>>,
    intrinsic: Option<IntrinsicStruct>,
}

impl Struct {
    pub fn resolve(
        ctx: &mut Context,
        decl: &Rc<Decl>,
        scope: &Rc<ResolvedBlock>,
    ) -> ResolveResult<Value> {
        let path = scope.qualify(decl.id);

        let (intrinsic, members) = match &decl.body {
            Body::Intrinsic(members) => match ctx.intrinsics.structure(&path) {
                Ok(intrinsic) => (Some(intrinsic), members.clone()),
                Err(kind) => return Err(ctx.error(kind)),
            },
            Body::Scope(members) => (None, Some(members.clone())),
            Body::Terminal => (None, None),
            Body::Expr(_) => {
                return Err(ctx.error(ResolveErrorKind::InvalidExpression(
                    format!("struct '{path}' cannot have an expression body"),
                )))
            }
        };

        let fields = ResolvedPort::resolve_all(ctx, decl.ports.as_ref(), scope)?;

        if let Some(port) = fields.iter().find(|port| port.variadic) {
            return Err(ctx.error(ResolveErrorKind::InvalidExpression(format!(
                "struct '{path}' cannot have a variadic field '{}'",
                port.name()
            ))));
        }

        let associated = match members {
            Some(members) => Some(ResolvedBlock::build(
                ctx,
                members,
                Some(scope.clone()),
                path.clone(),
            )?),
            None => None,
        };

        Ok(Value::Struct(Rc::new(Self {
            path,
            fields,
            associated,
            intrinsic,
        })))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn fields(&self) -> &[ResolvedPort] {
        &self.fields
    }

    pub fn intrinsic(&self) -> Option<IntrinsicStruct> {
        self.intrinsic
    }

    /// The scalar type that this struct represents,
    ///   if any.
    pub fn scalar_type(&self) -> Option<ScalarType> {
        match self.intrinsic {
            Some(IntrinsicStruct::Scalar(ty)) => Some(ty),
            _ => None,
        }
    }

    /// Identifiers of the associated scope.
    pub fn members(&self) -> Vec<SymbolId> {
        self.associated
            .as_ref()
            .map(|block| block.members().to_vec())
            .unwrap_or_default()
    }

    /// Position of the field `id`,
    ///   if any.
    pub fn field_index(&self, id: SymbolId) -> Option<usize> {
        self.fields.iter().position(|port| port.id == Some(id))
    }

    /// Construct an instance of this struct from `args`.
    ///
    /// Struct construction is never partial:
    ///   exactly one argument must be provided per field.
    /// Scalar structs instead convert their single argument.
    pub fn construct(
        self: &Rc<Self>,
        ctx: &mut Context,
        args: Vec<Value>,
    ) -> ResolveResult<Value> {
        let this = Value::Struct(self.clone());

        if let Some(ty) = self.scalar_type() {
            return match args.as_slice() {
                [Value::Error] => Ok(Value::Error),
                [Value::Instruction(ix)] => {
                    Ok(Value::Instruction(ctx.graph.cast(ty, *ix)))
                }
                [other] => Err(ctx.error(ResolveErrorKind::TypeError(format!(
                    "{} cannot be converted to '{}'",
                    ctx.describe(other),
                    self.path,
                )))),
                _ => Err(ctx.error(ResolveErrorKind::ArgumentCountMismatch {
                    callee: ctx.describe(&this),
                    expected: "1".into(),
                    given: args.len(),
                })),
            };
        }

        ctx.invoke(&this, &self.fields, &this, &args, |_| {
            Ok(Value::Instance(Rc::new(StructInstance {
                ty: self.clone(),
                values: args.clone(),
            })))
        })
    }

    /// Whether `value` is an instance of this struct.
    pub fn matches(self: &Rc<Self>, ctx: &Context, value: &Value) -> ResolveResult<bool> {
        Ok(match (self.scalar_type(), value) {
            (Some(ty), Value::Instruction(ix)) => ctx.graph.ty(*ix) == ty,
            (None, Value::Instance(instance)) => Rc::ptr_eq(&instance.ty, self),
            _ => false,
        })
    }

    /// An instance constructed from the default value of each field.
    pub fn default_value(self: &Rc<Self>, ctx: &mut Context) -> ResolveResult<Value> {
        match self.scalar_type() {
            Some(ScalarType::Num) => return Ok(Value::Instruction(ctx.graph.num(0.))),
            Some(ScalarType::Bool) => {
                return Ok(Value::Instruction(ctx.graph.bool(false)))
            }
            None => (),
        }

        let values = self
            .fields
            .iter()
            .map(|port| port.default_value(ctx))
            .collect_all()?;

        Ok(Value::Instance(Rc::new(StructInstance {
            ty: self.clone(),
            values,
        })))
    }

    /// Resolve a member of the associated scope.
    pub fn index(self: &Rc<Self>, ctx: &mut Context, id: SymbolId) -> ResolveResult<Value> {
        match &self.associated {
            Some(block) => block.index(ctx, id),
            None => Err(ctx.error(ResolveErrorKind::IdentifierNotFound(id))),
        }
    }
}

/// An instance of a custom or record [`Struct`].
#[derive(Debug)]
pub struct StructInstance {
    ty: Rc<Struct>,
    /// Field values in field order.
    values: Vec<Value>,
}

impl StructInstance {
    /// Create an instance without checking `values` against the fields of
    ///   `ty`.
    ///
    /// This is intended for intrinsics that construct instances of their
    ///   own record types.
    pub fn new_unchecked(ty: Rc<Struct>, values: Vec<Value>) -> Self {
        Self { ty, values }
    }

    pub fn ty(&self) -> &Rc<Struct> {
        &self.ty
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn members(&self) -> Vec<SymbolId> {
        self.ty.fields.iter().filter_map(|port| port.id).collect()
    }

    /// Resolve a field or else an instance function of the declaring
    ///   struct applied to `this`.
    pub fn index(
        &self,
        ctx: &mut Context,
        this: &Value,
        id: SymbolId,
    ) -> ResolveResult<Value> {
        match self.ty.field_index(id) {
            Some(i) => Ok(self.values[i].clone()),
            None => instance_member(ctx, &self.ty, this, id),
        }
    }

    pub fn deserialize(
        &self,
        ctx: &mut Context,
        next: &mut NextInstr,
    ) -> ResolveResult<Rc<Self>> {
        let mut values = Vec::with_capacity(self.values.len());

        for value in &self.values {
            values.push(value.deserialize(ctx, next)?);
        }

        Ok(Rc::new(Self {
            ty: self.ty.clone(),
            values,
        }))
    }
}

/// Resolve the instance function `id` of `ty` applied to `instance`.
///
/// Only members whose first port is constrained to `ty` itself can be used
///   as instance functions.
pub(super) fn instance_member(
    ctx: &mut Context,
    ty: &Rc<Struct>,
    instance: &Value,
    id: SymbolId,
) -> ResolveResult<Value> {
    let member = ty.index(ctx, id)?;

    let applicable = match member.input_ports().first() {
        Some(ResolvedPort {
            constraint: Value::Struct(s),
            variadic: false,
            ..
        }) => Rc::ptr_eq(s, ty),
        _ => member.is_error(),
    };

    match applicable {
        true => member.call(ctx, vec![instance.clone()]),
        false => Err(ctx.error(ResolveErrorKind::CannotBeUsedAsInstanceFunction {
            member: id,
            ty: ty.path.clone(),
        })),
    }
}
