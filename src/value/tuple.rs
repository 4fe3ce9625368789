// Structural tuples
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

//! Anonymous structural tuple types.
//!
//! An anonymous block such as `{ b = 2, a = 1 }` evaluates to an instance
//!   of a [`StructuralTuple`] whose type is determined entirely by the
//!   identifiers of its members and the types of their values.
//! Unlike structs,
//!   these types are deduplicated:
//!     two blocks whose (identifier, type) pairs are equal
//!     (after sorting by identifier)
//!     produce instances of the _same_ tuple type,
//!       which is then compared by identity like any other type.
//!
//! The [`TupleRegistry`] owned by each [`Context`] is the only source of
//!   tuple types.

use super::{NextInstr, Struct, Value};
use crate::{
    ir::ScalarType,
    iter::CollectAll,
    resolve::{Context, ResolveErrorKind, ResolveResult},
    sym::{GlobalSymbolResolve, SymbolId},
};
use fxhash::FxHashMap;
use std::{
    fmt::{self, Display},
    hash::{Hash, Hasher},
    rc::Rc,
};

/// The type of one member of a structural tuple.
///
/// Struct and tuple types are compared by identity.
#[derive(Debug, Clone)]
pub enum TypeKey {
    Scalar(ScalarType),
    Struct(Rc<Struct>),
    Tuple(Rc<StructuralTuple>),
    /// A value that is not an instance of any type,
    ///   such as a function,
    ///   identified by its kind.
    Opaque(&'static str),
}

impl TypeKey {
    pub fn of(ctx: &Context, value: &Value) -> Self {
        match value {
            Value::Instruction(ix) => Self::Scalar(ctx.graph.ty(*ix)),
            Value::Instance(i) => Self::Struct(i.ty().clone()),
            Value::TupleInstance(t) => Self::Tuple(t.ty().clone()),
            other => Self::Opaque(other.kind()),
        }
    }

    fn default_value(&self, ctx: &mut Context) -> ResolveResult<Value> {
        match self {
            Self::Scalar(ScalarType::Num) => Ok(Value::Instruction(ctx.graph.num(0.))),
            Self::Scalar(ScalarType::Bool) => {
                Ok(Value::Instruction(ctx.graph.bool(false)))
            }
            Self::Struct(s) => s.default_value(ctx),
            Self::Tuple(t) => t.default_value(ctx),
            Self::Opaque(kind) => Err(ctx.error(ResolveErrorKind::TypeError(
                format!("{kind} has no default value"),
            ))),
        }
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Scalar(a), Self::Scalar(b)) => a == b,
            (Self::Struct(a), Self::Struct(b)) => Rc::ptr_eq(a, b),
            (Self::Tuple(a), Self::Tuple(b)) => Rc::ptr_eq(a, b),
            (Self::Opaque(a), Self::Opaque(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);

        match self {
            Self::Scalar(ty) => ty.hash(state),
            Self::Struct(s) => Rc::as_ptr(s).hash(state),
            Self::Tuple(t) => Rc::as_ptr(t).hash(state),
            Self::Opaque(kind) => kind.hash(state),
        }
    }
}

impl Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(ty) => write!(f, "{ty}"),
            Self::Struct(s) => write!(f, "{}", s.path()),
            Self::Tuple(t) => write!(f, "{t}"),
            Self::Opaque(kind) => write!(f, "{kind}"),
        }
    }
}

/// Members of a tuple type sorted by identifier.
type Shape = Vec<(SymbolId, TypeKey)>;

fn sort_shape<T>(members: &mut [(SymbolId, T)]) {
    members.sort_by(|(a, _), (b, _)| a.lookup_str().cmp(b.lookup_str()));
}

/// An anonymous type identified by the shape of its members.
#[derive(Debug)]
pub struct StructuralTuple {
    /// Registration order within the owning registry.
    id: usize,
    members: Shape,
}

impl StructuralTuple {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn members(&self) -> &[(SymbolId, TypeKey)] {
        &self.members
    }

    /// An instance whose members each hold the default value of their
    ///   type.
    pub fn default_value(self: &Rc<Self>, ctx: &mut Context) -> ResolveResult<Value> {
        let fields = self
            .members
            .iter()
            .map(|(id, key)| key.default_value(ctx).map(|value| (*id, value)))
            .collect_all()?;

        Ok(Value::TupleInstance(Rc::new(TupleInstance {
            ty: self.clone(),
            fields,
        })))
    }
}

impl Display for StructuralTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;

        for (i, (id, key)) in self.members.iter().enumerate() {
            match i {
                0 => write!(f, "{id}: {key}")?,
                _ => write!(f, ", {id}: {key}")?,
            }
        }

        write!(f, "}}")
    }
}

/// Per-compilation registry of [`StructuralTuple`] types.
#[derive(Debug, Default)]
pub struct TupleRegistry {
    tuples: FxHashMap<Shape, Rc<StructuralTuple>>,
}

impl TupleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieve the tuple type of the given shape,
    ///   creating it if it does not yet exist.
    ///
    /// Member order is irrelevant.
    pub fn register(&mut self, mut members: Shape) -> Rc<StructuralTuple> {
        sort_shape(&mut members);

        let id = self.tuples.len();

        self.tuples
            .entry(members)
            .or_insert_with_key(|members| {
                Rc::new(StructuralTuple {
                    id,
                    members: members.clone(),
                })
            })
            .clone()
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }
}

/// An instance of a [`StructuralTuple`].
#[derive(Debug)]
pub struct TupleInstance {
    ty: Rc<StructuralTuple>,
    /// Members in the order of the type's shape.
    fields: Vec<(SymbolId, Value)>,
}

impl TupleInstance {
    /// Create an instance from (identifier, value) pairs in any order,
    ///   registering its type in the context if necessary.
    pub fn build(ctx: &mut Context, mut fields: Vec<(SymbolId, Value)>) -> Value {
        sort_shape(&mut fields);

        let shape = fields
            .iter()
            .map(|(id, value)| (*id, TypeKey::of(ctx, value)))
            .collect();

        let ty = ctx.tuples.register(shape);

        Value::TupleInstance(Rc::new(Self { ty, fields }))
    }

    pub fn ty(&self) -> &Rc<StructuralTuple> {
        &self.ty
    }

    pub fn members(&self) -> Vec<SymbolId> {
        self.fields.iter().map(|(id, _)| *id).collect()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.iter().map(|(_, value)| value)
    }

    pub fn index(&self, ctx: &Context, id: SymbolId) -> ResolveResult<Value> {
        self.fields
            .iter()
            .find(|(member, _)| *member == id)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| ctx.error(ResolveErrorKind::IdentifierNotFound(id)))
    }

    pub fn deserialize(
        &self,
        ctx: &mut Context,
        next: &mut NextInstr,
    ) -> ResolveResult<Rc<Self>> {
        let mut fields = Vec::with_capacity(self.fields.len());

        for (id, value) in &self.fields {
            fields.push((*id, value.deserialize(ctx, next)?));
        }

        Ok(Rc::new(Self {
            ty: self.ty.clone(),
            fields,
        }))
    }
}
