// Boundary converters
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

//! Conversion between host data and Element values.

use super::{scalar_layout, HostType, Inputs, Layout};
use crate::{
    ir::{InstrIx, ScalarType},
    iter::CollectAll,
    native::NativeType,
    resolve::{Context, ResolveErrorKind, ResolveResult},
    sym::{GlobalSymbolIntern, GlobalSymbolResolve, SymbolId},
    value::{Struct, Value},
};
use fxhash::FxHashMap;
use std::{fmt::Debug, rc::Rc};

/// Converts data of some set of [`HostType`]s.
pub trait BoundaryConverter: Debug {
    /// An Element value of host type `ty` whose scalars are drawn from
    ///   fresh `inputs`.
    fn input(
        &self,
        ctx: &mut Context,
        ty: &HostType,
        map: &BoundaryMap,
        inputs: &mut Inputs,
    ) -> ResolveResult<(Value, Layout)>;

    /// Serialize `value` into `out` as data of host type `ty`.
    fn output(
        &self,
        ctx: &mut Context,
        ty: &HostType,
        value: &Value,
        map: &BoundaryMap,
        out: &mut Vec<InstrIx>,
    ) -> ResolveResult<Layout>;
}

/// Converts scalar host types to and from `Num` and `Bool`.
///
/// [`HostType::Bool`] is `Bool`;
///   every other scalar is `Num`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberConverter;

impl NumberConverter {
    fn element_type(
        ctx: &Context,
        ty: &HostType,
    ) -> ResolveResult<(ScalarType, NativeType)> {
        match ty.scalar() {
            Some(NativeType::Bool) => Ok((ScalarType::Bool, NativeType::Bool)),
            Some(native) => Ok((ScalarType::Num, native)),
            None => Err(ctx.error(ResolveErrorKind::InvalidBoundaryFunction(
                format!("host type {ty} is not a number"),
            ))),
        }
    }
}

impl BoundaryConverter for NumberConverter {
    fn input(
        &self,
        ctx: &mut Context,
        ty: &HostType,
        _map: &BoundaryMap,
        inputs: &mut Inputs,
    ) -> ResolveResult<(Value, Layout)> {
        let (elem, native) = Self::element_type(ctx, ty)?;
        let ix = inputs.next(ctx, elem, native);

        Ok((Value::Instruction(ix), Layout::Scalar(native)))
    }

    fn output(
        &self,
        ctx: &mut Context,
        ty: &HostType,
        value: &Value,
        _map: &BoundaryMap,
        out: &mut Vec<InstrIx>,
    ) -> ResolveResult<Layout> {
        let (elem, _) = Self::element_type(ctx, ty)?;

        match value {
            Value::Instruction(ix) => {
                out.push(ctx.graph.cast(elem, *ix));
                Ok(scalar_layout(ty, elem))
            }
            _ => Err(ctx.error(ResolveErrorKind::InvalidBoundaryFunction(
                format!("{} cannot be returned as {ty}", ctx.describe(value)),
            ))),
        }
    }
}

/// Converts a host struct to and from an Element struct,
///   field by field.
#[derive(Debug, Clone)]
pub struct StructConverter {
    /// Path of the Element struct,
    ///   resolved from the root of the program.
    element: Rc<str>,

    /// Host field of each Element field.
    fields: FxHashMap<SymbolId, Rc<str>>,
}

impl StructConverter {
    /// Convert the Element struct at `element` using the given
    ///   (Element field, host field) pairs.
    pub fn new(element: &str, fields: &[(&str, &str)]) -> Self {
        Self {
            element: element.into(),
            fields: fields
                .iter()
                .map(|(elem, host)| (elem.intern(), (*host).into()))
                .collect(),
        }
    }

    pub fn element(&self) -> &str {
        &self.element
    }

    fn resolve(&self, ctx: &mut Context) -> ResolveResult<Rc<Struct>> {
        match ctx.resolve_path(&self.element)? {
            Value::Struct(s) if s.scalar_type().is_none() => Ok(s),
            other => Err(ctx.error(ResolveErrorKind::InvalidBoundaryFunction(
                format!(
                    "'{}' resolved to {}, which is not a struct",
                    self.element,
                    ctx.describe(&other)
                ),
            ))),
        }
    }

    fn host_field(
        &self,
        ctx: &Context,
        s: &Struct,
        id: Option<SymbolId>,
    ) -> ResolveResult<Rc<str>> {
        match id.and_then(|id| self.fields.get(&id)) {
            Some(host) => Ok(host.clone()),
            None => Err(ctx.error(ResolveErrorKind::UnmappedBoundaryType(format!(
                "field '{}' of struct '{}' has no host field",
                id.map_or("_", |id| id.lookup_str()),
                s.path(),
            )))),
        }
    }

    fn host_name(ctx: &Context, ty: &HostType) -> ResolveResult<Rc<str>> {
        match ty {
            HostType::Struct(name) => Ok(name.clone()),
            _ => Err(ctx.error(ResolveErrorKind::InvalidBoundaryFunction(format!(
                "host type {ty} is not a struct"
            )))),
        }
    }
}

impl BoundaryConverter for StructConverter {
    fn input(
        &self,
        ctx: &mut Context,
        ty: &HostType,
        map: &BoundaryMap,
        inputs: &mut Inputs,
    ) -> ResolveResult<(Value, Layout)> {
        let name = Self::host_name(ctx, ty)?;
        let s = self.resolve(ctx)?;

        let (args, fields): (Vec<_>, Vec<_>) = s
            .fields()
            .iter()
            .map(|field| -> ResolveResult<_> {
                let host = self.host_field(ctx, &s, field.id)?;

                let field_ty = match &field.constraint {
                    Value::Constraint(c) if c.is_any() => HostType::F32,
                    constraint => map.host_type_for(ctx, constraint)?,
                };

                let (value, layout) = map
                    .converter(ctx, &field_ty)?
                    .input(ctx, &field_ty, map, inputs)?;

                Ok((value, (host, layout)))
            })
            .collect_all::<Vec<_>>()?
            .into_iter()
            .unzip();

        let value = Value::Struct(s).call(ctx, args)?;

        Ok((value, Layout::Struct { ty: name, fields }))
    }

    fn output(
        &self,
        ctx: &mut Context,
        ty: &HostType,
        value: &Value,
        map: &BoundaryMap,
        out: &mut Vec<InstrIx>,
    ) -> ResolveResult<Layout> {
        let name = Self::host_name(ctx, ty)?;
        let s = self.resolve(ctx)?;

        let instance = match value {
            Value::Instance(i) if Rc::ptr_eq(i.ty(), &s) => i.clone(),
            _ => {
                return Err(ctx.error(ResolveErrorKind::InvalidBoundaryFunction(
                    format!(
                        "{} cannot be returned as {ty}, \
                            which requires an instance of '{}'",
                        ctx.describe(value),
                        s.path(),
                    ),
                )))
            }
        };

        let fields = s
            .fields()
            .iter()
            .zip(instance.values())
            .map(|(field, value)| -> ResolveResult<_> {
                let host = self.host_field(ctx, &s, field.id)?;
                let field_ty = map.host_type_of(ctx, value)?;

                let layout = map
                    .converter(ctx, &field_ty)?
                    .output(ctx, &field_ty, value, map, out)?;

                Ok((host, layout))
            })
            .collect_all()?;

        Ok(Layout::Struct { ty: name, fields })
    }
}

/// Converters by host type,
///   and the host type of each Element struct that may cross the
///   boundary.
#[derive(Debug, Default)]
pub struct BoundaryMap {
    converters: FxHashMap<HostType, Rc<dyn BoundaryConverter>>,
    elements: FxHashMap<Rc<str>, HostType>,
}

impl BoundaryMap {
    /// A map with no converters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scalar converters and the common vector types.
    ///
    /// The struct mappings expect the program to declare
    ///   `Vector2(x, y)`, `Vector3(x, y, z)`, `Vector4(x, y, z, w)` and
    ///   `Complex(real, imag)`;
    ///     those that are not declared fail only when used.
    pub fn with_defaults() -> Self {
        let mut map = Self::new();

        for ty in [HostType::F32, HostType::F64, HostType::I32, HostType::Bool] {
            map.register(ty, NumberConverter);
        }

        map.register_struct("Vector2", "Vector2", &[("x", "x"), ("y", "y")]);
        map.register_struct(
            "Vector3",
            "Vector3",
            &[("x", "x"), ("y", "y"), ("z", "z")],
        );
        map.register_struct(
            "Vector4",
            "Vector4",
            &[("x", "x"), ("y", "y"), ("z", "z"), ("w", "w")],
        );
        map.register_struct("Complex", "Complex", &[("real", "re"), ("imag", "im")]);

        map
    }

    /// Convert data of host type `ty` using `converter`,
    ///   replacing any existing converter.
    pub fn register<C: BoundaryConverter + 'static>(
        &mut self,
        ty: HostType,
        converter: C,
    ) {
        self.converters.insert(ty, Rc::new(converter));
    }

    /// Associate the Element struct at path `element` with the host type
    ///   `ty`.
    pub fn map_element(&mut self, element: &str, ty: HostType) {
        self.elements.insert(element.into(), ty);
    }

    /// Register a [`StructConverter`] for the host struct `host` and map
    ///   the Element struct `element` to it.
    pub fn register_struct(
        &mut self,
        host: &str,
        element: &str,
        fields: &[(&str, &str)],
    ) {
        let ty = HostType::named(host);

        self.register(ty.clone(), StructConverter::new(element, fields));
        self.map_element(element, ty);
    }

    /// The converter for host type `ty`.
    pub fn converter(
        &self,
        ctx: &Context,
        ty: &HostType,
    ) -> ResolveResult<&dyn BoundaryConverter> {
        match self.converters.get(ty) {
            Some(conv) => Ok(conv.as_ref()),
            None => Err(ctx.error(ResolveErrorKind::MissingBoundaryConverter(
                ty.to_string(),
            ))),
        }
    }

    /// Host type mapped to the Element struct at path `element`,
    ///   if any.
    pub fn host_type(&self, element: &str) -> Option<&HostType> {
        self.elements.get(element)
    }

    /// Host type of values satisfying `constraint`.
    ///
    /// Only structs have host types;
    ///   `Num` and `Bool` are [`HostType::F32`] and [`HostType::Bool`].
    pub fn host_type_for(
        &self,
        ctx: &Context,
        constraint: &Value,
    ) -> ResolveResult<HostType> {
        match constraint {
            Value::Struct(s) => match (s.scalar_type(), self.host_type(s.path())) {
                (Some(ty), _) => Ok(HostType::of_scalar(ty)),
                (None, Some(host)) => Ok(host.clone()),
                (None, None) => Err(ctx.error(
                    ResolveErrorKind::UnmappedBoundaryType(format!(
                        "struct '{}' has no host type",
                        s.path()
                    )),
                )),
            },
            _ => Err(ctx.error(ResolveErrorKind::InvalidBoundaryFunction(format!(
                "{} has no host type",
                ctx.describe(constraint)
            )))),
        }
    }

    /// Host type of `value`,
    ///   derived from its instance type.
    pub fn host_type_of(
        &self,
        ctx: &mut Context,
        value: &Value,
    ) -> ResolveResult<HostType> {
        match value {
            Value::Instruction(ix) => Ok(HostType::of_scalar(ctx.graph.ty(*ix))),
            Value::Instance(i) => self.host_type_for(ctx, &Value::Struct(i.ty().clone())),
            _ => Err(ctx.error(ResolveErrorKind::InvalidBoundaryFunction(format!(
                "{} cannot cross the boundary",
                ctx.describe(value)
            )))),
        }
    }
}
