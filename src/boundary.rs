// Host boundary
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

//! Compilation of values into functions callable by the host.
//!
//! The host describes the function it wants with a [`NativeSignature`]
//!   of [`HostType`]s.
//! Each host type is associated with a [`BoundaryConverter`] by a
//!   [`BoundaryMap`],
//!     which knows how to
//!       (a) produce an Element value for a parameter from fresh
//!             [`Instruction::Input`](crate::ir::Instruction::Input)s, and
//!       (b) serialize an Element result into instructions.
//! Both produce a [`Layout`] that describes how the corresponding host
//!   data is flattened into the scalars of a native [`Program`],
//!   so that a compiled [`NativeFunction`] may be called with
//!   [`HostValue`]s long after its [`Context`] is gone.
//!
//! There are three entry points:
//!
//!   - [`compile`] compiles a value against a signature supplied by the
//!       host;
//!   - [`compile_dynamic`] derives the signature from the value itself;
//!       and
//!   - [`source_arguments`] calls a function with arguments sourced from a
//!       flat array of `f32`s,
//!         for hosts that do not know the inputs of a function ahead of
//!         time.

mod convert;

pub use convert::{
    BoundaryConverter, BoundaryMap, NumberConverter, StructConverter,
};

use crate::{
    ir::{InstrIx, ScalarType},
    iter::CollectAll,
    native::{self, native_type, NativeType, Program, Scalar},
    resolve::{Context, ResolveError, ResolveErrorKind, ResolveErrors, ResolveResult},
    value::Value,
};
use std::{
    fmt::{self, Display},
    rc::Rc,
};

/// Type of data exchanged with the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostType {
    F32,
    F64,
    I32,
    Bool,
    /// A host struct identified by name,
    ///   such as `Vector3`.
    Struct(Rc<str>),
}

impl HostType {
    pub fn named(name: &str) -> Self {
        Self::Struct(name.into())
    }

    /// Native type of a scalar host type.
    pub fn scalar(&self) -> Option<NativeType> {
        match self {
            Self::F32 => Some(NativeType::F32),
            Self::F64 => Some(NativeType::F64),
            Self::I32 => Some(NativeType::I32),
            Self::Bool => Some(NativeType::Bool),
            Self::Struct(_) => None,
        }
    }

    /// Host type of an Element scalar.
    pub fn of_scalar(ty: ScalarType) -> Self {
        match ty {
            ScalarType::Num => Self::F32,
            ScalarType::Bool => Self::Bool,
        }
    }
}

impl Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::F32 => write!(f, "f32"),
            Self::F64 => write!(f, "f64"),
            Self::I32 => write!(f, "i32"),
            Self::Bool => write!(f, "bool"),
            Self::Struct(name) => write!(f, "{name}"),
        }
    }
}

/// Data exchanged with the host.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    F32(f32),
    F64(f64),
    I32(i32),
    Bool(bool),
    Struct(HostStruct),
}

impl HostValue {
    fn scalar(&self) -> Option<Scalar> {
        match *self {
            Self::F32(x) => Some(Scalar::F32(x)),
            Self::F64(x) => Some(Scalar::F64(x)),
            Self::I32(x) => Some(Scalar::I32(x)),
            Self::Bool(x) => Some(Scalar::Bool(x)),
            Self::Struct(_) => None,
        }
    }
}

impl From<Scalar> for HostValue {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::F32(x) => Self::F32(x),
            Scalar::F64(x) => Self::F64(x),
            Scalar::I32(x) => Self::I32(x),
            Scalar::Bool(x) => Self::Bool(x),
        }
    }
}

/// An instance of a host struct with named fields.
#[derive(Debug, Clone, PartialEq)]
pub struct HostStruct {
    ty: Rc<str>,
    fields: Vec<(Rc<str>, HostValue)>,
}

impl HostStruct {
    pub fn new<I, S>(ty: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = (S, HostValue)>,
        S: Into<Rc<str>>,
    {
        Self {
            ty: ty.into(),
            fields: fields
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        }
    }

    pub fn ty(&self) -> &str {
        &self.ty
    }

    pub fn fields(&self) -> &[(Rc<str>, HostValue)] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&HostValue> {
        self.fields
            .iter()
            .find(|(field, _)| &**field == name)
            .map(|(_, value)| value)
    }
}

/// How host data of some [`HostType`] maps onto native scalars.
#[derive(Debug, Clone, PartialEq)]
pub enum Layout {
    Scalar(NativeType),
    /// Host struct fields in the order of the fields of the corresponding
    ///   Element struct.
    Struct {
        ty: Rc<str>,
        fields: Vec<(Rc<str>, Layout)>,
    },
}

impl Layout {
    /// Number of native scalars.
    pub fn width(&self) -> usize {
        match self {
            Self::Scalar(_) => 1,
            Self::Struct { fields, .. } => {
                fields.iter().map(|(_, layout)| layout.width()).sum()
            }
        }
    }

    fn flatten(
        &self,
        value: &HostValue,
        out: &mut Vec<Scalar>,
    ) -> Result<(), ResolveErrorKind> {
        match (self, value) {
            (Self::Scalar(ty), value) => match value.scalar() {
                Some(scalar) => {
                    out.push(scalar.convert(*ty));
                    Ok(())
                }
                None => Err(ResolveErrorKind::InvalidBoundaryData(format!(
                    "expected a scalar of type {ty}, but found {value:?}"
                ))),
            },

            (Self::Struct { ty, fields }, HostValue::Struct(s)) => {
                if s.ty() != &**ty || s.fields().len() != fields.len() {
                    return Err(ResolveErrorKind::InvalidBoundaryData(format!(
                        "expected {ty} with {} field(s), but found {} with {}",
                        fields.len(),
                        s.ty(),
                        s.fields().len(),
                    )));
                }

                fields.iter().try_for_each(|(name, layout)| match s.field(name) {
                    Some(value) => layout.flatten(value, out),
                    None => Err(ResolveErrorKind::InvalidBoundaryData(format!(
                        "{ty} is missing field '{name}'"
                    ))),
                })
            }

            (Self::Struct { ty, .. }, value) => {
                Err(ResolveErrorKind::InvalidBoundaryData(format!(
                    "expected {ty}, but found {value:?}"
                )))
            }
        }
    }

    fn rebuild(&self, next: &mut impl Iterator<Item = Scalar>) -> HostValue {
        match self {
            Self::Scalar(ty) => match next.next() {
                Some(scalar) => scalar.convert(*ty).into(),
                None => diagnostic_panic!(
                    vec![],
                    "native program produced too few results for its layout"
                ),
            },
            Self::Struct { ty, fields } => HostValue::Struct(HostStruct {
                ty: ty.clone(),
                fields: fields
                    .iter()
                    .map(|(name, layout)| (name.clone(), layout.rebuild(next)))
                    .collect(),
            }),
        }
    }
}

/// Host types of the parameters and result of a [`NativeFunction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeSignature {
    params: Vec<HostType>,
    ret: HostType,
}

impl NativeSignature {
    pub fn new(params: Vec<HostType>, ret: HostType) -> Self {
        Self { params, ret }
    }

    pub fn params(&self) -> &[HostType] {
        &self.params
    }

    pub fn ret(&self) -> &HostType {
        &self.ret
    }
}

impl Display for NativeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self
            .params
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");

        write!(f, "fn({params}) -> {}", self.ret)
    }
}

/// Allocator of [`Instruction::Input`](crate::ir::Instruction::Input)
///   slots for the parameters of a function being compiled.
#[derive(Debug, Default)]
pub struct Inputs {
    params: Vec<NativeType>,
}

impl Inputs {
    /// A fresh input of type `ty` that the host supplies as `native`.
    pub fn next(
        &mut self,
        ctx: &mut Context,
        ty: ScalarType,
        native: NativeType,
    ) -> InstrIx {
        let slot = self.params.len() as u32;
        self.params.push(native);
        ctx.graph.input(slot, ty)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// A compiled function callable with host data.
///
/// This is independent of the [`Context`] that compiled it.
#[derive(Debug, Clone)]
pub struct NativeFunction {
    signature: NativeSignature,
    params: Vec<Layout>,
    ret: Layout,
    program: Program,
}

impl NativeFunction {
    pub fn signature(&self) -> &NativeSignature {
        &self.signature
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Invoke with one [`HostValue`] per parameter.
    ///
    /// Data that does not fit the [`NativeSignature`] is
    ///   [`ResolveErrorKind::InvalidBoundaryData`].
    pub fn call(&self, args: &[HostValue]) -> Result<HostValue, ResolveErrors> {
        let invalid = |kind| ResolveErrors::from(ResolveError::new(kind, vec![]));

        if args.len() != self.params.len() {
            return Err(invalid(ResolveErrorKind::InvalidBoundaryData(format!(
                "{} expects {} argument(s), but {} were given",
                self.signature,
                self.params.len(),
                args.len(),
            ))));
        }

        let mut flat = Vec::with_capacity(self.program.params().len());

        for (layout, arg) in self.params.iter().zip(args) {
            layout.flatten(arg, &mut flat).map_err(invalid)?;
        }

        let results = self.program.run(&flat);
        Ok(self.ret.rebuild(&mut results.into_iter()))
    }

    /// Invoke with every parameter flattened into `f32`s.
    ///
    /// This is the calling convention of functions produced by
    ///   [`SourcedArguments::compile`].
    pub fn call_array(&self, array: &[f32]) -> Result<HostValue, ResolveErrors> {
        let args = array.iter().map(|x| HostValue::F32(*x)).collect::<Vec<_>>();
        self.call(&args)
    }
}

/// Compile `value` into a function of the given `signature`.
///
/// A function-like value is called with one argument per parameter,
///   each sourced from host data by its converter in `map`;
///     its ports must agree in number with the parameters.
/// Any other value is compiled as a function of no parameters.
pub fn compile(
    ctx: &mut Context,
    value: &Value,
    signature: &NativeSignature,
    map: &BoundaryMap,
) -> ResolveResult<NativeFunction> {
    let value = ctx.unwrap_nullary(value.clone())?;

    check_arity(ctx, &value, signature.params.len())?;

    let mut inputs = Inputs::default();
    let (args, layouts) = source(ctx, &signature.params, map, &mut inputs)?;

    let result = match value.is_callable() {
        true => value.call(ctx, args)?,
        false => value,
    };

    let params = signature.params.clone();

    finish(ctx, params, layouts, inputs, &result, map, |_, _| {
        Ok(signature.ret.clone())
    })
}

/// Compile `value` into a function whose signature is derived from its
///   ports and result.
///
/// Ports constrained by `Num` and `Bool` are [`HostType::F32`] and
///   [`HostType::Bool`] respectively;
///     ports constrained by another struct are the host type that `map`
///     associates with it.
/// The result type is derived likewise from the value that the call
///   produces.
pub fn compile_dynamic(
    ctx: &mut Context,
    value: &Value,
    map: &BoundaryMap,
) -> ResolveResult<NativeFunction> {
    let value = ctx.unwrap_nullary(value.clone())?;

    let params = value
        .input_ports()
        .to_vec()
        .into_iter()
        .map(|port| match port.variadic {
            true => Err(ctx.error(ResolveErrorKind::InvalidBoundaryFunction(
                format!("{} has a variadic port", ctx.describe(&value)),
            ))),
            false => map.host_type_for(ctx, &port.constraint),
        })
        .collect_all::<Vec<_>>()?;

    let mut inputs = Inputs::default();
    let (args, layouts) = source(ctx, &params, map, &mut inputs)?;

    let result = match value.is_callable() {
        true => value.call(ctx, args)?,
        false => value,
    };

    finish(ctx, params, layouts, inputs, &result, map, |ctx, result| {
        map.host_type_of(ctx, result)
    })
}

/// The result of calling a function with arguments sourced from a flat
///   array;
///     see [`source_arguments`].
#[derive(Debug, Clone)]
pub struct SourcedArguments {
    /// Result of the call,
    ///   in terms of the elements of the array.
    pub result: Value,

    /// The array,
    ///   initialized with the serialized default value of each port.
    pub array: Vec<f32>,
}

impl SourcedArguments {
    /// Compile [`Self::result`] into a function of the array,
    ///   to be called with [`NativeFunction::call_array`].
    pub fn compile(
        &self,
        ctx: &mut Context,
        ret: &HostType,
        map: &BoundaryMap,
    ) -> ResolveResult<NativeFunction> {
        let n = self.array.len();
        let layouts = vec![Layout::Scalar(NativeType::F32); n];

        let inputs = Inputs {
            params: vec![NativeType::F32; n],
        };

        let params = vec![HostType::F32; n];

        finish(ctx, params, layouts, inputs, &self.result, map, |_, _| {
            Ok(ret.clone())
        })
    }
}

/// Call `function` with every scalar of its arguments sourced from a flat
///   array of `f32`s.
///
/// The shape of each argument is that of the default value of its port,
///   and so every port must have a serializable default.
pub fn source_arguments(
    ctx: &mut Context,
    function: &Value,
) -> ResolveResult<SourcedArguments> {
    if !function.is_callable() {
        return Err(ctx.error(ResolveErrorKind::NotFunction(format!(
            "{} (cannot source arguments)",
            ctx.describe(function)
        ))));
    }

    let defaults = function
        .input_ports()
        .to_vec()
        .iter()
        .map(|port| port.default_value(ctx))
        .collect_all::<Vec<_>>()?;

    let serialized = defaults
        .iter()
        .map(|default| ctx.serialize(default))
        .collect_all::<Vec<_>>()?;

    let mut inputs = Inputs::default();
    let mut array = Vec::new();

    let args = defaults
        .iter()
        .zip(serialized)
        .map(|(default, instrs)| {
            let sourced = instrs
                .into_iter()
                .map(|ix| {
                    array.push(ctx.graph.as_constant(ix).map_or(0., |c| c.value()));

                    let ty = ctx.graph.ty(ix);
                    inputs.next(ctx, ty, NativeType::F32)
                })
                .collect::<Vec<_>>();

            ctx.deserialize(default, &sourced)
        })
        .collect_all::<Vec<_>>()?;

    let result = function.call(ctx, args)?;

    Ok(SourcedArguments { result, array })
}

fn check_arity(ctx: &Context, value: &Value, n: usize) -> ResolveResult<()> {
    let ports = value.input_ports();

    let problem = match value.is_callable() {
        true if ports.iter().any(|port| port.variadic) => {
            Some("has a variadic port".to_string())
        }
        true if ports.len() != n => Some(format!(
            "has {} port(s), but the signature has {n} parameter(s)",
            ports.len()
        )),
        false if n > 0 => Some(format!(
            "is not a function, but the signature has {n} parameter(s)"
        )),
        _ => None,
    };

    match problem {
        Some(problem) => Err(ctx.error(ResolveErrorKind::InvalidBoundaryFunction(
            format!("{} {problem}", ctx.describe(value)),
        ))),
        None => Ok(()),
    }
}

/// Element values for `params` sourced from fresh inputs.
fn source(
    ctx: &mut Context,
    params: &[HostType],
    map: &BoundaryMap,
    inputs: &mut Inputs,
) -> ResolveResult<(Vec<Value>, Vec<Layout>)> {
    let sourced = params
        .iter()
        .map(|ty| {
            map.converter(ctx, ty)
                .and_then(|conv| conv.input(ctx, ty, map, inputs))
        })
        .collect_all::<Vec<_>>()?;

    Ok(sourced.into_iter().unzip())
}

/// Serialize `result` through the converter of its host type and compile
///   it into a [`NativeFunction`].
fn finish<R>(
    ctx: &mut Context,
    params: Vec<HostType>,
    layouts: Vec<Layout>,
    inputs: Inputs,
    result: &Value,
    map: &BoundaryMap,
    ret: R,
) -> ResolveResult<NativeFunction>
where
    R: FnOnce(&mut Context, &Value) -> ResolveResult<HostType>,
{
    let result = ctx.unwrap_nullary(result.clone())?;
    let ret_ty = ret(ctx, &result)?;

    let mut roots = Vec::new();
    let ret = map
        .converter(ctx, &ret_ty)?
        .output(ctx, &ret_ty, &result, map, &mut roots)?;

    let cse = ctx.options().cse;
    let program = native::compile(&mut ctx.graph, inputs.params, &roots, cse);

    Ok(NativeFunction {
        signature: NativeSignature::new(params, ret_ty),
        params: layouts,
        ret,
        program,
    })
}

/// Layout of a scalar Element type as the host type `ty`.
fn scalar_layout(ty: &HostType, elem: ScalarType) -> Layout {
    Layout::Scalar(ty.scalar().unwrap_or_else(|| native_type(elem)))
}
