// Resolution errors
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

//! Errors produced during resolution and compilation.
//!
//! Every error is raised through
//!   [`Context::error`](super::Context::error),
//!     which captures the live call stack as its trace.

use crate::{
    diagnose::{
        Annotate, AnnotatedFrame, Diagnostic, Frame, Level, MessageCode,
    },
    iter::Accumulate,
    sym::SymbolId,
};
use std::{
    error::Error,
    fmt::{self, Display},
};

/// A [`Result`] whose failure is one or more [`ResolveError`]s.
pub type ResolveResult<T> = Result<T, ResolveErrors>;

/// The class of a [`ResolveError`] and its context.
///
/// Values are rendered into strings at the time of failure since they
///   cannot be rendered without the
///   [`Context`](super::Context) that produced them.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveErrorKind {
    SerializationError(String),
    MultipleDefinitions(SymbolId),
    InvalidCompileTarget(String),
    IntrinsicNotFound(String),
    ArgumentCountMismatch {
        callee: String,
        expected: String,
        given: usize,
    },
    IdentifierNotFound(SymbolId),
    ConstraintNotSatisfied {
        value: String,
        constraint: String,
        port: String,
    },
    InvalidBoundaryFunction(String),
    RecursionNotAllowed(String),
    MissingBoundaryConverter(String),
    TypeError(String),
    InvalidExpression(String),
    InvalidBoundaryData(String),
    CannotBeUsedAsInstanceFunction {
        member: SymbolId,
        ty: String,
    },
    FunctionCannotBeUncurried(String),
    NotCompileConstant(String),
    ArgumentOutOfRange(String),
    InfiniteLoop(String),
    NotFunction(String),
    NotIndexable(String),
    NotConstraint(String),
    CallStackLimitReached(usize),
    UnmappedBoundaryType(String),
}

impl ResolveErrorKind {
    pub fn code(&self) -> MessageCode {
        use MessageCode as C;
        use ResolveErrorKind::*;

        match self {
            SerializationError(_) => C::SerializationError,
            MultipleDefinitions(_) => C::MultipleDefinitions,
            InvalidCompileTarget(_) => C::InvalidCompileTarget,
            IntrinsicNotFound(_) => C::IntrinsicNotFound,
            ArgumentCountMismatch { .. } => C::ArgumentCountMismatch,
            IdentifierNotFound(_) => C::IdentifierNotFound,
            ConstraintNotSatisfied { .. } => C::ConstraintNotSatisfied,
            InvalidBoundaryFunction(_) => C::InvalidBoundaryFunction,
            RecursionNotAllowed(_) => C::RecursionNotAllowed,
            MissingBoundaryConverter(_) => C::MissingBoundaryConverter,
            TypeError(_) => C::TypeError,
            InvalidExpression(_) => C::InvalidExpression,
            InvalidBoundaryData(_) => C::InvalidBoundaryData,
            CannotBeUsedAsInstanceFunction { .. } => {
                C::CannotBeUsedAsInstanceFunction
            }
            FunctionCannotBeUncurried(_) => C::FunctionCannotBeUncurried,
            NotCompileConstant(_) => C::NotCompileConstant,
            ArgumentOutOfRange(_) => C::ArgumentOutOfRange,
            InfiniteLoop(_) => C::InfiniteLoop,
            NotFunction(_) => C::NotFunction,
            NotIndexable(_) => C::NotIndexable,
            NotConstraint(_) => C::NotConstraint,
            CallStackLimitReached(_) => C::CallStackLimitReached,
            UnmappedBoundaryType(_) => C::UnmappedBoundaryType,
        }
    }
}

impl Display for ResolveErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ResolveErrorKind::*;

        match self {
            SerializationError(msg) => write!(f, "serialization failed: {msg}"),
            MultipleDefinitions(id) => {
                write!(f, "multiple definitions of '{id}'")
            }
            InvalidCompileTarget(msg) => {
                write!(f, "invalid compile target: {msg}")
            }
            IntrinsicNotFound(name) => {
                write!(f, "no intrinsic implementation of '{name}'")
            }
            ArgumentCountMismatch {
                callee,
                expected,
                given,
            } => write!(
                f,
                "{callee} expects {expected} argument(s), but {given} \
                    were given"
            ),
            IdentifierNotFound(id) => write!(f, "'{id}' not found"),
            ConstraintNotSatisfied {
                value,
                constraint,
                port,
            } => write!(
                f,
                "value {value} for port '{port}' does not satisfy \
                    constraint {constraint}"
            ),
            InvalidBoundaryFunction(msg) => {
                write!(f, "invalid boundary function: {msg}")
            }
            RecursionNotAllowed(callee) => {
                write!(f, "recursion is not allowed: {callee} calls itself")
            }
            MissingBoundaryConverter(ty) => {
                write!(f, "no boundary converter for host type '{ty}'")
            }
            TypeError(msg) => write!(f, "type error: {msg}"),
            InvalidExpression(msg) => write!(f, "invalid expression: {msg}"),
            InvalidBoundaryData(msg) => {
                write!(f, "invalid boundary data: {msg}")
            }
            CannotBeUsedAsInstanceFunction { member, ty } => write!(
                f,
                "'{member}' cannot be used as an instance function of {ty}"
            ),
            FunctionCannotBeUncurried(msg) => {
                write!(f, "function cannot be uncurried: {msg}")
            }
            NotCompileConstant(msg) => {
                write!(f, "{msg} is not a compile-time constant")
            }
            ArgumentOutOfRange(msg) => write!(f, "out of range: {msg}"),
            InfiniteLoop(msg) => write!(f, "infinite loop: {msg}"),
            NotFunction(value) => write!(f, "{value} is not a function"),
            NotIndexable(value) => write!(f, "{value} is not indexable"),
            NotConstraint(value) => write!(f, "{value} is not a constraint"),
            CallStackLimitReached(limit) => {
                write!(f, "call stack limit of {limit} reached")
            }
            UnmappedBoundaryType(ty) => {
                write!(f, "{ty} has no host type mapping")
            }
        }
    }
}

/// A user-facing error with the call stack at the point of failure.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolveError {
    kind: ResolveErrorKind,

    /// Call stack,
    ///   innermost frame first.
    trace: Vec<Frame>,
}

impl ResolveError {
    pub fn new(kind: ResolveErrorKind, trace: Vec<Frame>) -> Self {
        Self { kind, trace }
    }

    pub fn kind(&self) -> &ResolveErrorKind {
        &self.kind
    }

    pub fn code(&self) -> MessageCode {
        self.kind.code()
    }

    pub fn trace(&self) -> &[Frame] {
        &self.trace
    }

    /// Hand this error to a [`DiagnosticSink`].
    pub fn report_to<S: DiagnosticSink + ?Sized>(&self, sink: &mut S) {
        let code = self.code();
        sink.report(code, code.level(), self.kind.to_string(), &self.trace);
    }
}

impl Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.kind, f)
    }
}

impl Error for ResolveError {}

impl Diagnostic for ResolveError {
    fn code(&self) -> Option<MessageCode> {
        Some(self.kind.code())
    }

    fn describe(&self) -> Vec<AnnotatedFrame> {
        let mut frames = self.trace.iter().cloned();

        frames
            .next()
            .map(|inner| inner.mark_error())
            .into_iter()
            .chain(frames.map(|outer| outer.annotate(Level::Note, None)))
            .collect()
    }
}

/// One or more [`ResolveError`]s.
///
/// This is never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolveErrors(Vec<ResolveError>);

impl ResolveErrors {
    /// The first error that was raised.
    pub fn first(&self) -> &ResolveError {
        &self.0[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolveError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Message codes of every error,
    ///   in the order in which they were raised.
    pub fn codes(&self) -> Vec<MessageCode> {
        self.0.iter().map(ResolveError::code).collect()
    }

    /// Whether any error has the given code.
    pub fn has(&self, code: MessageCode) -> bool {
        self.0.iter().any(|e| e.code() == code)
    }

    pub fn into_vec(self) -> Vec<ResolveError> {
        self.0
    }
}

impl From<ResolveError> for ResolveErrors {
    fn from(e: ResolveError) -> Self {
        Self(vec![e])
    }
}

impl Accumulate for ResolveErrors {
    fn accumulate(&mut self, other: Self) {
        self.0.accumulate(other.0)
    }
}

impl IntoIterator for ResolveErrors {
    type Item = ResolveError;
    type IntoIter = std::vec::IntoIter<ResolveError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Display for ResolveErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "\n")?;
            }
            write!(f, "{}: {e}", e.code())?;
        }

        Ok(())
    }
}

impl Error for ResolveErrors {}

/// Receiver of diagnostics.
///
/// Rendering and presentation of diagnostics is the concern of the host;
///   the core only hands over the code,
///   severity,
///   message,
///   and call stack
///     (innermost frame first).
pub trait DiagnosticSink {
    fn report(
        &mut self,
        code: MessageCode,
        level: Level,
        message: String,
        trace: &[Frame],
    );
}

/// A diagnostic as received by a [`DiagnosticSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedDiagnostic {
    pub code: MessageCode,
    pub level: Level,
    pub message: String,
    pub trace: Vec<Frame>,
}

impl DiagnosticSink for Vec<CollectedDiagnostic> {
    fn report(
        &mut self,
        code: MessageCode,
        level: Level,
        message: String,
        trace: &[Frame],
    ) {
        self.push(CollectedDiagnostic {
            code,
            level,
            message,
            trace: trace.to_vec(),
        })
    }
}
