// Value resolution
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

//! Resolution of declarations into values.
//!
//! A [`Context`] owns everything that is scoped to a single compilation:
//!
//!   - the root [`ResolvedBlock`] of the program's declarations;
//!   - the injected [`IntrinsicRegistry`];
//!   - the [instruction graph](InstrGraph) that scalar computations reduce
//!       to;
//!   - the [`TupleRegistry`] of structural tuple types;
//!   - the call stack used to forbid recursion; and
//!   - diagnostics accumulated by [`Context::resolve_all`].
//!
//! Values are reference-counted without synchronization and so a context
//!   is confined to the thread that created it;
//!     concurrent compilations must use independent contexts.
//!
//! Call Protocol
//! =============
//! Every call of a function-like value goes through [`Context::invoke`]:
//!
//!   1. If the callee's canonical definition is already on the call stack,
//!        the call fails with [`ResolveErrorKind::RecursionNotAllowed`]
//!        without evaluating anything.
//!      Exceeding [`CompilerOptions::call_stack_limit`] likewise fails.
//!   2. The callee is pushed onto the call stack.
//!   3. Arguments are checked against the callee's ports,
//!        accumulating every violation.
//!   4. The body is evaluated and any nullary result unwrapped.
//!   5. The result is checked against the return constraint.
//!   6. The callee is popped from the call stack,
//!        whether or not any of the above failed.
//!
//! Errors
//! ======
//! Operations return [`ResolveResult`] rather than panicking.
//! Every error is created by [`Context::error`],
//!   which captures the live call stack as the error's trace.
//! Panics are reserved for violations of internal invariants.

pub mod error;
pub mod trace;

pub use error::{
    CollectedDiagnostic, DiagnosticSink, ResolveError, ResolveErrorKind,
    ResolveErrors, ResolveResult,
};

use self::trace::{CallTrace, DefaultTrace};
use crate::{
    decl::{self, Body, Decl, DeclKind, Expr},
    diagnose::Frame,
    global,
    intrinsic::IntrinsicRegistry,
    ir::{InstrGraph, InstrIx, ScalarType},
    iter::{Accumulate, CollectAll},
    sym::{GlobalSymbolIntern, SymbolId},
    value::{
        check_inputs, check_return, Constraint, Function, ResolvedBlock,
        ResolvedPort, Struct, TupleInstance, TupleRegistry, Value,
    },
};
use fxhash::FxHashMap;
use std::rc::Rc;

/// Options that may differ between compilations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Maximum depth of the call stack.
    pub call_stack_limit: usize,
    /// Whether to cache common subexpressions before native compilation.
    ///
    /// Disabling this produces a program that recomputes shared terms.
    pub cse: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            call_stack_limit: global::DEFAULT_CALL_STACK_LIMIT,
            cse: true,
        }
    }
}

/// State of a single compilation.
///
/// See the [module-level documentation](self) for more information.
pub struct Context {
    root: Rc<ResolvedBlock>,
    pub(crate) intrinsics: IntrinsicRegistry,
    pub(crate) graph: InstrGraph,
    pub(crate) tuples: TupleRegistry,

    /// Canonical definitions of the callees being evaluated,
    ///   outermost first.
    call_stack: Vec<Value>,

    /// Errors recorded for later reporting.
    diagnostics: Vec<ResolveError>,

    options: CompilerOptions,
    trace: DefaultTrace,

    /// The universal constraint,
    ///   shared so that it is identical everywhere.
    any: Value,

    /// Intrinsic structs of scalar types,
    ///   cached once resolved.
    scalar_structs: FxHashMap<ScalarType, Rc<Struct>>,
}

impl Context {
    /// Create a context for the program consisting of `decls`.
    ///
    /// Identifiers declared more than once at the root are recorded as
    ///   diagnostics;
    ///     the first declaration is retained.
    pub fn new(
        decls: Vec<Decl>,
        intrinsics: IntrinsicRegistry,
        options: CompilerOptions,
    ) -> Self {
        let (root, dups) =
            ResolvedBlock::with_duplicates(decl::block(decls), None, String::new());

        let diagnostics = dups
            .into_iter()
            .map(|id| {
                ResolveError::new(ResolveErrorKind::MultipleDefinitions(id), vec![])
            })
            .collect();

        Self {
            root,
            intrinsics,
            graph: InstrGraph::new(),
            tuples: TupleRegistry::new(),
            call_stack: Vec::new(),
            diagnostics,
            options,
            trace: DefaultTrace::default(),
            any: Constraint::any(),
            scalar_structs: FxHashMap::default(),
        }
    }

    pub fn root(&self) -> &Rc<ResolvedBlock> {
        &self.root
    }

    pub fn graph(&self) -> &InstrGraph {
        &self.graph
    }

    pub fn tuples(&self) -> &TupleRegistry {
        &self.tuples
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Number of calls currently being evaluated.
    pub fn call_depth(&self) -> usize {
        self.call_stack.len()
    }

    /// The universal constraint `Any`.
    pub fn any(&self) -> Value {
        self.any.clone()
    }

    /// Evaluate an expression in the root scope.
    pub fn evaluate(&mut self, expr: &Expr) -> ResolveResult<Value> {
        let root = self.root.clone();
        self.evaluate_in(expr, &root)
    }

    /// Resolve a dotted path such as `Num.add` from the root scope.
    pub fn resolve_path(&mut self, path: &str) -> ResolveResult<Value> {
        self.evaluate(&Expr::path(path))
    }

    /// Evaluate an expression in `scope`.
    ///
    /// Failures of a callee and of its arguments are reported together.
    pub fn evaluate_in(
        &mut self,
        expr: &Expr,
        scope: &Rc<ResolvedBlock>,
    ) -> ResolveResult<Value> {
        match expr {
            Expr::Num(n) => Ok(Value::Instruction(self.graph.num(*n))),

            Expr::Ident(id) => scope.lookup(self, *id),

            Expr::Index(expr, id) => {
                let value = self.evaluate_in(expr, scope)?;
                let member = value.index(self, *id)?;
                self.unwrap_nullary(member)
            }

            Expr::Call(callee, args) => {
                let callee = self.evaluate_in(callee, scope);
                let args = args
                    .iter()
                    .map(|arg| self.evaluate_in(arg, scope))
                    .collect_all::<Vec<_>>();

                match (callee, args) {
                    (Ok(callee), Ok(args)) => callee.call(self, args),
                    (Err(mut e), Err(e2)) => {
                        e.accumulate(e2);
                        Err(e)
                    }
                    (Err(e), Ok(_)) | (Ok(_), Err(e)) => Err(e),
                }
            }

            Expr::Lambda(decl) => Function::resolve(self, decl, scope),

            Expr::Block(decls) => {
                let block = ResolvedBlock::build(
                    self,
                    decls.clone(),
                    Some(scope.clone()),
                    scope.path().into(),
                )?;

                let fields = block
                    .members()
                    .to_vec()
                    .into_iter()
                    .map(|id| block.index(self, id).map(|value| (id, value)))
                    .collect_all()?;

                Ok(TupleInstance::build(self, fields))
            }
        }
    }

    /// Resolve a declaration of `scope` into a value.
    ///
    /// This does not memoize;
    ///   see [`ResolvedBlock::get`].
    pub fn resolve_decl(
        &mut self,
        decl: &Rc<Decl>,
        scope: &Rc<ResolvedBlock>,
    ) -> ResolveResult<Value> {
        match decl.kind {
            DeclKind::Function => Function::resolve(self, decl, scope),
            DeclKind::Struct => Struct::resolve(self, decl, scope),
            DeclKind::Constraint => Constraint::resolve(self, decl, scope),
            DeclKind::Namespace => match &decl.body {
                Body::Scope(members) => ResolvedBlock::build(
                    self,
                    members.clone(),
                    Some(scope.clone()),
                    scope.qualify(decl.id),
                )
                .map(Value::Namespace),
                _ => Err(self.error(ResolveErrorKind::InvalidExpression(format!(
                    "namespace '{}' must have a scope body",
                    scope.qualify(decl.id)
                )))),
            },
        }
    }

    /// Resolve every member of `block`,
    ///   descending into namespaces,
    ///   and record each failure as a diagnostic.
    ///
    /// Failed members are yielded as [`Value::Error`];
    ///   a member that already failed is not reported again.
    pub fn resolve_all(&mut self, block: &Rc<ResolvedBlock>) -> Vec<(SymbolId, Value)> {
        let mut resolved = Vec::with_capacity(block.members().len());

        for id in block.members().to_vec() {
            let value = match block.index(self, id) {
                Ok(value) => value,
                Err(errs) => {
                    self.diagnostics.extend(errs);
                    Value::Error
                }
            };

            if let Value::Namespace(ns) = &value {
                self.resolve_all(ns);
            }

            resolved.push((id, value));
        }

        resolved
    }

    /// Call `callee` with `args`.
    pub fn call(&mut self, callee: &Value, args: Vec<Value>) -> ResolveResult<Value> {
        callee.call(self, args)
    }

    /// Run the call protocol for `callee`,
    ///   producing its result using `body`.
    ///
    /// `callee` must be the canonical definition being called,
    ///   not a transient wrapper.
    /// See the [module-level documentation](self) for the protocol.
    pub fn invoke<F>(
        &mut self,
        callee: &Value,
        ports: &[ResolvedPort],
        ret: &Value,
        args: &[Value],
        body: F,
    ) -> ResolveResult<Value>
    where
        F: FnOnce(&mut Self) -> ResolveResult<Value>,
    {
        if self.call_stack.iter().any(|frame| frame.is_identical(callee)) {
            return Err(self.error(ResolveErrorKind::RecursionNotAllowed(
                self.describe(callee),
            )));
        }

        if self.call_stack.len() >= self.options.call_stack_limit {
            return Err(self.error(ResolveErrorKind::CallStackLimitReached(
                self.options.call_stack_limit,
            )));
        }

        let depth = self.call_stack.len();
        self.trace.trace_call_begin(callee, args, depth);
        self.call_stack.push(callee.clone());

        let result = self.invoke_checked(callee, ports, ret, args, body);

        self.call_stack.pop();
        self.trace.trace_call_end(callee, &result, depth);

        result
    }

    fn invoke_checked<F>(
        &mut self,
        callee: &Value,
        ports: &[ResolvedPort],
        ret: &Value,
        args: &[Value],
        body: F,
    ) -> ResolveResult<Value>
    where
        F: FnOnce(&mut Self) -> ResolveResult<Value>,
    {
        check_inputs(self, callee, ports, args)?;

        let value = body(self)?;
        let value = self.unwrap_nullary(value)?;

        check_return(self, ret, &value)?;
        Ok(value)
    }

    /// Invoke nullary functions until a value that is not a nullary
    ///   function is produced.
    ///
    /// Unwrapping stops early if a call yields the very function that was
    ///   called,
    ///     or after [`global::NULLARY_UNWRAP_LIMIT`] calls.
    pub fn unwrap_nullary(&mut self, value: Value) -> ResolveResult<Value> {
        let mut value = value;

        for _ in 0..global::NULLARY_UNWRAP_LIMIT {
            if !value.is_nullary() {
                break;
            }

            let next = value.call(self, vec![])?;

            if next.is_identical(&value) {
                break;
            }

            value = next;
        }

        Ok(value)
    }

    /// Create an error whose trace is the current call stack,
    ///   innermost call first.
    pub fn error(&self, kind: ResolveErrorKind) -> ResolveErrors {
        let trace = self
            .call_stack
            .iter()
            .rev()
            .map(|callee| Frame::new(self.describe(callee)))
            .collect();

        ResolveError::new(kind, trace).into()
    }

    /// Human-readable description of a value for diagnostics.
    pub fn describe(&self, value: &Value) -> String {
        match value {
            Value::Instruction(ix) => {
                format!("{} '{}'", self.graph.ty(*ix), self.graph.summary(*ix))
            }
            _ => value.to_string(),
        }
    }

    /// The intrinsic struct declared for the scalar type `ty`.
    pub fn scalar_struct(&mut self, ty: ScalarType) -> ResolveResult<Rc<Struct>> {
        if let Some(s) = self.scalar_structs.get(&ty) {
            return Ok(s.clone());
        }

        let root = self.root.clone();

        match root.index(self, ty.struct_name().intern())? {
            Value::Struct(s) if s.scalar_type() == Some(ty) => {
                self.scalar_structs.insert(ty, s.clone());
                Ok(s)
            }
            other => Err(self.error(ResolveErrorKind::TypeError(format!(
                "{} does not represent the scalar type '{ty}'",
                self.describe(&other)
            )))),
        }
    }

    /// Flatten `value` into the instructions that represent it.
    pub fn serialize(&mut self, value: &Value) -> ResolveResult<Vec<InstrIx>> {
        let mut out = Vec::new();
        value.serialize(self, &mut out)?;
        Ok(out)
    }

    /// Produce a value shaped like `template` from exactly the given
    ///   instructions.
    pub fn deserialize(
        &mut self,
        template: &Value,
        instrs: &[InstrIx],
    ) -> ResolveResult<Value> {
        let mut remaining = instrs.iter().copied();

        let mut next = |ctx: &mut Context| match remaining.next() {
            Some(ix) => Ok(ix),
            None => Err(ctx.error(ResolveErrorKind::SerializationError(
                format!("{} instruction(s) are too few", instrs.len()),
            ))),
        };

        let value = template.deserialize(self, &mut next)?;

        match remaining.len() {
            0 => Ok(value),
            n => Err(self.error(ResolveErrorKind::SerializationError(format!(
                "{n} instruction(s) remain after deserializing {}",
                self.describe(template)
            )))),
        }
    }

    /// Record errors for later reporting.
    pub fn report(&mut self, errs: ResolveErrors) {
        self.diagnostics.extend(errs)
    }

    /// Errors recorded but not yet drained.
    pub fn diagnostics(&self) -> &[ResolveError] {
        &self.diagnostics
    }

    /// Hand every recorded error to `sink`,
    ///   clearing them from this context.
    pub fn drain_diagnostics<S: DiagnosticSink + ?Sized>(&mut self, sink: &mut S) {
        for e in self.diagnostics.drain(..) {
            e.report_to(sink);
        }
    }
}

#[cfg(test)]
mod test;
