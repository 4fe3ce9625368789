// Call tracing
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

//! Tracing for call operations.
//!
//! This provides human-readable traces on standard error any time a value
//!   is called through the call protocol.
//! These traces are provided automatically when `cfg(test)`,
//!   which means that they are automatically included in the output of any
//!   test failure.
//!
//! Outside of tests,
//!   this can be enabled at build time using the `resolve-trace-stderr`
//!   feature flag.
//!
//! _These traces are not meant to be machine-readable!_
//! Do not try to parse them;
//!   the format is subject to change without notice.

use super::ResolveResult;
use crate::value::Value;

pub trait CallTrace: Default {
    /// Output the upper portion of a call trace,
    ///   before the call stack has been pushed.
    ///
    /// There is no means to return an error and a failure to output the
    ///   trace should not interrupt processing.
    fn trace_call_begin(&mut self, callee: &Value, args: &[Value], depth: usize);

    /// Output the lower portion of a call trace,
    ///   after the call stack has been popped.
    fn trace_call_end(
        &mut self,
        callee: &Value,
        result: &ResolveResult<Value>,
        depth: usize,
    );
}

/// Perform no tracing.
///
/// This is used by default for non-test builds,
///   since tracing can incur a significant performance cost.
#[derive(Debug, PartialEq, Default)]
pub struct VoidTrace;

impl CallTrace for VoidTrace {
    fn trace_call_begin(
        &mut self,
        _callee: &Value,
        _args: &[Value],
        _depth: usize,
    ) {
        // Do nothing at all.
    }

    fn trace_call_end(
        &mut self,
        _callee: &Value,
        _result: &ResolveResult<Value>,
        _depth: usize,
    ) {
        // Do nothing at all.
    }
}

/// Human-readable [`CallTrace`].
///
/// See [module-level](self) documentation for more information.
#[derive(Debug, PartialEq, Default)]
pub struct HumanReadableTrace;

impl CallTrace for HumanReadableTrace {
    fn trace_call_begin(&mut self, callee: &Value, args: &[Value], depth: usize) {
        eprint!("[Context::call] (depth {depth}) ==> {callee}\n");

        for (i, arg) in args.iter().enumerate() {
            eprint!("|  |  arg {i}: {arg}\n");
        }
    }

    fn trace_call_end(
        &mut self,
        callee: &Value,
        result: &ResolveResult<Value>,
        depth: usize,
    ) {
        match result {
            Ok(value) => {
                eprint!("[Context::call] (depth {depth}) <== {callee}: {value}\n")
            }
            Err(errs) => eprint!(
                "[Context::call] (depth {depth}) <== {callee}: !!! {errs}\n"
            ),
        }

        #[allow(unused_variables)]
        let cfg = ""; // so that this compiles without matching cfg
        #[cfg(feature = "resolve-trace-stderr")]
        #[allow(unused_variables)]
        let cfg = "feature = \"resolve-trace-stderr\"";
        #[cfg(test)] // takes precedence if both are set
        let cfg = "test";

        if depth == 0 {
            eprint!(
                "= note: this trace was output as a debugging aid \
                    because `cfg({cfg})`.\n\n",
            );
        }
    }
}

/// Trace used by [`Context`](super::Context).
#[cfg(not(any(test, feature = "resolve-trace-stderr")))]
pub type DefaultTrace = VoidTrace;

/// Trace used by [`Context`](super::Context).
#[cfg(any(test, feature = "resolve-trace-stderr"))]
pub type DefaultTrace = HumanReadableTrace;
