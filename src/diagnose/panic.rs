// Diagnostic panics
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

//! Panic with diagnostic information.
//!
//! The system will produce diagnostic information using [`Error`]s
//!   implementing [`Diagnostic`] for most cases.
//! However,
//!   sometimes the system enters an unexpected and inconsistent state that
//!   cannot be recovered from because it represents a bug in the core
//!   itself
//!     (e.g. an instruction kind reaching the native backend that it does
//!     not know how to compile).
//! Those situations abort compilation of the unit with a panic rather than
//!   producing a user diagnostic.
//!
//!   - The macro [`diagnostic_panic!`] acts like panic,
//!       but accepts a vector of [`AnnotatedFrame`]s
//!         (just like those produced by [`Diagnostic::describe`])
//!         as its first argument to produce a diagnostic report alongside
//!         the panic.
//!   - The [`DiagnosticPanic`] trait provides alternatives to `unwrap` and
//!       `expect` methods,
//!         and utilizes [`diagnostic_panic!`].
//!
//! Panics produced with [`diagnostic_panic!`] will output an obnoxious
//!   message stating that the error is a bug in Element Core and should be
//!   reported.

use super::{AnnotatedFrame, Diagnostic, VisualReporter};
use std::{
    cell::Cell,
    error::Error,
    fmt::{self, Debug, Display},
};

// Macro exports are unintuitive.
#[cfg(doc)]
use crate::diagnostic_panic;

/// The type of [`Reporter`](crate::diagnose::Reporter) used to produce
///   reports during panic operations.
pub type PanicReporter = VisualReporter;

/// Container for ad-hoc diagnostic data for panics.
///
/// This is public only because it is needed at the expansion site of
///   [`diagnostic_panic!`].
/// You should not use this outside of panics.
///
/// It is intended to be rendered _once_,
///   after which its [`AnnotatedFrame`] vector will be consumed and become
///   empty.
pub struct DiagnosticDesc<'a>(pub String, pub Cell<Vec<AnnotatedFrame<'a>>>);

impl<'a> Debug for DiagnosticDesc<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DiagnosticDesc")
    }
}

impl<'a> Error for DiagnosticDesc<'a> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}

impl<'a> Display for DiagnosticDesc<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self(summary, _) => write!(f, "{}", summary),
        }
    }
}

impl<'a> Diagnostic for DiagnosticDesc<'a> {
    fn describe(&self) -> Vec<AnnotatedFrame> {
        match self {
            Self(_, desc) => desc.take(),
        }
    }
}

/// Produce a panic with diagnostic information and a rather obnoxious
///   message describing this issue as a bug in Element Core.
///
/// The first argument is of the same form as the return value of
///   [`Diagnostic::describe`].
///
/// This should be used in place of [`panic!`] whenever possible.
#[macro_export]
macro_rules! diagnostic_panic {
    ($desc_data:expr, $($panic_args:tt)*) => {
        $crate::diagnostic_panic!(
            @panic!, $desc_data, $($panic_args)*
        )
    };

    (@$macro:ident!, $desc_data:expr, $($panic_args:tt)*) => {{
        use $crate::diagnose::Reporter;

        let mut reporter = $crate::diagnose::panic::PanicReporter::new();

        let summary = format!($($panic_args)*);
        let desc = $crate::diagnose::panic::DiagnosticDesc(
            summary,
            std::cell::Cell::new($desc_data),
        );

        $macro!(
            "internal error:\n{}\n{}",
            reporter.render(&desc),
            // Be extra obnoxious.
            "\x1b[0;31m
!!! ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~ !!!
!!!             THIS IS A BUG IN ELEMENT CORE             !!!
!!! ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~ !!!
!!! Compilation of this unit was aborted because an       !!!
!!! internal invariant did not hold.                      !!!
!!!                                                       !!!
!!! Please report this error, including the above         !!!
!!! diagnostic output beginning with 'internal error:'.   !!!
!!! ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~ !!!
\x1b[0m"
        )
    }};
}

/// Produce a panic using [`unreachable!`] with diagnostic information and a
///   rather obnoxious message describing this issue as a bug in Element
///   Core.
#[macro_export]
macro_rules! diagnostic_unreachable {
    ($desc_data:expr, $($panic_args:tt)*) => {
        $crate::diagnostic_panic!(
            @unreachable!, $desc_data, $($panic_args)*
        )
    }
}

/// Alternatives to `unwrap` and `expect` that utilize
///   [`diagnostic_panic!`].
pub trait DiagnosticPanic {
    /// Type to produce after unwrapping.
    type Inner;

    /// Attempt to return the inner value,
    ///   consuming `self`.
    ///
    /// # Panics
    /// Panics if the inner value is not available.
    fn diagnostic_unwrap(self, desc: Vec<AnnotatedFrame>) -> Self::Inner;

    /// Attempt to return the inner value,
    ///   consuming `self`.
    ///
    /// # Panics
    /// Panics if the inner value is not available with a custom `msg`.
    fn diagnostic_expect(
        self,
        desc: Vec<AnnotatedFrame>,
        msg: &str,
    ) -> Self::Inner;
}

impl<T> DiagnosticPanic for Option<T> {
    type Inner = T;

    fn diagnostic_unwrap(self, desc: Vec<AnnotatedFrame>) -> Self::Inner {
        match self {
            Some(val) => val,
            // Same message as `Option::unwrap`
            None => diagnostic_panic!(
                desc,
                "called `Option::unwrap()` on a `None` value"
            ),
        }
    }

    fn diagnostic_expect(
        self,
        desc: Vec<AnnotatedFrame>,
        msg: &str,
    ) -> Self::Inner {
        match self {
            Some(val) => val,
            None => diagnostic_panic!(desc, "{}", msg),
        }
    }
}

impl<T, E> DiagnosticPanic for Result<T, E>
where
    E: Debug,
{
    type Inner = T;

    fn diagnostic_unwrap(self, desc: Vec<AnnotatedFrame>) -> Self::Inner {
        match self {
            Ok(val) => val,
            // Same message as `Result::unwrap`
            Err(e) => diagnostic_panic!(
                desc,
                "called `Result::unwrap()` on an `Err` value: {e:?}"
            ),
        }
    }

    fn diagnostic_expect(
        self,
        desc: Vec<AnnotatedFrame>,
        msg: &str,
    ) -> Self::Inner {
        match self {
            Ok(val) => val,
            Err(e) => diagnostic_panic!(desc, "{}: {e:?}", msg),
        }
    }
}
