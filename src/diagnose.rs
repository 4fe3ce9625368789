// Diagnostic system
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

//! Diagnostic system for error reporting.
//!
//! Source locations are the concern of the parser,
//!   which is not part of this crate.
//! What the core _does_ know at the point of failure is the live call
//!   stack,
//!     and so diagnostics are described by a series of annotated call
//!     stack [`Frame`]s,
//!       innermost first.
//!
//! Every user-facing diagnostic carries a stable [`MessageCode`] that is
//!   rendered as `ELE<n>`;
//!     these codes are part of the public interface and must never be
//!     renumbered.

#[macro_use]
pub mod panic;
mod report;

pub use report::{Report, Reporter, VisualReporter};

use core::fmt;
use std::{borrow::Cow, error::Error, fmt::Display, rc::Rc};

/// Diagnostic report.
///
/// This describes an error condition or other special event using a series
///   of [`Frame`]s to describe the circumstances around an event.
pub trait Diagnostic: Error + Sized {
    /// Stable message code identifying the class of this diagnostic,
    ///   if any.
    ///
    /// Internal errors have no code.
    fn code(&self) -> Option<MessageCode> {
        None
    }

    /// Produce a series of [`AnnotatedFrame`]s describing the circumstances
    ///   of the diagnostic event.
    fn describe(&self) -> Vec<AnnotatedFrame>;
}

/// Diagnostic severity level.
///
/// Levels are used both for entire reports and for styling of individual
///   [`AnnotatedFrame`]s.
///
/// Lower levels are more severe
///   (e.g. level 1 is the worst).
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default)]
#[repr(u8)]
pub enum Level {
    /// An error internal to Element Core that the user cannot resolve,
    ///   but may be able to work around.
    InternalError = 1,

    /// A user-resolvable error.
    ///
    /// These represent errors resulting from the user's input.
    #[default]
    Error,

    /// Useful information that supplements other messages.
    Note,

    /// Additional advice to the user that may help in debugging or fixing a
    ///   problem.
    Help,
}

impl Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::InternalError => write!(f, "internal error"),
            Level::Error => write!(f, "error"),
            Level::Note => write!(f, "note"),
            Level::Help => write!(f, "help"),
        }
    }
}

/// Stable identifier of a class of diagnostic.
///
/// The discriminant of each variant is its public message number.
/// Gaps in the numbering belong to diagnostics produced by collaborators
///   outside of this crate
///     (e.g. the parser).
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
#[repr(u16)]
pub enum MessageCode {
    SerializationError = 1,
    MultipleDefinitions = 2,
    InvalidCompileTarget = 3,
    IntrinsicNotFound = 4,
    ArgumentCountMismatch = 6,
    IdentifierNotFound = 7,
    ConstraintNotSatisfied = 8,
    InvalidBoundaryFunction = 10,
    RecursionNotAllowed = 11,
    MissingBoundaryConverter = 12,
    TypeError = 14,
    InvalidExpression = 16,
    InvalidBoundaryData = 18,
    CannotBeUsedAsInstanceFunction = 22,
    FunctionCannotBeUncurried = 23,
    NotCompileConstant = 24,
    ArgumentOutOfRange = 28,
    InfiniteLoop = 35,
    NotFunction = 36,
    NotIndexable = 37,
    NotConstraint = 38,
    CallStackLimitReached = 40,
    UnmappedBoundaryType = 41,
}

impl MessageCode {
    /// Public message number.
    pub fn number(self) -> u16 {
        self as u16
    }

    /// Severity of diagnostics of this class.
    ///
    /// Every diagnostic produced by the core is currently an error;
    ///   this exists so that the sink interface does not have to change
    ///   if that stops being true.
    pub fn level(self) -> Level {
        Level::Error
    }
}

impl Display for MessageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ELE{}", self.number())
    }
}

/// A single entry of the call stack at the time a diagnostic was raised.
///
/// This is a rendered description of the value being called,
///   captured eagerly since the value itself may not outlive the failed
///   resolution.
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct Frame(Rc<str>);

impl Frame {
    pub fn new<S: Into<Rc<str>>>(desc: S) -> Self {
        Self(desc.into())
    }
}

impl Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// A label associated with a report or [`Frame`].
///
/// See [`AnnotatedFrame`].
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Label<'a>(Cow<'a, str>);

impl<'a> Display for Label<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<'a> From<String> for Label<'a> {
    fn from(s: String) -> Self {
        Self(Cow::Owned(s))
    }
}

impl<'a> From<&'a str> for Label<'a> {
    fn from(s: &'a str) -> Self {
        Self(Cow::Borrowed(s))
    }
}

/// A frame with an associated severity level and optional label.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct AnnotatedFrame<'l>(Frame, Level, Option<Label<'l>>);

impl<'l> AnnotatedFrame<'l> {
    pub fn with_help<L: Into<Label<'l>>>(
        self,
        label: L,
    ) -> [AnnotatedFrame<'l>; 2] {
        let frame = self.0.clone();
        [self, frame.help(label)]
    }

    pub fn frame(&self) -> &Frame {
        &self.0
    }

    pub fn level(&self) -> Level {
        self.1
    }
}

impl<'l> From<AnnotatedFrame<'l>> for Vec<AnnotatedFrame<'l>> {
    fn from(x: AnnotatedFrame<'l>) -> Self {
        vec![x]
    }
}

pub trait Annotate: Sized {
    /// Annotate a [`Frame`] with a severity [`Level`] and an optional
    ///   [`Label`] to display alongside of it.
    fn annotate(self, level: Level, label: Option<Label>) -> AnnotatedFrame;

    /// Annotate a frame as an internal error that the user is not expected
    ///   to be able to resolve,
    ///     but may be able to work around.
    fn internal_error<'l, L: Into<Label<'l>>>(
        self,
        label: L,
    ) -> AnnotatedFrame<'l> {
        self.annotate(Level::InternalError, Some(label.into()))
    }

    /// Annotate a frame with a clarifying label styled as an error.
    fn error<'l, L: Into<Label<'l>>>(self, label: L) -> AnnotatedFrame<'l> {
        self.annotate(Level::Error, Some(label.into()))
    }

    /// Like [`Annotate::error`],
    ///   but only styles the frame as a [`Level::Error`] without attaching
    ///   a label.
    fn mark_error(self) -> AnnotatedFrame<'static> {
        self.annotate(Level::Error, None)
    }

    /// Supplemental annotated frame providing additional context for
    ///   another frame.
    fn note<'l, L: Into<Label<'l>>>(self, label: L) -> AnnotatedFrame<'l> {
        self.annotate(Level::Note, Some(label.into()))
    }

    /// Provide additional information that may be used to help the user in
    ///   debugging or fixing a diagnostic.
    fn help<'l, L: Into<Label<'l>>>(self, label: L) -> AnnotatedFrame<'l> {
        self.annotate(Level::Help, Some(label.into()))
    }
}

impl<F: Into<Frame>> Annotate for F {
    fn annotate(self, level: Level, label: Option<Label>) -> AnnotatedFrame {
        AnnotatedFrame(self.into(), level, label)
    }
}

impl From<&str> for Frame {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Frame {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
