// Tests for diagnostic system rendering
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

use super::*;
use crate::diagnose::{Annotate, MessageCode};
use std::error::Error;

#[derive(Debug)]
struct StubError(String, Option<MessageCode>, Vec<AnnotatedFrame<'static>>);

impl Display for StubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for StubError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}

impl Diagnostic for StubError {
    fn code(&self) -> Option<MessageCode> {
        self.1
    }

    fn describe(&self) -> Vec<AnnotatedFrame> {
        self.2.clone()
    }
}

#[test]
fn renders_code_message_and_frames_innermost_first() {
    let err = StubError(
        "Expected '3' arguments but got '2'".into(),
        Some(MessageCode::ArgumentCountMismatch),
        vec![
            Frame::from("Vector3(x, y, z)").mark_error(),
            Frame::from("main").note("called from here"),
        ],
    );

    let mut sut = VisualReporter::new();

    assert_eq!(
        "error[ELE6]: Expected '3' arguments but got '2'\n\
         \x20 at Vector3(x, y, z)\n\
         \x20 at main\n\
         \x20  = note: called from here\n",
        sut.render(&err).to_string(),
    );
}

#[test]
fn renders_without_code_for_internal_diagnostics() {
    let err = StubError(
        "state compiled outside of its loop".into(),
        None,
        vec![Frame::from("for").internal_error("while compiling this loop")],
    );

    let report = VisualReporter::new().render(&err);

    assert_eq!(Level::InternalError, report.level());
    assert_eq!(
        "internal error: state compiled outside of its loop\n\
         \x20 at for\n\
         \x20  = internal error: while compiling this loop\n",
        report.to_string(),
    );
}

#[test]
fn adjacent_identical_frames_are_squashed() {
    let err = StubError(
        "bad".into(),
        Some(MessageCode::TypeError),
        vec![
            Frame::from("f").error("first"),
            Frame::from("f").help("second"),
            Frame::from("g").mark_error(),
        ],
    );

    assert_eq!(
        "error[ELE14]: bad\n\
         \x20 at f\n\
         \x20  = error: first\n\
         \x20  = help: second\n\
         \x20 at g\n",
        VisualReporter::new().render(&err).to_string(),
    );
}

#[test]
fn elides_frames_beyond_maximum() {
    let err = StubError(
        "deep".into(),
        Some(MessageCode::CallStackLimitReached),
        vec![
            Frame::from("a").mark_error(),
            Frame::from("b").mark_error(),
            Frame::from("c").mark_error(),
        ],
    );

    assert_eq!(
        "error[ELE40]: deep\n\
         \x20 at a\n\
         \x20 at b\n\
         \x20 ... 1 more frame(s)\n",
        VisualReporter::with_max_frames(2).render(&err).to_string(),
    );
}
