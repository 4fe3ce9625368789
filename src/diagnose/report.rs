// Diagnostic system rendering
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

//! Rendering of diagnostic information.

// NB: `write!` together with `\n` is preferred to `writeln!` so that there
//   is only a single sequence of characters to search for while tracking
//   down newlines,
//     rather than using both.

use super::{AnnotatedFrame, Diagnostic, Frame, Label, Level};
use std::fmt::{self, Display};

pub trait Reporter {
    /// Render diagnostic report.
    ///
    /// The provided [`Report`] implements [`Display`].
    ///
    /// It is important to note that this method
    ///   _does not return [`Result`]_ and should never fail,
    ///     unless due to a panic in the standard library
    ///       (e.g. due to allocation failure).
    fn render<'d, D: Diagnostic>(&mut self, diagnostic: &'d D)
        -> Report<'d, D>;
}

/// Render diagnostic report in a highly visual way.
///
/// The report leads with the severity and message code,
///   followed by the message itself and then one section per call stack
///   frame,
///     innermost first,
///     in the style of a stack trace.
#[derive(Debug, Default)]
pub struct VisualReporter {
    /// Maximum number of frames to render before eliding the remainder.
    ///
    /// [`None`] renders every frame.
    max_frames: Option<usize>,
}

impl VisualReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render at most `max` frames per report.
    pub fn with_max_frames(max: usize) -> Self {
        Self {
            max_frames: Some(max),
        }
    }
}

impl Reporter for VisualReporter {
    fn render<'d, D: Diagnostic>(
        &mut self,
        diagnostic: &'d D,
    ) -> Report<'d, D> {
        let mut report = Report::empty(Message(diagnostic), diagnostic.code());
        let afs = diagnostic.describe();
        let total = afs.len();

        report.extend(
            afs.into_iter()
                .take(self.max_frames.unwrap_or(total))
                .map(Section::from),
        );

        report.elided = total - report.secs.iter().map(Section::len).sum::<usize>();
        report
    }
}

#[derive(Debug)]
pub struct Report<'d, D: Diagnostic> {
    msg: Message<'d, D>,
    code: Option<super::MessageCode>,
    secs: Vec<Section<'d>>,
    level: Level,
    elided: usize,
}

impl<'d, D: Diagnostic> Report<'d, D> {
    fn empty(msg: Message<'d, D>, code: Option<super::MessageCode>) -> Self {
        Self {
            msg,
            code,
            secs: Vec::new(),
            level: code.map(|c| c.level()).unwrap_or_default(),
            elided: 0,
        }
    }

    /// Severity of the report,
    ///   which is the most severe level of any of its sections.
    pub fn level(&self) -> Level {
        self.level
    }
}

impl<'d, D: Diagnostic> Extend<Section<'d>> for Report<'d, D> {
    fn extend<T: IntoIterator<Item = Section<'d>>>(&mut self, secs: T) {
        for sec in secs {
            self.level = self.level.min(sec.level);

            // Add the section if it cannot be squashed into the previous.
            let remain = sec.maybe_squash_into(self.secs.last_mut());
            self.secs.extend(remain);
        }
    }
}

impl<'d, D: Diagnostic> Display for Report<'d, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{}[{code}]: {}\n", self.level, self.msg)?,
            None => write!(f, "{}: {}\n", self.level, self.msg)?,
        }

        self.secs.iter().try_for_each(|sec| sec.fmt(f))?;

        if self.elided > 0 {
            write!(f, "  ... {} more frame(s)\n", self.elided)?;
        }

        Ok(())
    }
}

#[derive(Debug)]
struct Message<'d, D: Diagnostic>(&'d D);

impl<'d, D: Diagnostic> Display for Message<'d, D> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Display::fmt(self.0, f)
    }
}

/// A section of a [`Report`] describing a [`Frame`].
///
/// Adjacent sections describing the same [`Frame`] are squashed
///   (see [`Section::maybe_squash_into`]),
///   but not non-adjacent ones,
///     since a frame may legitimately appear more than once in a stack
///     that is being reported as part of a recursion error.
#[derive(Debug, PartialEq, Eq)]
struct Section<'d> {
    frame: Frame,
    labels: Vec<(Level, Label<'d>)>,
    level: Level,
    /// Number of annotated frames squashed into this section.
    count: usize,
}

impl<'d> Section<'d> {
    fn len(&self) -> usize {
        self.count
    }

    /// Squash self into the provided [`Section`] if they represent the same
    ///   [`Frame`],
    ///     otherwise do nothing.
    ///
    /// If squashed,
    ///   [`None`] is returned.
    /// Otherwise [`Some`] is returned with `self`.
    ///
    /// The term "squash" is borrowed from `git rebase`.
    fn maybe_squash_into(
        self,
        extend: Option<&mut Section<'d>>,
    ) -> Option<Self> {
        match extend {
            Some(extend_sec) if self.frame == extend_sec.frame => {
                extend_sec.labels.extend(self.labels);
                extend_sec.level = extend_sec.level.min(self.level);
                extend_sec.count += self.count;
                None
            }

            _ => Some(self),
        }
    }
}

impl<'d> From<AnnotatedFrame<'d>> for Section<'d> {
    fn from(AnnotatedFrame(frame, level, olabel): AnnotatedFrame<'d>) -> Self {
        Section {
            frame,
            labels: olabel.into_iter().map(|label| (level, label)).collect(),
            level,
            count: 1,
        }
    }
}

impl<'d> Display for Section<'d> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  at {frame}\n", frame = self.frame)?;

        for (level, label) in self.labels.iter() {
            write!(f, "   = {level}: {label}\n")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test;
