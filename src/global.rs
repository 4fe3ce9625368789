// Global constants across the entirety of Element Core
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

//! System-wide static configuration.
//!
//! This module provides a system-wide configuration.
//! Subsystems should reference these values rather than defining their own
//!   and risk incompatibilities or maintenance issues as requirements
//!   change.
//!
//! By convention,
//!   import this entire module rather than individual members and reference
//!   them as `global::foo` to emphasize their nature and risk.
//!
//! Values that may reasonably differ between two compilations in the same
//!   process belong in
//!   [`CompilerOptions`](crate::resolve::CompilerOptions) instead.

use std::num;

/// A size capable of representing every interned string in a program.
pub type ProgSymSize = u32;

/// A non-zero equivalent of [`ProgSymSize`];
pub type NonZeroProgSymSize = num::NonZeroU32;

/// A size capable of representing every node of a single instruction
///   graph.
///
/// Instruction graphs are hash-consed,
///   so this need only accommodate structurally distinct instructions,
///   but loops that are unrolled at compile time
///     (e.g. by `fold`)
///   can still produce a great many of them.
pub type InstrIxSize = u32;

/// Initial capacity of the global interner.
///
/// Identifiers in this language are short and heavily reused,
///   so this need not be large.
pub const INIT_GLOBAL_INTERNER_CAPACITY: usize = 1024;

/// Initial node capacity of an instruction graph.
pub const INIT_INSTRUCTION_CAPACITY: usize = 256;

/// Default maximum depth of the call stack before a call fails with
///   [`CallStackLimitReached`](crate::diagnose::MessageCode::CallStackLimitReached).
///
/// Recursion is disallowed outright,
///   so this guards only against pathologically deep (but finite) call
///   chains produced by generated code.
pub const DEFAULT_CALL_STACK_LIMIT: usize = 256;

/// Maximum number of times a nullary result will be automatically invoked
///   before unwrapping gives up and yields the last result.
///
/// Unwrapping also stops as soon as two successive results are
///   reference-identical;
///     this cap is for values that never settle.
pub const NULLARY_UNWRAP_LIMIT: usize = 64;

/// Maximum number of elements `fold` will unroll.
///
/// Every element contributes its own accumulator call to the graph;
///   a count beyond this is almost certainly a mistake rather than a
///   list anyone intends to compile.
pub const FOLD_UNROLL_LIMIT: usize = 65_536;
