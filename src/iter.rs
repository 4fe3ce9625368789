// Iterator utilities
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

//! Iterators for common problems.
//!
//! [`Result`] Iterators
//! ====================
//! Rust's [`Iterator::collect`] into a [`Result`] stops at the first
//!   [`Err`].
//! That is the wrong behavior for independent sub-resolutions,
//!   such as checking every argument of a call against its port:
//!     the user should be told about _every_ argument that does not
//!     satisfy its constraint,
//!       not just the first.
//!
//! [`CollectAll::collect_all`] instead consumes the entire iterator,
//!   merging every failure using [`Accumulate`],
//!   and succeeds only if no element failed.
//! It is still a short-circuiting operation from the perspective of the
//!   caller:
//!     on failure,
//!       no collection is produced,
//!       and so nothing that depends on the collection can proceed.

mod collect;

pub use collect::{Accumulate, CollectAll};
