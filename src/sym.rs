// String internment
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

//! String internment system.
//!
//! Every identifier in a declaration tree
//!   (declaration names, port names, member names)
//!   is interned as a [`SymbolId`].
//! Comparing identifiers is then an integer comparison,
//!   which matters since identifier lookup through chains of
//!   [`ResolvedBlock`](crate::value::ResolvedBlock)s is the hottest path of
//!   resolution.
//!
//! Symbols are created, stored, compared, and retrieved by an
//!   [`Interner`]:
//!
//!   - [`ArenaInterner`] - Intern pool backed by an arena for storage and a
//!       map for lookup.
//!   - [`DefaultInterner`] - The currently recommended configuration.
//!
//! Global Interner
//! ===============
//! Symbols are so pervasive that threading an interner through every
//!   function that needs one would be an unnecessary burden.
//! A thread-local global interner is therefore provided,
//!   and is used through two traits:
//!
//!   - [`GlobalSymbolIntern`] to intern a string
//!       (`"foo".intern()`); and
//!   - [`GlobalSymbolResolve`] to look up the string of a symbol
//!       (`sym.lookup_str()`).
//!
//! [`SymbolId`]s also resolve through the global interner via [`Display`].
//!
//! ```
//! use element_core::sym::{GlobalSymbolIntern, GlobalSymbolResolve};
//!
//! let a = "foo".intern();
//! let b = String::from("foo").as_str().intern();
//! let c = "bar".intern();
//!
//! assert_eq!(a, b);
//! assert_ne!(a, c);
//! assert_eq!("foo", a.lookup_str());
//! assert_eq!("bar", format!("{}", c));
//! ```
//!
//! Since the global interner is thread-local,
//!   symbols must not be shared between threads;
//!     this matches the single-threaded model of a compilation
//!     [`Context`](crate::resolve::Context).
//!
//! [`Display`]: std::fmt::Display

mod interner;
mod symbol;

pub use interner::{
    ArenaInterner, DefaultInterner, FxArenaInterner, Interner,
};
pub use symbol::{GlobalSymbolIntern, GlobalSymbolResolve, SymbolId};
