// Interners used to intern values as symbols
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

//! Interners used to intern values as symbols.
//!
//! See the [parent module](super) for more information.
//!
//! ```
//! use element_core::sym::{Interner, DefaultInterner};
//!
//! let interner = DefaultInterner::new();
//!
//! let (ia, ib, ic) = (
//!     interner.intern("foo"),
//!     interner.intern(&"foo".to_string()),
//!     interner.intern("foobar"),
//! );
//!
//! assert_eq!(ia, ib);
//! assert_ne!(ia, ic);
//!
//! assert_eq!(2, interner.len());
//! assert!(interner.contains("foobar"));
//! assert_eq!(Some("foo"), interner.index_lookup(ia));
//! ```

use super::SymbolId;
use crate::global;
use bumpalo::Bump;
use fxhash::FxBuildHasher;
use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::BuildHasher;

/// Create, store, compare, and retrieve interned values.
///
/// Interners employ interior mutability and so do not need to be declared
///   `mut`.
pub trait Interner<'i> {
    /// Intern a string slice or return an existing [`SymbolId`].
    fn intern(&self, value: &str) -> SymbolId;

    /// Retrieve an existing intern for the string slice `s`,
    ///   if any.
    fn intern_soft(&self, value: &str) -> Option<SymbolId>;

    /// Determine whether the given value has already been interned.
    fn contains(&self, value: &str) -> bool;

    /// Number of interned strings.
    fn len(&self) -> usize;

    /// Whether nothing has yet been interned.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a previously interned string by its [`SymbolId`].
    fn index_lookup(&'i self, index: SymbolId) -> Option<&'i str>;
}

/// An interner backed by an arena.
///
/// Interned strings are copied into the arena,
///   which provides a stable location in memory for symbol data for the
///   lifetime of the interner.
pub struct ArenaInterner<'i, S>
where
    S: BuildHasher + Default,
{
    /// Storage for interned strings.
    arena: Bump,

    /// Interned strings by [`SymbolId`].
    ///
    /// The first index must always be populated during initialization to
    ///   ensure that [`SymbolId`] will never be `0`.
    strings: RefCell<Vec<&'i str>>,

    /// Map of interned strings to their respective [`SymbolId`].
    map: RefCell<HashMap<&'i str, SymbolId, S>>,
}

impl<'i, S> ArenaInterner<'i, S>
where
    S: BuildHasher + Default,
{
    /// Initialize a new interner with no initial capacity.
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Initialize a new interner with an initial capacity for the
    ///   underlying [`HashMap`].
    ///
    /// The given `capacity` has no affect on arena allocation.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        let mut strings = Vec::<_>::with_capacity(capacity + 1);

        // The first index is not used since SymbolId cannot be 0.
        strings.push("");

        Self {
            arena: Bump::new(),
            strings: RefCell::new(strings),
            map: RefCell::new(HashMap::with_capacity_and_hasher(
                capacity,
                Default::default(),
            )),
        }
    }

    fn copy_slice_into_arena(&self, value: &str) -> &'i str {
        // The arena is never reset and lives as long as `self`,
        //   and strings are only handed out with lifetimes tied to
        //   `self`.
        unsafe { &*(self.arena.alloc_str(value) as *const str) }
    }
}

impl<'i, S> Default for ArenaInterner<'i, S>
where
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<'i, S> Interner<'i> for ArenaInterner<'i, S>
where
    S: BuildHasher + Default,
{
    fn intern(&self, value: &str) -> SymbolId {
        let mut map = self.map.borrow_mut();

        if let Some(sym) = map.get(value) {
            return *sym;
        }

        let mut syms = self.strings.borrow_mut();

        let id = SymbolId::from_index(syms.len());
        let clone = self.copy_slice_into_arena(value);

        map.insert(clone, id);
        syms.push(clone);

        id
    }

    #[inline]
    fn intern_soft(&self, value: &str) -> Option<SymbolId> {
        self.map.borrow().get(value).copied()
    }

    #[inline]
    fn contains(&self, value: &str) -> bool {
        self.map.borrow().contains_key(value)
    }

    #[inline]
    fn len(&self) -> usize {
        self.map.borrow().len()
    }

    fn index_lookup(&'i self, index: SymbolId) -> Option<&'i str> {
        self.strings.borrow().get(index.as_usize()).copied()
    }
}

/// Interner using the [Fx Hash][fxhash] hashing function.
///
/// If denial of service is not a concern,
///   then this will outperform the default
///     [`DefaultHasher`](std::collections::hash_map::DefaultHasher).
pub type FxArenaInterner<'i> = ArenaInterner<'i, FxBuildHasher>;

/// Recommended [`Interner`] and configuration.
pub type DefaultInterner<'i> = FxArenaInterner<'i>;

/// Create the global interner with its configured initial capacity.
pub(super) fn new_global<'i>() -> DefaultInterner<'i> {
    DefaultInterner::with_capacity(global::INIT_GLOBAL_INTERNER_CAPACITY)
}

#[cfg(test)]
mod test {
    use super::*;

    type Sut<'i> = DefaultInterner<'i>;

    #[test]
    fn recognizes_equal_strings() {
        let a = "foo";
        let b = a.to_string();
        let c = "bar";
        let d = c.to_string();

        let sut = Sut::new();

        let (ia, ib, ic, id) =
            (sut.intern(a), sut.intern(&b), sut.intern(c), sut.intern(&d));

        assert_eq!(ia, ib);
        assert_eq!(ic, id);
        assert_ne!(ia, ic);
    }

    #[test]
    fn symbol_id_increases_with_each_new_intern() {
        let sut = Sut::new();

        // Remember that identifiers begin at 1
        assert_eq!(1, sut.intern("foo").as_usize());
        assert_eq!(2, sut.intern("bar").as_usize());
        // Already interned, should not increment
        assert_eq!(1, sut.intern("foo").as_usize());
    }

    #[test]
    fn length_increases_with_each_new_intern() {
        let sut = Sut::new();

        assert!(sut.is_empty());

        sut.intern("foo");
        sut.intern("foo");
        sut.intern("bar");

        assert_eq!(2, sut.len());
    }

    #[test]
    fn intern_soft() {
        let sut = Sut::new();

        assert_eq!(None, sut.intern_soft("foo"));

        let foo = sut.intern("foo");
        assert_eq!(Some(foo), sut.intern_soft("foo"));
    }

    #[test]
    fn lookup_symbol_by_index() {
        let sut = Sut::new();

        let foo = sut.intern("foo");
        let bar = sut.intern("bar");

        assert_eq!(Some("foo"), sut.index_lookup(foo));
        assert_eq!(Some("bar"), sut.index_lookup(bar));
    }
}
