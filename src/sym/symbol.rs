// Symbol objects for string internment system
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

//! Symbol objects representing interned strings.
//!
//! See the [parent module](super) for more information.

use super::interner::{new_global, DefaultInterner, Interner};
use crate::global;
use std::convert::TryInto;
use std::fmt::{Debug, Display};

/// Unique symbol identifier produced by an [`Interner`].
///
/// The index `0` is never valid,
///   which allows us to have `Option<SymbolId>` at no space cost.
///
/// To resolve a [`SymbolId`] into the string that it represents,
///   see either [`GlobalSymbolResolve::lookup_str`] or
///   [`Interner::index_lookup`].
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(global::NonZeroProgSymSize);
assert_eq_size!(Option<SymbolId>, SymbolId);

impl SymbolId {
    /// Construct a symbol from the index of its string within an
    ///   interner.
    ///
    /// Panics
    /// ======
    /// Index `0` is reserved and the index must fit within
    ///   [`global::ProgSymSize`];
    ///     violating either is a bug in the interner.
    pub(super) fn from_index(index: usize) -> Self {
        index
            .try_into()
            .ok()
            .and_then(global::NonZeroProgSymSize::new)
            .map(SymbolId)
            .unwrap_or_else(|| {
                diagnostic_panic!(
                    vec![],
                    "SymbolId range exhausted or invalid at index {index}"
                )
            })
    }

    pub fn as_usize(self) -> usize {
        self.0.get() as usize
    }
}

thread_local! {
    static INTERNER: DefaultInterner<'static> = new_global();
}

/// Perform an operation using the global interner.
///
/// The thread-local storage is never deallocated while the thread is
///   alive and is only accessible to one thread,
///     so the lifetime of the interner may be extended to `'static` for
///     the purpose of returning string slices from its arena.
fn with_static_interner<F, R>(f: F) -> R
where
    F: FnOnce(&'static DefaultInterner<'static>) -> R,
{
    INTERNER.with(|interner| {
        f(unsafe {
            // These type annotations are inferred, but please leave
            // them here; transmute is especially dangerous, and we want
            // to be sure reality always matches our expectations.
            std::mem::transmute::<
                &DefaultInterner<'static>,
                &'static DefaultInterner<'static>,
            >(interner)
        })
    })
}

/// Resolve a [`SymbolId`] to the string value it represents using the
///   global interner.
///
/// This exists as its own trait
///   (rather than simply adding to [`SymbolId`])
///   to make it easy to see what systems rely on global state.
pub trait GlobalSymbolResolve {
    /// Resolve a [`SymbolId`] allocated using the global interner.
    ///
    /// Panics
    /// ======
    /// This will panic if the symbol cannot be found,
    ///   which would represent a bug in the program.
    fn lookup_str(&self) -> &'static str;

    /// Attempt to resolve a [`SymbolId`] allocated using the global
    ///   interner.
    ///
    /// Unlike [`GlobalSymbolResolve::lookup_str`],
    ///   this cannot panic.
    fn try_lookup_str(&self) -> Option<&'static str>;
}

impl GlobalSymbolResolve for SymbolId {
    fn lookup_str(&self) -> &'static str {
        with_static_interner(|interner| {
            interner.index_lookup(*self).unwrap_or_else(|| {
                diagnostic_panic!(
                    vec![],
                    "failed to resolve SymbolId({}) using global \
                         interner of length {}",
                    self.0,
                    interner.len()
                )
            })
        })
    }

    fn try_lookup_str(&self) -> Option<&'static str> {
        with_static_interner(|interner| interner.index_lookup(*self))
    }
}

impl Display for SymbolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.lookup_str())
    }
}

impl Debug for SymbolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // We have to be careful here when looking up the symbol, since this
        // may be called during a panic, and we don't want to panic yet
        // again if we cannot find the symbol.
        write!(
            f,
            "SymbolId({} \"{}\")",
            self.0,
            self.try_lookup_str().unwrap_or("<#!UNKNOWN_SYMBOL>")
        )
    }
}

/// Intern a string using the global interner.
///
/// This provides a convenient API that creates the appearance that string
///   interning is a core Rust language feature
///   (e.g. `"foo".intern()`).
pub trait GlobalSymbolIntern {
    /// Intern a string using the global interner.
    fn intern(self) -> SymbolId;
}

impl GlobalSymbolIntern for &str {
    fn intern(self) -> SymbolId {
        with_static_interner(|interner| interner.intern(self))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn global_symbols_resolve_to_their_strings() {
        let sym = "global_symbols_resolve".intern();

        assert_eq!("global_symbols_resolve", sym.lookup_str());
        assert_eq!(sym, "global_symbols_resolve".intern());
        assert_eq!(
            format!("SymbolId({} \"global_symbols_resolve\")", sym.0),
            format!("{:?}", sym),
        );
    }
}
