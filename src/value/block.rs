// Memoizing lexical scopes
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

//! Lexical scopes.
//!
//! A [`ResolvedBlock`] lazily resolves the declarations of one scope and
//!   memoizes the result for each identifier.
//! Memoization is not merely an optimization:
//!   identity of functions and types is reference identity,
//!     and so a declaration must yield the very same value every time it
//!     is looked up within the same block.
//!
//! Each slot is written at most once.
//! An identifier whose resolution is still in progress when it is looked
//!   up again is being defined in terms of itself,
//!     which is [`ResolveErrorKind::RecursionNotAllowed`].
//! A failed resolution is memoized as [`Value::Error`] so that it is
//!   reported only once.

use super::Value;
use crate::{
    decl::{Decl, DeclBlock},
    resolve::{Context, ResolveErrorKind, ResolveResult},
    sym::SymbolId,
};
use fxhash::{FxHashMap, FxHashSet};
use std::{cell::RefCell, fmt, rc::Rc};

#[derive(Debug, Clone)]
enum Slot {
    InProgress,
    Resolved(Value),
}

/// A memoizing identifier to [`Value`] binding with an optional parent
///   scope.
pub struct ResolvedBlock {
    /// Qualified name of this scope,
    ///   which is empty for the root.
    path: String,
    parent: Option<Rc<ResolvedBlock>>,
    /// Member identifiers in declaration order.
    order: Vec<SymbolId>,
    decls: FxHashMap<SymbolId, Rc<Decl>>,
    slots: RefCell<FxHashMap<SymbolId, Slot>>,
}

impl fmt::Debug for ResolvedBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Members and parents may be arbitrarily large.
        write!(
            f,
            "[ResolvedBlock '{}': {} members]",
            self.path,
            self.order.len()
        )
    }
}

impl ResolvedBlock {
    /// Create a block from declarations,
    ///   returning any identifiers that were declared more than once
    ///   alongside of it.
    ///
    /// The first declaration of a duplicated identifier is retained.
    pub fn with_duplicates(
        decls: DeclBlock,
        parent: Option<Rc<ResolvedBlock>>,
        path: String,
    ) -> (Rc<Self>, Vec<SymbolId>) {
        let mut order = Vec::with_capacity(decls.len());
        let mut map = FxHashMap::default();
        let mut dups = Vec::new();

        for decl in decls.iter() {
            if map.contains_key(&decl.id) {
                dups.push(decl.id);
                continue;
            }

            order.push(decl.id);
            map.insert(decl.id, decl.clone());
        }

        let block = Self {
            path,
            parent,
            order,
            decls: map,
            slots: RefCell::new(FxHashMap::default()),
        };

        (Rc::new(block), dups)
    }

    /// Create a block from declarations.
    ///
    /// Duplicate identifiers are [`ResolveErrorKind::MultipleDefinitions`].
    pub fn build(
        ctx: &Context,
        decls: DeclBlock,
        parent: Option<Rc<ResolvedBlock>>,
        path: String,
    ) -> ResolveResult<Rc<Self>> {
        let (block, dups) = Self::with_duplicates(decls, parent, path);

        match dups.first() {
            None => Ok(block),
            Some(id) => Err(ctx.error(ResolveErrorKind::MultipleDefinitions(*id))),
        }
    }

    /// A block of already-resolved values,
    ///   such as the arguments of a call.
    pub fn frame<I>(parent: &Rc<ResolvedBlock>, path: &str, bindings: I) -> Rc<Self>
    where
        I: IntoIterator<Item = (SymbolId, Value)>,
    {
        let mut order = Vec::new();
        let mut slots = FxHashMap::default();
        let mut seen = FxHashSet::default();

        for (id, value) in bindings {
            if seen.insert(id) {
                order.push(id);
                slots.insert(id, Slot::Resolved(value));
            }
        }

        Rc::new(Self {
            path: path.into(),
            parent: Some(parent.clone()),
            order,
            decls: FxHashMap::default(),
            slots: RefCell::new(slots),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn parent(&self) -> Option<&Rc<ResolvedBlock>> {
        self.parent.as_ref()
    }

    /// Fully qualified name of the member `id` of this block.
    pub fn qualify(&self, id: SymbolId) -> String {
        match self.path.is_empty() {
            true => id.to_string(),
            false => format!("{}.{id}", self.path),
        }
    }

    pub fn members(&self) -> &[SymbolId] {
        &self.order
    }

    pub fn contains(&self, id: SymbolId) -> bool {
        self.decls.contains_key(&id) || self.slots.borrow().contains_key(&id)
    }

    /// Resolve the member `id` of this block,
    ///   or [`None`] if this block has no such member.
    pub fn get(
        self: &Rc<Self>,
        ctx: &mut Context,
        id: SymbolId,
    ) -> Option<ResolveResult<Value>> {
        // The borrow must end before resolution,
        //   which may re-enter this block.
        let slot = self.slots.borrow().get(&id).cloned();

        match slot {
            Some(Slot::Resolved(value)) => return Some(Ok(value)),
            Some(Slot::InProgress) => {
                return Some(Err(ctx.error(
                    ResolveErrorKind::RecursionNotAllowed(format!(
                        "'{}'",
                        self.qualify(id)
                    )),
                )))
            }
            None => (),
        }

        let decl = self.decls.get(&id)?.clone();
        self.slots.borrow_mut().insert(id, Slot::InProgress);

        let result = ctx
            .resolve_decl(&decl, self)
            .and_then(|value| ctx.unwrap_nullary(value));

        let memo = result.as_ref().map_or(Value::Error, Value::clone);
        self.slots.borrow_mut().insert(id, Slot::Resolved(memo));

        Some(result)
    }

    /// Resolve the member `id` of this block,
    ///   without consulting parent scopes.
    pub fn index(
        self: &Rc<Self>,
        ctx: &mut Context,
        id: SymbolId,
    ) -> ResolveResult<Value> {
        self.get(ctx, id).unwrap_or_else(|| {
            Err(ctx.error(ResolveErrorKind::IdentifierNotFound(id)))
        })
    }

    /// Resolve `id` in this block or,
    ///   failing that,
    ///   the nearest enclosing scope that declares it.
    pub fn lookup(
        self: &Rc<Self>,
        ctx: &mut Context,
        id: SymbolId,
    ) -> ResolveResult<Value> {
        let mut scope = self;

        loop {
            if let Some(result) = scope.get(ctx, id) {
                return result;
            }

            match &scope.parent {
                Some(parent) => scope = parent,
                None => {
                    return Err(ctx.error(ResolveErrorKind::IdentifierNotFound(
                        id,
                    )))
                }
            }
        }
    }
}
