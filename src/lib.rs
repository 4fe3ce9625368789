// Element Core
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

//! Semantic core of the Element expression language.
//!
//! Element programs arrive here as a tree of already-parsed declarations
//!   ([`decl`]).
//! The core resolves those declarations into [values](value),
//!   checking constraints and forbidding recursion along the way
//!   ([`resolve`]),
//!   reduces scalar computations to a hash-consed dataflow graph
//!   ([`ir`]),
//!   and compiles that graph into imperative native code
//!   ([`native`]) that is invoked with host data through the
//!   [`boundary`].
//!
//! A typical session looks like this:
//!
//! ```
//! use element_core::{
//!     boundary::{self, BoundaryMap, HostType, HostValue, NativeSignature},
//!     decl::{Decl, Expr, PortDecl},
//!     intrinsic::IntrinsicRegistry,
//!     resolve::{CompilerOptions, Context},
//! };
//!
//! let decls = vec![
//!     Decl::intrinsic_struct("Num", vec![]),
//!     Decl::intrinsic_function(
//!         "add",
//!         vec![PortDecl::of("a", "Num"), PortDecl::of("b", "Num")],
//!         Some(Expr::ident("Num")),
//!     ),
//! ];
//!
//! let mut ctx = Context::new(
//!     decls,
//!     IntrinsicRegistry::with_defaults(),
//!     CompilerOptions::default(),
//! );
//!
//! let add = ctx.evaluate(&Expr::ident("add")).unwrap();
//! let sig = NativeSignature::new(
//!     vec![HostType::F32, HostType::F32],
//!     HostType::F32,
//! );
//! let f = boundary::compile(&mut ctx, &add, &sig, &BoundaryMap::with_defaults())
//!     .unwrap();
//!
//! assert_eq!(
//!     Ok(HostValue::F32(11.)),
//!     f.call(&[HostValue::F32(3.), HostValue::F32(8.)]),
//! );
//! ```

// We build docs for private items.
#![allow(rustdoc::private_intra_doc_links)]

pub mod global;

#[macro_use]
extern crate static_assertions;

#[macro_use]
pub mod diagnose;

pub mod boundary;
pub mod decl;
pub mod intrinsic;
pub mod ir;
pub mod iter;
pub mod native;
pub mod resolve;
pub mod sym;
pub mod value;
