// Declaration tree consumed by the resolution engine
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

//! Already-parsed declarations.
//!
//! The parser is not part of this crate;
//!   it produces a tree of [`Decl`]s that is handed to
//!   [`Context::new`](crate::resolve::Context::new).
//! Declarations are immutable and shared by [`Rc`] so that the values
//!   resolved from them can refer back to their bodies without copying.
//!
//! The constructors here mirror the source forms of the language:
//!
//! | Source                                   | Constructor                    |
//! |------------------------------------------|--------------------------------|
//! | `x = 5`                                  | [`Decl::binding`]              |
//! | `f(a:Num, b) = a.add(b)`                 | [`Decl::function`]             |
//! | `f(a) { t = a; return = t }`             | [`Decl::scoped_function`]      |
//! | `intrinsic function add(a:Num, b:Num):Num` | [`Decl::intrinsic_function`] |
//! | `intrinsic True:Bool`                    | [`Decl::intrinsic_value`]      |
//! | `struct Vec2(x:Num, y:Num) { ... }`      | [`Decl::structure`]            |
//! | `intrinsic struct Num { ... }`           | [`Decl::intrinsic_struct`]     |
//! | `constraint Pred(a:Num):Bool`            | [`Decl::constraint`]           |
//! | `intrinsic constraint Any`               | [`Decl::intrinsic_constraint`] |
//! | `namespace Ns { ... }`                   | [`Decl::namespace`]            |

use crate::sym::{GlobalSymbolIntern, SymbolId};
use std::{
    fmt::{self, Display},
    rc::Rc,
};

/// An ordered, immutable sequence of declarations forming one scope.
pub type DeclBlock = Rc<[Rc<Decl>]>;

/// Construct a [`DeclBlock`] from owned declarations.
pub fn block<I: IntoIterator<Item = Decl>>(decls: I) -> DeclBlock {
    decls.into_iter().map(Rc::new).collect()
}

/// The kind of entity a [`Decl`] introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Function,
    Struct,
    Constraint,
    Namespace,
}

impl Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function => write!(f, "function"),
            Self::Struct => write!(f, "struct"),
            Self::Constraint => write!(f, "constraint"),
            Self::Namespace => write!(f, "namespace"),
        }
    }
}

/// A single declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Decl {
    pub id: SymbolId,
    pub kind: DeclKind,
    /// Port list,
    ///   or [`None`] if the declaration has no parenthesized port list at
    ///   all.
    pub ports: Option<Vec<PortDecl>>,
    /// Declared return constraint
    ///   (for functions and function constraints).
    pub ret: Option<Expr>,
    pub body: Body,
}

/// Body of a [`Decl`].
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Implemented natively and looked up by qualified identifier;
    ///   intrinsic structs may carry associated members.
    Intrinsic(Option<DeclBlock>),
    /// A single expression evaluated against the captured scope.
    Expr(Expr),
    /// A nested scope;
    ///   functions yield its `return` member.
    Scope(DeclBlock),
    /// No body at all
    ///   (e.g. a struct without associated members or a function
    ///   constraint).
    Terminal,
}

impl Decl {
    fn new(
        id: &str,
        kind: DeclKind,
        ports: Option<Vec<PortDecl>>,
        ret: Option<Expr>,
        body: Body,
    ) -> Self {
        Self {
            id: id.intern(),
            kind,
            ports,
            ret,
            body,
        }
    }

    /// A nullary binding `id = expr`.
    pub fn binding(id: &str, expr: Expr) -> Self {
        Self::new(id, DeclKind::Function, None, None, Body::Expr(expr))
    }

    /// An expression-bodied function.
    pub fn function(
        id: &str,
        ports: Vec<PortDecl>,
        ret: Option<Expr>,
        body: Expr,
    ) -> Self {
        Self::new(id, DeclKind::Function, Some(ports), ret, Body::Expr(body))
    }

    /// A scope-bodied function whose result is its `return` member.
    pub fn scoped_function(
        id: &str,
        ports: Vec<PortDecl>,
        ret: Option<Expr>,
        members: Vec<Decl>,
    ) -> Self {
        Self::new(
            id,
            DeclKind::Function,
            Some(ports),
            ret,
            Body::Scope(block(members)),
        )
    }

    pub fn intrinsic_function(
        id: &str,
        ports: Vec<PortDecl>,
        ret: Option<Expr>,
    ) -> Self {
        Self::new(
            id,
            DeclKind::Function,
            Some(ports),
            ret,
            Body::Intrinsic(None),
        )
    }

    /// An intrinsic nullary such as `True` or `NaN`.
    pub fn intrinsic_value(id: &str, ret: Option<Expr>) -> Self {
        Self::new(id, DeclKind::Function, None, ret, Body::Intrinsic(None))
    }

    pub fn structure(
        id: &str,
        fields: Vec<PortDecl>,
        members: Vec<Decl>,
    ) -> Self {
        let body = match members.is_empty() {
            true => Body::Terminal,
            false => Body::Scope(block(members)),
        };

        Self::new(id, DeclKind::Struct, Some(fields), None, body)
    }

    pub fn intrinsic_struct(id: &str, members: Vec<Decl>) -> Self {
        let members = match members.is_empty() {
            true => None,
            false => Some(block(members)),
        };

        Self::new(id, DeclKind::Struct, None, None, Body::Intrinsic(members))
    }

    /// A function constraint describing a function signature.
    pub fn constraint(
        id: &str,
        ports: Vec<PortDecl>,
        ret: Option<Expr>,
    ) -> Self {
        Self::new(id, DeclKind::Constraint, Some(ports), ret, Body::Terminal)
    }

    pub fn intrinsic_constraint(id: &str) -> Self {
        Self::new(id, DeclKind::Constraint, None, None, Body::Intrinsic(None))
    }

    pub fn namespace(id: &str, members: Vec<Decl>) -> Self {
        Self::new(
            id,
            DeclKind::Namespace,
            None,
            None,
            Body::Scope(block(members)),
        )
    }

    /// Replace the port list of this declaration.
    ///
    /// This is useful for intrinsic structs,
    ///   which are otherwise declared without fields.
    pub fn with_ports(self, ports: Vec<PortDecl>) -> Self {
        Self {
            ports: Some(ports),
            ..self
        }
    }

    /// Whether this declaration has any ports.
    pub fn is_nullary(&self) -> bool {
        self.ports.as_ref().map_or(true, Vec::is_empty)
    }
}

/// A single formal parameter of a [`Decl`].
#[derive(Debug, Clone, PartialEq)]
pub struct PortDecl {
    /// Identifier of the port,
    ///   or [`None`] for a discard (`_`).
    pub id: Option<SymbolId>,
    pub constraint: Option<Expr>,
    pub default: Option<Expr>,
    /// Whether this is the variadic port `...`.
    pub variadic: bool,
}

impl PortDecl {
    /// An unconstrained port.
    pub fn new(id: &str) -> Self {
        Self {
            id: Some(id.intern()),
            constraint: None,
            default: None,
            variadic: false,
        }
    }

    /// A port constrained by the identifier `constraint`.
    pub fn of(id: &str, constraint: &str) -> Self {
        Self::new(id).constrained(Expr::path(constraint))
    }

    /// A port whose argument is discarded.
    pub fn discard() -> Self {
        Self {
            id: None,
            constraint: None,
            default: None,
            variadic: false,
        }
    }

    /// The variadic port,
    ///   accepting any number of further arguments.
    pub fn variadic() -> Self {
        Self {
            variadic: true,
            ..Self::discard()
        }
    }

    pub fn constrained(self, constraint: Expr) -> Self {
        Self {
            constraint: Some(constraint),
            ..self
        }
    }

    pub fn with_default(self, default: Expr) -> Self {
        Self {
            default: Some(default),
            ..self
        }
    }
}

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal.
    Num(f32),
    /// Identifier looked up through the scope chain.
    Ident(SymbolId),
    /// Call of the first expression with the given arguments.
    Call(Box<Expr>, Vec<Expr>),
    /// Member access `expr.id`.
    Index(Box<Expr>, SymbolId),
    /// Anonymous function capturing the scope in which it is evaluated.
    Lambda(Rc<Decl>),
    /// Anonymous block `{ a = 1, b = 2 }`,
    ///   which evaluates to a structural tuple.
    Block(DeclBlock),
}

impl Expr {
    pub fn num(n: f32) -> Self {
        Self::Num(n)
    }

    pub fn ident(id: &str) -> Self {
        Self::Ident(id.intern())
    }

    /// A dotted path `a.b.c`,
    ///   which is an identifier followed by member accesses.
    pub fn path(path: &str) -> Self {
        let mut parts = path.split('.');
        let head = Self::ident(parts.next().unwrap_or_default());

        parts.fold(head, Self::index)
    }

    pub fn call(callee: Expr, args: Vec<Expr>) -> Self {
        Self::Call(Box::new(callee), args)
    }

    pub fn index(expr: Expr, id: &str) -> Self {
        Self::Index(Box::new(expr), id.intern())
    }

    pub fn lambda(ports: Vec<PortDecl>, body: Expr) -> Self {
        Self::Lambda(Rc::new(Decl::function("_", ports, None, body)))
    }

    pub fn block(members: Vec<Decl>) -> Self {
        Self::Block(block(members))
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{n}"),
            Self::Ident(id) => write!(f, "{id}"),
            Self::Call(callee, args) => {
                write!(f, "{callee}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Self::Index(expr, id) => write!(f, "{expr}.{id}"),
            Self::Lambda(decl) => write!(f, "<lambda/{}>", port_count(decl)),
            Self::Block(decls) => {
                write!(f, "{{")?;
                for (i, decl) in decls.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", decl.id)?;
                }
                write!(f, "}}")
            }
        }
    }
}

fn port_count(decl: &Decl) -> usize {
    decl.ports.as_ref().map_or(0, Vec::len)
}
