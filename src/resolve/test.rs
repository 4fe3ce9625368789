// Resolution context tests
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
use crate::{
    decl::PortDecl,
    diagnose::{Level, MessageCode},
    intrinsic::prelude,
    ir::Constant,
};

type Sut = Context;

fn sut_with(decls: Vec<Decl>, options: CompilerOptions) -> Sut {
    let mut all = prelude();
    all.extend(decls);

    Sut::new(all, IntrinsicRegistry::with_defaults(), options)
}

fn sut(decls: Vec<Decl>) -> Sut {
    sut_with(decls, CompilerOptions::default())
}

fn call(callee: &str, args: Vec<Expr>) -> Expr {
    Expr::call(Expr::path(callee), args)
}

/// `id(a) = callee(a)`
fn forward(id: &str, callee: &str) -> Decl {
    Decl::function(
        id,
        vec![PortDecl::new("a")],
        None,
        call(callee, vec![Expr::ident("a")]),
    )
}

fn constant(sut: &Sut, value: &Value) -> Option<Constant> {
    value.as_instruction().and_then(|ix| sut.graph.as_constant(ix))
}

#[test]
fn resolves_bindings_through_nullary_unwrapping() {
    let mut sut = sut(vec![
        Decl::binding("x", Expr::num(5.)),
        Decl::binding("y", Expr::ident("x")),
        Decl::binding("f", Expr::ident("add")),
    ]);

    let y = sut.resolve_path("y").unwrap();
    assert_eq!(Some(Constant::num(5.)), constant(&sut, &y));

    // A binding to a function with ports is that very function.
    let f = sut.resolve_path("f").unwrap();
    let add = sut.resolve_path("add").unwrap();
    assert!(f.is_identical(&add));
}

#[test]
fn declarations_resolve_once() {
    let mut sut = sut(vec![Decl::structure(
        "Point",
        vec![PortDecl::of("x", "Num")],
        vec![],
    )]);

    let a = sut.resolve_path("Point").unwrap();
    let b = sut.resolve_path("Point").unwrap();

    assert!(a.is_identical(&b));
}

#[test]
fn direct_recursion_is_not_allowed() {
    let mut sut = sut(vec![forward("f", "f")]);
    let errs = sut.evaluate(&call("f", vec![Expr::num(1.)])).unwrap_err();

    assert_eq!(vec![MessageCode::RecursionNotAllowed], errs.codes());
    assert_eq!(&[Frame::from("function 'f'")], errs.first().trace());
    assert_eq!(0, sut.call_depth());
}

#[test]
fn indirect_recursion_is_not_allowed() {
    let mut sut = sut(vec![forward("f", "g"), forward("g", "h"), forward("h", "f")]);
    let errs = sut.evaluate(&call("f", vec![Expr::num(1.)])).unwrap_err();

    assert_eq!(vec![MessageCode::RecursionNotAllowed], errs.codes());
    assert_eq!(
        &[
            Frame::from("function 'h'"),
            Frame::from("function 'g'"),
            Frame::from("function 'f'"),
        ],
        errs.first().trace(),
    );
    assert_eq!(0, sut.call_depth());
}

#[test]
fn self_referential_binding_is_recursion() {
    let mut sut = sut(vec![Decl::binding(
        "x",
        call("add", vec![Expr::ident("x"), Expr::num(1.)]),
    )]);

    let errs = sut.resolve_path("x").unwrap_err();
    assert!(errs.has(MessageCode::RecursionNotAllowed));

    // The failure is memoized and not raised again.
    assert!(sut.resolve_path("x").unwrap().is_error());
}

#[test]
fn repeated_calls_are_not_recursion() {
    let twice = Decl::function(
        "twice",
        vec![PortDecl::of("a", "Num")],
        None,
        call(
            "add",
            vec![
                call("abs", vec![Expr::ident("a")]),
                call("abs", vec![Expr::ident("a")]),
            ],
        ),
    );

    let mut sut = sut(vec![twice]);
    let result = sut.evaluate(&call("twice", vec![Expr::num(-2.)])).unwrap();

    assert_eq!(Some(Constant::num(4.)), constant(&sut, &result));
}

#[test]
fn call_stack_limit() {
    let h = Decl::function("h", vec![PortDecl::new("a")], None, Expr::ident("a"));
    let decls = vec![forward("f", "g"), forward("g", "h"), h];

    let mut sut = sut_with(
        decls.clone(),
        CompilerOptions {
            call_stack_limit: 2,
            ..Default::default()
        },
    );

    let errs = sut.evaluate(&call("f", vec![Expr::num(1.)])).unwrap_err();
    assert_eq!(vec![MessageCode::CallStackLimitReached], errs.codes());
    assert_eq!(0, sut.call_depth());

    let mut sut = sut_with(
        decls,
        CompilerOptions {
            call_stack_limit: 3,
            ..Default::default()
        },
    );

    assert!(sut.evaluate(&call("f", vec![Expr::num(1.)])).is_ok());
}

#[test]
fn errors_carry_call_stack_innermost_first() {
    let f = Decl::function(
        "f",
        vec![PortDecl::of("a", "Num")],
        None,
        call("add", vec![Expr::ident("True"), Expr::ident("a")]),
    );

    let mut sut = sut(vec![f]);
    let errs = sut.evaluate(&call("f", vec![Expr::num(1.)])).unwrap_err();

    assert_eq!(vec![MessageCode::ConstraintNotSatisfied], errs.codes());
    assert_eq!(
        &[Frame::from("function 'add'"), Frame::from("function 'f'")],
        errs.first().trace(),
    );
}

#[test]
fn callee_and_argument_failures_are_reported_together() {
    let mut sut = sut(vec![]);
    let errs = sut
        .evaluate(&call("nope", vec![Expr::ident("nada"), Expr::ident("zilch")]))
        .unwrap_err();

    assert_eq!(
        vec![
            MessageCode::IdentifierNotFound,
            MessageCode::IdentifierNotFound,
            MessageCode::IdentifierNotFound,
        ],
        errs.codes()
    );
}

#[test]
fn ports_shadow_enclosing_scope() {
    let mut sut = sut(vec![
        Decl::binding("a", Expr::num(100.)),
        Decl::function("f", vec![PortDecl::new("a")], None, Expr::ident("a")),
        Decl::function("g", vec![PortDecl::new("b")], None, Expr::ident("a")),
    ]);

    let f = sut.evaluate(&call("f", vec![Expr::num(1.)])).unwrap();
    assert_eq!(Some(Constant::num(1.)), constant(&sut, &f));

    let g = sut.evaluate(&call("g", vec![Expr::num(1.)])).unwrap();
    assert_eq!(Some(Constant::num(100.)), constant(&sut, &g));
}

#[test]
fn duplicate_root_definitions_keep_first() {
    let mut sut = sut(vec![
        Decl::binding("x", Expr::num(1.)),
        Decl::binding("x", Expr::num(2.)),
    ]);

    let codes = sut
        .diagnostics()
        .iter()
        .map(ResolveError::code)
        .collect::<Vec<_>>();
    assert_eq!(vec![MessageCode::MultipleDefinitions], codes);

    let x = sut.resolve_path("x").unwrap();
    assert_eq!(Some(Constant::num(1.)), constant(&sut, &x));
}

#[test]
fn duplicate_scope_definitions_are_errors() {
    let mut sut = sut(vec![Decl::namespace(
        "Ns",
        vec![
            Decl::binding("x", Expr::num(1.)),
            Decl::binding("x", Expr::num(2.)),
        ],
    )]);

    let errs = sut.resolve_path("Ns").unwrap_err();
    assert_eq!(vec![MessageCode::MultipleDefinitions], errs.codes());
}

#[test]
fn resolve_all_reports_each_failure_once() {
    let mut sut = sut(vec![
        Decl::binding("good", Expr::num(1.)),
        Decl::binding("bad", Expr::ident("missing")),
        Decl::binding("user", call("add", vec![Expr::ident("bad"), Expr::num(1.)])),
        Decl::namespace(
            "Ns",
            vec![Decl::binding("worse", call("add", vec![]))],
        ),
    ]);

    let root = sut.root().clone();
    let resolved = sut.resolve_all(&root);

    let find = |id: &str| {
        resolved
            .iter()
            .find(|(member, _)| *member == id.intern())
            .map(|(_, value)| value.clone())
    };

    assert!(matches!(find("bad"), Some(Value::Error)));
    assert!(matches!(find("user"), Some(Value::Error)));
    assert!(matches!(find("Ns"), Some(Value::Namespace(_))));

    let good = find("good");
    assert_eq!(
        Some(Some(Constant::num(1.))),
        good.map(|v| constant(&sut, &v))
    );

    let codes = sut
        .diagnostics()
        .iter()
        .map(ResolveError::code)
        .collect::<Vec<_>>();
    assert_eq!(
        vec![MessageCode::IdentifierNotFound, MessageCode::ArgumentCountMismatch],
        codes
    );
}

#[test]
fn drains_diagnostics_to_sink() {
    let mut sut = sut(vec![]);
    let errs = sut.evaluate(&Expr::ident("missing")).unwrap_err();

    sut.report(errs);
    assert_eq!(1, sut.diagnostics().len());

    let mut sink = Vec::<CollectedDiagnostic>::new();
    sut.drain_diagnostics(&mut sink);

    assert!(sut.diagnostics().is_empty());
    assert_eq!(1, sink.len());
    assert_eq!(MessageCode::IdentifierNotFound, sink[0].code);
    assert_eq!(Level::Error, sink[0].level);
    assert_eq!("'missing' not found", sink[0].message);
}

#[test]
fn missing_intrinsic() {
    let mut sut = sut(vec![Decl::intrinsic_function(
        "mystery",
        vec![PortDecl::new("a")],
        None,
    )]);

    let errs = sut.resolve_path("mystery").unwrap_err();
    assert_eq!(vec![MessageCode::IntrinsicNotFound], errs.codes());
}

#[test]
fn intrinsic_of_wrong_kind() {
    let mut intrinsics = IntrinsicRegistry::with_defaults();
    intrinsics.register_function("Thing", |_, _| Ok(Value::Error));

    let mut decls = prelude();
    decls.push(Decl::intrinsic_struct("Thing", vec![]));

    let mut sut = Sut::new(decls, intrinsics, CompilerOptions::default());
    let errs = sut.resolve_path("Thing").unwrap_err();

    assert_eq!(vec![MessageCode::TypeError], errs.codes());
}

#[test]
fn malformed_declarations_are_invalid_expressions() {
    let mut sut = sut(vec![
        Decl {
            body: Body::Expr(Expr::num(1.)),
            ..Decl::structure("S", vec![], vec![])
        },
        Decl {
            body: Body::Terminal,
            ..Decl::function("f", vec![], None, Expr::num(1.))
        },
        Decl::structure("V", vec![PortDecl::variadic()], vec![]),
        Decl {
            body: Body::Expr(Expr::num(1.)),
            ..Decl::constraint("C", vec![], None)
        },
    ]);

    for id in ["S", "f", "V", "C"] {
        let errs = sut.resolve_path(id).unwrap_err();
        assert_eq!(vec![MessageCode::InvalidExpression], errs.codes(), "{id}");
    }
}

#[test]
fn explicit_call_through_context() {
    let mut sut = sut(vec![]);
    let add = sut.resolve_path("Num.add").unwrap();
    let args = vec![
        Value::Instruction(sut.graph.num(3.)),
        Value::Instruction(sut.graph.num(8.)),
    ];

    let sum = sut.call(&add, args).unwrap();

    assert_eq!(Some(Constant::num(11.)), constant(&sut, &sum));
}

#[test]
fn describes_values() {
    let mut sut = sut(vec![]);
    let add = sut.resolve_path("add").unwrap();
    let x = Value::Instruction(sut.graph.input(0, ScalarType::Num));

    assert_eq!("function 'add'", sut.describe(&add));
    assert_eq!("Num 'in0:Num'", sut.describe(&x));
}
