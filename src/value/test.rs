// Value protocol tests
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
    decl::{Decl, Expr, PortDecl},
    diagnose::MessageCode,
    intrinsic::{prelude, IntrinsicRegistry},
    ir::{Constant, ScalarType},
    resolve::CompilerOptions,
    sym::GlobalSymbolIntern,
};

fn ctx_with(decls: Vec<Decl>) -> Context {
    let mut all = prelude();
    all.extend(decls);

    Context::new(all, IntrinsicRegistry::with_defaults(), CompilerOptions::default())
}

fn call(callee: &str, args: Vec<Expr>) -> Expr {
    Expr::call(Expr::path(callee), args)
}

fn num(ctx: &mut Context, n: f32) -> Value {
    Value::Instruction(ctx.graph.num(n))
}

/// The constant that `value` reduced to.
fn constant(ctx: &Context, value: &Value) -> Option<Constant> {
    value.as_instruction().and_then(|ix| ctx.graph.as_constant(ix))
}

fn vector3() -> Decl {
    Decl::structure(
        "Vector3",
        vec![
            PortDecl::of("x", "Num"),
            PortDecl::of("y", "Num"),
            PortDecl::of("z", "Num"),
        ],
        vec![
            Decl::function(
                "sum",
                vec![PortDecl::of("v", "Vector3")],
                Some(Expr::ident("Num")),
                call(
                    "add",
                    vec![
                        call("add", vec![Expr::path("v.x"), Expr::path("v.y")]),
                        Expr::path("v.z"),
                    ],
                ),
            ),
            Decl::function(
                "scale",
                vec![PortDecl::of("v", "Vector3"), PortDecl::of("k", "Num")],
                Some(Expr::ident("Vector3")),
                call(
                    "Vector3",
                    ["v.x", "v.y", "v.z"]
                        .into_iter()
                        .map(|c| call("mul", vec![Expr::path(c), Expr::ident("k")]))
                        .collect(),
                ),
            ),
            Decl::function(
                "splat",
                vec![PortDecl::of("a", "Num")],
                Some(Expr::ident("Vector3")),
                call(
                    "Vector3",
                    vec![Expr::ident("a"), Expr::ident("a"), Expr::ident("a")],
                ),
            ),
        ],
    )
}

fn vec3(x: f32, y: f32, z: f32) -> Expr {
    call("Vector3", vec![Expr::num(x), Expr::num(y), Expr::num(z)])
}

#[test]
fn intrinsic_call_folds_to_constant() {
    let mut ctx = ctx_with(vec![]);
    let sum = ctx.evaluate(&call("add", vec![Expr::num(3.), Expr::num(8.)])).unwrap();

    assert_eq!(Some(Constant::num(11.)), constant(&ctx, &sum));
}

#[test]
fn too_few_arguments_partially_apply() {
    let mut ctx = ctx_with(vec![]);
    let add3 = ctx.evaluate(&call("add", vec![Expr::num(3.)])).unwrap();

    assert!(matches!(&add3, Value::Applied(a) if matches!(a.inner(), Value::Function(_))));
    assert_eq!(1, add3.input_ports().len());
    assert_eq!(Some("b".intern()), add3.input_ports()[0].id);

    let eight = num(&mut ctx, 8.);
    let sum = add3.call(&mut ctx, vec![eight]).unwrap();

    assert_eq!(Some(Constant::num(11.)), constant(&ctx, &sum));
}

#[test]
fn partial_application_is_associative() {
    // f(a, b, c) = a * 100 + b * 10 + c
    let f = Decl::function(
        "f",
        vec![
            PortDecl::of("a", "Num"),
            PortDecl::of("b", "Num"),
            PortDecl::of("c", "Num"),
        ],
        None,
        call(
            "add",
            vec![
                call("mul", vec![Expr::ident("a"), Expr::num(100.)]),
                call(
                    "add",
                    vec![
                        call("mul", vec![Expr::ident("b"), Expr::num(10.)]),
                        Expr::ident("c"),
                    ],
                ),
            ],
        ),
    );

    let mut ctx = ctx_with(vec![f]);
    let f = ctx.resolve_path("f").unwrap();
    let [a, b, c] = [1., 2., 3.].map(|n| num(&mut ctx, n));

    let groupings = vec![
        vec![vec![a.clone(), b.clone(), c.clone()]],
        vec![vec![a.clone()], vec![b.clone()], vec![c.clone()]],
        vec![vec![a.clone(), b.clone()], vec![c.clone()]],
        vec![vec![a], vec![b, c]],
    ];

    for grouping in groupings {
        let result = grouping.into_iter().fold(f.clone(), |callee, args| {
            callee.call(&mut ctx, args).unwrap()
        });

        assert_eq!(Some(Constant::num(123.)), constant(&ctx, &result));
    }
}

#[test]
fn applied_functions_are_never_nested() {
    let f = Decl::function(
        "f",
        vec![PortDecl::new("a"), PortDecl::new("b"), PortDecl::new("c")],
        None,
        Expr::ident("a"),
    );

    let mut ctx = ctx_with(vec![f]);
    let f = ctx.resolve_path("f").unwrap();
    let one = num(&mut ctx, 1.);

    let once = f.call(&mut ctx, vec![one.clone()]).unwrap();
    let twice = once.call(&mut ctx, vec![one]).unwrap();

    match &twice {
        Value::Applied(a) => {
            assert!(a.inner().is_identical(&f));
            assert_eq!(2, a.bound().len());
            assert_eq!(1, a.ports().len());
        }
        other => panic!("expected applied function, found {other:?}"),
    }

    assert!(twice.inner().is_identical(&f));
}

#[test]
fn calling_with_no_arguments_is_not_partial() {
    let mut ctx = ctx_with(vec![]);
    let add = ctx.resolve_path("add").unwrap();

    let errs = add.call(&mut ctx, vec![]).unwrap_err();
    assert_eq!(vec![MessageCode::ArgumentCountMismatch], errs.codes());

    let three = num(&mut ctx, 3.);
    let add3 = add.call(&mut ctx, vec![three]).unwrap();

    let errs = add3.call(&mut ctx, vec![]).unwrap_err();
    assert_eq!(vec![MessageCode::ArgumentCountMismatch], errs.codes());
}

#[test]
fn surplus_arguments_are_a_count_mismatch() {
    let mut ctx = ctx_with(vec![]);
    let errs = ctx
        .evaluate(&call("add", vec![Expr::num(1.), Expr::num(2.), Expr::num(3.)]))
        .unwrap_err();

    assert_eq!(vec![MessageCode::ArgumentCountMismatch], errs.codes());
}

#[test]
fn every_violated_port_is_reported() {
    let mut ctx = ctx_with(vec![]);
    let errs = ctx
        .evaluate(&call("add", vec![Expr::ident("True"), Expr::ident("False")]))
        .unwrap_err();

    assert_eq!(
        vec![
            MessageCode::ConstraintNotSatisfied,
            MessageCode::ConstraintNotSatisfied
        ],
        errs.codes()
    );
}

#[test]
fn variadic_port_accepts_any_number_of_arguments() {
    let mut ctx = ctx_with(vec![]);

    for n in [0, 1, 5] {
        let args = (0..n).map(|i| Expr::num(i as f32)).collect();
        let list = ctx.evaluate(&call("list", args)).unwrap();
        let count = list.index(&mut ctx, "count".intern()).unwrap();

        assert_eq!(Some(Constant::num(n as f32)), constant(&ctx, &count));
    }
}

#[test]
fn struct_construction_and_field_access() {
    let mut ctx = ctx_with(vec![vector3()]);
    let v = ctx.evaluate(&vec3(1., 2., 3.)).unwrap();

    let x = v.index(&mut ctx, "x".intern()).unwrap();
    assert_eq!(Some(Constant::num(1.)), constant(&ctx, &x));

    match &v {
        Value::Instance(i) => {
            assert_eq!("Vector3", i.ty().path());
            assert_eq!(3, i.values().len());
        }
        other => panic!("expected instance, found {other:?}"),
    }

    assert_eq!(
        vec!["x".intern(), "y".intern(), "z".intern()],
        v.members()
    );
}

#[test]
fn struct_construction_is_never_partial() {
    let mut ctx = ctx_with(vec![vector3()]);
    let errs = ctx
        .evaluate(&call("Vector3", vec![Expr::num(1.), Expr::num(2.)]))
        .unwrap_err();

    assert_eq!(vec![MessageCode::ArgumentCountMismatch], errs.codes());
}

#[test]
fn struct_fields_are_checked() {
    let mut ctx = ctx_with(vec![vector3()]);
    let errs = ctx
        .evaluate(&call(
            "Vector3",
            vec![Expr::num(1.), Expr::ident("True"), Expr::num(3.)],
        ))
        .unwrap_err();

    assert_eq!(vec![MessageCode::ConstraintNotSatisfied], errs.codes());
}

#[test]
fn instance_functions_receive_instance() {
    let mut ctx = ctx_with(vec![vector3()]);

    let sum = ctx
        .evaluate(&Expr::index(vec3(1., 2., 3.), "sum"))
        .unwrap();
    assert_eq!(Some(Constant::num(6.)), constant(&ctx, &sum));

    let scaled = ctx
        .evaluate(&Expr::call(
            Expr::index(vec3(1., 2., 3.), "scale"),
            vec![Expr::num(2.)],
        ))
        .unwrap();
    let z = scaled.index(&mut ctx, "z".intern()).unwrap();
    assert_eq!(Some(Constant::num(6.)), constant(&ctx, &z));
}

#[test]
fn scalar_instance_functions() {
    let mut ctx = ctx_with(vec![]);

    let sum = ctx
        .evaluate(&Expr::call(Expr::index(Expr::num(2.), "add"), vec![Expr::num(3.)]))
        .unwrap();
    assert_eq!(Some(Constant::num(5.)), constant(&ctx, &sum));

    let not = ctx.evaluate(&Expr::index(Expr::ident("True"), "not")).unwrap();
    assert_eq!(Some(Constant::bool(false)), constant(&ctx, &not));
}

#[test]
fn member_not_taking_instance_cannot_be_instance_function() {
    let mut ctx = ctx_with(vec![vector3()]);
    let errs = ctx
        .evaluate(&Expr::index(vec3(1., 2., 3.), "splat"))
        .unwrap_err();

    assert_eq!(
        vec![MessageCode::CannotBeUsedAsInstanceFunction],
        errs.codes()
    );

    // It remains accessible through the type.
    let splat = ctx
        .evaluate(&call("Vector3.splat", vec![Expr::num(4.)]))
        .unwrap();
    let y = splat.index(&mut ctx, "y".intern()).unwrap();
    assert_eq!(Some(Constant::num(4.)), constant(&ctx, &y));
}

#[test]
fn structs_are_nominal() {
    let a = Decl::structure("A", vec![PortDecl::of("x", "Num")], vec![]);
    let b = Decl::structure("B", vec![PortDecl::of("x", "Num")], vec![]);
    let get = Decl::function(
        "get",
        vec![PortDecl::of("a", "A")],
        None,
        Expr::path("a.x"),
    );

    let mut ctx = ctx_with(vec![a, b, get]);

    let ok = ctx
        .evaluate(&call("get", vec![call("A", vec![Expr::num(1.)])]))
        .unwrap();
    assert_eq!(Some(Constant::num(1.)), constant(&ctx, &ok));

    let errs = ctx
        .evaluate(&call("get", vec![call("B", vec![Expr::num(1.)])]))
        .unwrap_err();
    assert_eq!(vec![MessageCode::ConstraintNotSatisfied], errs.codes());
}

#[test]
fn return_constraint_is_checked() {
    let lie = Decl::function(
        "lie",
        vec![PortDecl::of("a", "Num")],
        Some(Expr::ident("Bool")),
        Expr::ident("a"),
    );

    let mut ctx = ctx_with(vec![lie]);
    let errs = ctx.evaluate(&call("lie", vec![Expr::num(1.)])).unwrap_err();

    assert_eq!(vec![MessageCode::ConstraintNotSatisfied], errs.codes());
}

#[test]
fn scalar_struct_converts() {
    let mut ctx = ctx_with(vec![]);

    let b = ctx.evaluate(&call("Bool", vec![Expr::num(2.)])).unwrap();
    assert_eq!(Some(Constant::bool(true)), constant(&ctx, &b));

    let n = ctx.evaluate(&call("Num", vec![Expr::ident("True")])).unwrap();
    assert_eq!(Some(Constant::num(1.)), constant(&ctx, &n));

    let errs = ctx
        .evaluate(&call("Num", vec![Expr::num(1.), Expr::num(2.)]))
        .unwrap_err();
    assert_eq!(vec![MessageCode::ArgumentCountMismatch], errs.codes());
}

#[test]
fn default_values() {
    let mut ctx = ctx_with(vec![vector3()]);

    let v = ctx.resolve_path("Vector3").unwrap();
    let default = v.default_value(&mut ctx).unwrap();
    let zero = num(&mut ctx, 0.);

    match &default {
        Value::Instance(i) => assert_eq!(&[zero.clone(), zero.clone(), zero], i.values()),
        other => panic!("expected instance, found {other:?}"),
    }

    let b = ctx.resolve_path("Bool").unwrap();
    let default = b.default_value(&mut ctx).unwrap();
    assert_eq!(Some(Constant::bool(false)), constant(&ctx, &default));

    let add = ctx.resolve_path("add").unwrap();
    let errs = add.default_value(&mut ctx).unwrap_err();
    assert_eq!(vec![MessageCode::TypeError], errs.codes());
}

#[test]
fn instance_types() {
    let mut ctx = ctx_with(vec![vector3()]);
    let ty = ctx.resolve_path("Vector3").unwrap();

    let v = ctx.evaluate(&vec3(1., 2., 3.)).unwrap();
    let vt = v.instance_type(&mut ctx).unwrap().unwrap();
    assert!(vt.is_identical(&ty));

    let one = num(&mut ctx, 1.);
    let nt = one.instance_type(&mut ctx).unwrap().unwrap();
    assert!(nt.is_identical(&ctx.resolve_path("Num").unwrap()));

    let add = ctx.resolve_path("add").unwrap();
    assert!(add.instance_type(&mut ctx).unwrap().is_none());

    // A type is its own return constraint.
    assert!(ty.return_constraint(&ctx).is_identical(&ty));
}

#[test]
fn instances_compare_structurally_but_not_identically() {
    let mut ctx = ctx_with(vec![vector3()]);

    let a = ctx.evaluate(&vec3(1., 2., 3.)).unwrap();
    let b = ctx.evaluate(&vec3(1., 2., 3.)).unwrap();
    let c = ctx.evaluate(&vec3(3., 2., 1.)).unwrap();

    assert_eq!(a, b);
    assert!(!a.is_identical(&b));
    assert_ne!(a, c);
}

#[test]
fn missing_capabilities_are_errors() {
    let mut ctx = ctx_with(vec![]);
    let one = num(&mut ctx, 1.);
    let add = ctx.resolve_path("add").unwrap();

    let errs = one.call(&mut ctx, vec![]).unwrap_err();
    assert_eq!(vec![MessageCode::NotFunction], errs.codes());

    let errs = add.index(&mut ctx, "x".intern()).unwrap_err();
    assert_eq!(vec![MessageCode::NotIndexable], errs.codes());

    let errs = one.matches_constraint(&mut ctx, &add).unwrap_err();
    assert_eq!(vec![MessageCode::NotConstraint], errs.codes());

    let errs = ctx.serialize(&add).unwrap_err();
    assert_eq!(vec![MessageCode::SerializationError], errs.codes());
}

#[test]
fn error_value_absorbs_everything() {
    let mut ctx = ctx_with(vec![]);
    let one = num(&mut ctx, 1.);
    let any_struct = ctx.resolve_path("Bool").unwrap();

    assert!(Value::Error.call(&mut ctx, vec![one.clone()]).unwrap().is_error());
    assert!(Value::Error.index(&mut ctx, "x".intern()).unwrap().is_error());
    assert!(Value::Error.matches_constraint(&mut ctx, &one).unwrap());
    assert!(any_struct.matches_constraint(&mut ctx, &Value::Error).unwrap());

    // Intrinsics never see error values.
    let add = ctx.resolve_path("add").unwrap();
    let sum = add.call(&mut ctx, vec![Value::Error, one]).unwrap();
    assert!(sum.is_error());
}

#[test]
fn serialize_then_deserialize_is_identity() {
    let mut ctx = ctx_with(vec![vector3()]);
    let v = ctx.evaluate(&vec3(1., 2., 3.)).unwrap();

    let instrs = ctx.serialize(&v).unwrap();
    assert_eq!(3, instrs.len());

    let round = ctx.deserialize(&v, &instrs).unwrap();
    assert_eq!(v, round);

    let inputs = (0..3)
        .map(|slot| ctx.graph.input(slot, ScalarType::Num))
        .collect::<Vec<_>>();
    let symbolic = ctx.deserialize(&v, &inputs).unwrap();

    assert_eq!(inputs, ctx.serialize(&symbolic).unwrap());
}

#[test]
fn deserialize_checks_shape_and_type() {
    let mut ctx = ctx_with(vec![vector3()]);
    let v = ctx.evaluate(&vec3(1., 2., 3.)).unwrap();
    let n = ctx.graph.num(0.);
    let b = ctx.graph.bool(true);

    for instrs in [vec![n, n], vec![n, n, n, n], vec![n, b, n]] {
        let errs = ctx.deserialize(&v, &instrs).unwrap_err();
        assert_eq!(vec![MessageCode::SerializationError], errs.codes());
    }
}

#[test]
fn structurally_identical_tuples_share_a_type() {
    let mut ctx = ctx_with(vec![]);

    let ab = ctx
        .evaluate(&Expr::block(vec![
            Decl::binding("b", Expr::num(2.)),
            Decl::binding("a", Expr::num(1.)),
        ]))
        .unwrap();
    let ba = ctx
        .evaluate(&Expr::block(vec![
            Decl::binding("a", Expr::num(5.)),
            Decl::binding("b", Expr::num(6.)),
        ]))
        .unwrap();
    let other = ctx
        .evaluate(&Expr::block(vec![
            Decl::binding("a", Expr::num(5.)),
            Decl::binding("b", Expr::ident("True")),
        ]))
        .unwrap();

    let ty = |v: &Value| match v {
        Value::TupleInstance(t) => t.ty().clone(),
        other => panic!("expected tuple instance, found {other:?}"),
    };

    assert!(Rc::ptr_eq(&ty(&ab), &ty(&ba)));
    assert!(!Rc::ptr_eq(&ty(&ab), &ty(&other)));
    assert_eq!(2, ctx.tuples().len());

    // Members are in identifier order regardless of declaration order.
    assert_eq!(vec!["a".intern(), "b".intern()], ab.members());

    let a = ab.index(&mut ctx, "a".intern()).unwrap();
    assert_eq!(Some(Constant::num(1.)), constant(&ctx, &a));

    let tuple = ab.instance_type(&mut ctx).unwrap().unwrap();
    assert!(tuple.matches_constraint(&mut ctx, &ba).unwrap());
    assert!(!tuple.matches_constraint(&mut ctx, &other).unwrap());

    let default = tuple.default_value(&mut ctx).unwrap();
    let b = default.index(&mut ctx, "b".intern()).unwrap();
    assert_eq!(Some(Constant::num(0.)), constant(&ctx, &b));
}

#[test]
fn tuple_members_may_refer_to_each_other() {
    let mut ctx = ctx_with(vec![]);

    let t = ctx
        .evaluate(&Expr::block(vec![
            Decl::binding("a", Expr::num(1.)),
            Decl::binding("b", call("add", vec![Expr::ident("a"), Expr::num(1.)])),
        ]))
        .unwrap();

    let b = t.index(&mut ctx, "b".intern()).unwrap();
    assert_eq!(Some(Constant::num(2.)), constant(&ctx, &b));
}

#[test]
fn function_constraints_match_signatures() {
    let unary = Decl::constraint(
        "Unary",
        vec![PortDecl::of("a", "Num")],
        Some(Expr::ident("Num")),
    );
    let apply = Decl::function(
        "apply",
        vec![PortDecl::of("f", "Unary"), PortDecl::of("x", "Num")],
        None,
        Expr::call(Expr::ident("f"), vec![Expr::ident("x")]),
    );

    let mut ctx = ctx_with(vec![unary, apply]);

    let abs = ctx
        .evaluate(&call("apply", vec![Expr::ident("abs"), Expr::num(-2.)]))
        .unwrap();
    assert_eq!(Some(Constant::num(2.)), constant(&ctx, &abs));

    // A partially applied function exposes its remaining ports.
    let add1 = ctx
        .evaluate(&call(
            "apply",
            vec![call("add", vec![Expr::num(1.)]), Expr::num(2.)],
        ))
        .unwrap();
    assert_eq!(Some(Constant::num(3.)), constant(&ctx, &add1));

    // Wrong arity.
    let errs = ctx
        .evaluate(&call("apply", vec![Expr::ident("lt"), Expr::num(1.)]))
        .unwrap_err();
    assert_eq!(vec![MessageCode::ConstraintNotSatisfied], errs.codes());

    // Right arity, wrong port constraint.
    let errs = ctx
        .evaluate(&call("apply", vec![Expr::ident("not"), Expr::num(1.)]))
        .unwrap_err();
    assert!(errs.has(MessageCode::ConstraintNotSatisfied));

    let errs = ctx
        .evaluate(&call("apply", vec![Expr::num(1.), Expr::num(1.)]))
        .unwrap_err();
    assert_eq!(vec![MessageCode::ConstraintNotSatisfied], errs.codes());
}

#[test]
fn any_matches_everything() {
    let mut ctx = ctx_with(vec![vector3()]);
    let any = ctx.any();

    for expr in [Expr::num(1.), Expr::ident("add"), Expr::ident("Vector3"), vec3(1., 2., 3.)] {
        let value = ctx.evaluate(&expr).unwrap();
        assert!(any.matches_constraint(&mut ctx, &value).unwrap(), "{expr}");
    }

    assert!(any.is_identical(&ctx.resolve_path("Any").unwrap()));
}

#[test]
fn lambdas_capture_their_scope() {
    // adder(n) = lambda(x) = add(x, n)
    let adder = Decl::function(
        "adder",
        vec![PortDecl::of("n", "Num")],
        None,
        Expr::lambda(
            vec![PortDecl::of("x", "Num")],
            call("add", vec![Expr::ident("x"), Expr::ident("n")]),
        ),
    );

    let mut ctx = ctx_with(vec![adder]);
    let result = ctx
        .evaluate(&Expr::call(call("adder", vec![Expr::num(10.)]), vec![Expr::num(5.)]))
        .unwrap();

    assert_eq!(Some(Constant::num(15.)), constant(&ctx, &result));
}

#[test]
fn scoped_function_yields_return_member() {
    let f = Decl::scoped_function(
        "f",
        vec![PortDecl::of("a", "Num")],
        None,
        vec![
            Decl::binding("t", call("mul", vec![Expr::ident("a"), Expr::num(2.)])),
            Decl::binding("return", call("add", vec![Expr::ident("t"), Expr::num(1.)])),
        ],
    );

    let mut ctx = ctx_with(vec![f]);
    let result = ctx.evaluate(&call("f", vec![Expr::num(4.)])).unwrap();

    assert_eq!(Some(Constant::num(9.)), constant(&ctx, &result));
}

#[test]
fn uncurry_composes() {
    let f = Decl::function(
        "f",
        vec![PortDecl::of("a", "Num"), PortDecl::of("b", "Num")],
        None,
        call("add", vec![Expr::ident("a"), Expr::ident("b")]),
    );
    let g = Decl::function(
        "g",
        vec![PortDecl::of("c", "Num"), PortDecl::of("d", "Num")],
        Some(Expr::ident("Num")),
        call("mul", vec![Expr::ident("c"), Expr::ident("d")]),
    );

    let mut ctx = ctx_with(vec![f, g]);
    let fg = ctx
        .evaluate(&call("uncurry", vec![Expr::ident("f"), Expr::ident("g")]))
        .unwrap();

    let ids = fg.input_ports().iter().map(|p| p.id).collect::<Vec<_>>();
    assert_eq!(vec![Some("a".intern()), Some("b".intern()), Some("d".intern())], ids);
    assert!(fg.return_constraint(&ctx).is_identical(&ctx.resolve_path("Num").unwrap()));

    let [one, two, three] = [1., 2., 3.].map(|n| num(&mut ctx, n));
    let result = fg.call(&mut ctx, vec![one.clone(), two.clone(), three.clone()]).unwrap();
    assert_eq!(Some(Constant::num(9.)), constant(&ctx, &result));

    // Uncurried functions may be partially applied too.
    let partial = fg.call(&mut ctx, vec![one]).unwrap();
    let result = partial.call(&mut ctx, vec![two, three]).unwrap();
    assert_eq!(Some(Constant::num(9.)), constant(&ctx, &result));
}

#[test]
fn uncurry_rejects_identifier_collision() {
    let f = Decl::function(
        "f",
        vec![PortDecl::new("a"), PortDecl::new("b")],
        None,
        Expr::ident("a"),
    );
    let g = Decl::function(
        "g",
        vec![PortDecl::new("b"), PortDecl::new("d")],
        None,
        Expr::ident("d"),
    );

    let mut ctx = ctx_with(vec![f, g]);
    let (f, g) = (ctx.resolve_path("f").unwrap(), ctx.resolve_path("g").unwrap());

    let errs = uncurry(&mut ctx, &f, &g).unwrap_err();
    assert_eq!(vec![MessageCode::FunctionCannotBeUncurried], errs.codes());
}

#[test]
fn uncurry_rejects_unusable_operands() {
    let mut ctx = ctx_with(vec![]);

    let one = num(&mut ctx, 1.);
    let abs = ctx.resolve_path("abs").unwrap();
    let list = ctx.resolve_path("list").unwrap();
    let bool_ = ctx.resolve_path("Bool").unwrap();

    for (a, b) in [
        (&one, &abs),
        (&abs, &one),
        // `Bool` has no fields to receive a result.
        (&abs, &bool_),
        (&list, &abs),
    ] {
        let errs = uncurry(&mut ctx, a, b).unwrap_err();
        assert_eq!(vec![MessageCode::FunctionCannotBeUncurried], errs.codes(), "{a} {b}");
    }

    assert!(uncurry(&mut ctx, &Value::Error, &abs).unwrap().is_error());
}

#[test]
fn namespaces_are_indexable() {
    let ns = Decl::namespace(
        "Geometry",
        vec![
            Decl::binding("two", Expr::num(2.)),
            Decl::function(
                "double",
                vec![PortDecl::of("a", "Num")],
                None,
                call("mul", vec![Expr::ident("a"), Expr::ident("two")]),
            ),
        ],
    );

    let mut ctx = ctx_with(vec![ns]);
    let ns = ctx.resolve_path("Geometry").unwrap();

    assert_eq!(vec!["two".intern(), "double".intern()], ns.members());

    let result = ctx
        .evaluate(&call("Geometry.double", vec![Expr::num(4.)]))
        .unwrap();
    assert_eq!(Some(Constant::num(8.)), constant(&ctx, &result));

    let errs = ns.index(&mut ctx, "three".intern()).unwrap_err();
    assert_eq!(vec![MessageCode::IdentifierNotFound], errs.codes());
}

#[test]
fn duplicate_ports_are_multiple_definitions() {
    let f = Decl::function(
        "f",
        vec![PortDecl::new("a"), PortDecl::new("a")],
        None,
        Expr::ident("a"),
    );

    let mut ctx = ctx_with(vec![f]);
    let errs = ctx.resolve_path("f").unwrap_err();

    assert_eq!(vec![MessageCode::MultipleDefinitions], errs.codes());
}

#[test]
fn discarded_ports_are_not_bound() {
    let f = Decl::function(
        "f",
        vec![PortDecl::discard(), PortDecl::new("b")],
        None,
        Expr::ident("b"),
    );

    let mut ctx = ctx_with(vec![f]);
    let b = ctx
        .evaluate(&call("f", vec![Expr::ident("add"), Expr::num(7.)]))
        .unwrap();

    assert_eq!(Some(Constant::num(7.)), constant(&ctx, &b));
    assert_eq!("_", ctx.resolve_path("f").unwrap().input_ports()[0].name());
}

#[test]
fn port_default_falls_back_to_constraint_default() {
    let f = Decl::function(
        "f",
        vec![
            PortDecl::of("a", "Num").with_default(Expr::num(5.)),
            PortDecl::of("b", "Bool"),
            PortDecl::new("c"),
        ],
        None,
        Expr::ident("a"),
    );

    let mut ctx = ctx_with(vec![f]);
    let f = ctx.resolve_path("f").unwrap();
    let ports = f.input_ports().to_vec();

    let a = ports[0].default_value(&mut ctx).unwrap();
    assert_eq!(Some(Constant::num(5.)), constant(&ctx, &a));

    let b = ports[1].default_value(&mut ctx).unwrap();
    assert_eq!(Some(Constant::bool(false)), constant(&ctx, &b));

    assert!(ports[2].default_value(&mut ctx).is_err());
}
