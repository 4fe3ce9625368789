// Native compilation tests
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
use crate::ir::{BinaryOp, UnaryOp};

use NativeType::{Bool, F32};

fn run(
    graph: &mut InstrGraph,
    params: Vec<NativeType>,
    root: InstrIx,
    args: &[Scalar],
) -> Scalar {
    let results = compile(graph, params, &[root], true).run(args);

    assert_eq!(1, results.len());
    results[0]
}

/// Build a loop directly,
///   bypassing resolution.
fn build_loop(
    graph: &mut InstrGraph,
    scope: u16,
    init: &[InstrIx],
    cond: impl FnOnce(&mut InstrGraph, &[InstrIx]) -> InstrIx,
    body: impl FnOnce(&mut InstrGraph, &[InstrIx]) -> Vec<InstrIx>,
) -> InstrIx {
    let states = init
        .iter()
        .enumerate()
        .map(|(i, init)| graph.state(i as u16, scope, *init))
        .collect::<Vec<_>>();

    let condition = cond(graph, &states);
    let body = body(graph, &states);

    graph.add(Instruction::Loop {
        states: states.into(),
        condition,
        body: body.into(),
    })
}

#[test]
fn adds_inputs() {
    let mut graph = InstrGraph::new();
    let a = graph.input(0, ScalarType::Num);
    let b = graph.input(1, ScalarType::Num);
    let sum = graph.binary(BinaryOp::Add, a, b);

    assert_eq!(
        Scalar::F32(11.),
        run(&mut graph, vec![F32, F32], sum, &[Scalar::F32(3.), Scalar::F32(8.)]),
    );
}

#[test]
fn constant_result_needs_no_statements() {
    let mut graph = InstrGraph::new();
    let c = graph.num(42.);
    let program = compile(&mut graph, vec![], &[c], true);

    assert!(program.body().is_empty());
    assert_eq!(vec![Scalar::F32(42.)], program.run(&[]));
}

#[test]
fn converts_operands_to_table_widths() {
    let mut graph = InstrGraph::new();
    let x = graph.input(0, ScalarType::Num);
    let sin = graph.unary(UnaryOp::Sin, x);

    let program = compile(&mut graph, vec![F32], &[sin], false);

    // sin is computed in f64 and narrowed to the canonical f32.
    assert_eq!(
        &[NativeExpr::Convert(
            F32,
            Box::new(NativeExpr::Unary(
                UnaryOp::Sin,
                Box::new(NativeExpr::Convert(
                    NativeType::F64,
                    Box::new(NativeExpr::Param(0))
                )),
            )),
        )],
        program.results(),
    );

    match program.run(&[Scalar::F32(0.5)])[..] {
        [Scalar::F32(y)] => assert!((y - 0.5f32.sin()).abs() < 1e-6),
        ref other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn host_params_of_other_widths_are_converted() {
    let mut graph = InstrGraph::new();
    let x = graph.input(0, ScalarType::Num);
    let y = graph.num(2.);
    let product = graph.binary(BinaryOp::Mul, x, y);

    assert_eq!(
        Scalar::F32(5.),
        run(&mut graph, vec![NativeType::F64], product, &[Scalar::F64(2.5)]),
    );
}

#[test]
fn cast_between_num_and_bool() {
    let mut graph = InstrGraph::new();
    let x = graph.input(0, ScalarType::Num);
    let b = graph.cast(ScalarType::Bool, x);

    assert_eq!(
        Scalar::Bool(true),
        run(&mut graph, vec![F32], b, &[Scalar::F32(0.1)])
    );

    let mut graph = InstrGraph::new();
    let x = graph.input(0, ScalarType::Num);
    let b = graph.cast(ScalarType::Bool, x);

    assert_eq!(
        Scalar::Bool(false),
        run(&mut graph, vec![F32], b, &[Scalar::F32(-0.1)])
    );
}

#[test]
fn two_way_switch_is_conditional() {
    let mut graph = InstrGraph::new();
    let sel = graph.input(0, ScalarType::Bool);
    let a = graph.num(10.);
    let b = graph.num(20.);
    let switch = graph.switch(sel, vec![a, b]);

    let program = compile(&mut graph, vec![Bool], &[switch], false);

    assert!(matches!(program.results(), [NativeExpr::Cond(..)]));
    assert_eq!(vec![Scalar::F32(20.)], program.run(&[Scalar::Bool(true)]));
    assert_eq!(vec![Scalar::F32(10.)], program.run(&[Scalar::Bool(false)]));
}

#[test]
fn multi_way_switch_truncates_and_clamps() {
    let mut graph = InstrGraph::new();
    let sel = graph.input(0, ScalarType::Num);
    let ops = vec![graph.num(1.), graph.num(2.), graph.num(3.)];
    let switch = graph.switch(sel, ops);

    let program = compile(&mut graph, vec![F32], &[switch], true);
    let at = |x: f32| program.run(&[Scalar::F32(x)]);

    assert_eq!(vec![Scalar::F32(2.)], at(1.7));
    assert_eq!(vec![Scalar::F32(1.)], at(-3.));
    assert_eq!(vec![Scalar::F32(3.)], at(10.));
    assert_eq!(vec![Scalar::F32(1.)], at(f32::NAN));
}

#[test]
fn cached_instruction_is_computed_once() {
    let mut graph = InstrGraph::new();
    let x = graph.input(0, ScalarType::Num);
    let y = graph.input(1, ScalarType::Num);
    let shared = graph.binary(BinaryOp::Add, x, y);
    let root = graph.binary(BinaryOp::Sub, shared, shared);
    let root = graph.binary(BinaryOp::Max, root, shared);

    let program = compile(&mut graph, vec![F32, F32], &[root], true);

    let assigned = program
        .body()
        .iter()
        .filter(|stmt| matches!(stmt, NativeStmt::Assign(..)))
        .count();

    // `shared`,
    //   `shared - shared`,
    //   and the root.
    assert_eq!(3, assigned);
    assert_eq!(
        vec![Scalar::F32(5.)],
        program.run(&[Scalar::F32(2.), Scalar::F32(3.)])
    );
}

// Fibonacci over (i, a, b) -> (i + 1, b, a + b).
// Were `a` assigned before `a + b` was computed,
//   the sequence would double instead.
#[test]
fn loop_state_is_updated_atomically() {
    for cse in [true, false] {
        let mut graph = InstrGraph::new();
        let init = [graph.num(0.), graph.num(0.), graph.num(1.)];

        let group = build_loop(
            &mut graph,
            0,
            &init,
            |g, s| {
                let ten = g.num(10.);
                g.binary(BinaryOp::Lt, s[0], ten)
            },
            |g, s| {
                let one = g.num(1.);
                vec![
                    g.binary(BinaryOp::Add, s[0], one),
                    s[2],
                    g.binary(BinaryOp::Add, s[1], s[2]),
                ]
            },
        );

        let fib = graph.group_element(group, 1);
        let program = compile(&mut graph, vec![], &[fib], cse);

        assert_eq!(vec![Scalar::F32(55.)], program.run(&[]), "cse: {cse}");
    }
}

#[test]
fn loop_with_false_condition_yields_initial_state() {
    let mut graph = InstrGraph::new();
    let x = graph.input(0, ScalarType::Num);

    let group = build_loop(
        &mut graph,
        0,
        &[x],
        |g, s| {
            let zero = g.num(0.);
            g.binary(BinaryOp::Lt, s[0], zero)
        },
        |g, s| {
            let one = g.num(1.);
            vec![g.binary(BinaryOp::Add, s[0], one)]
        },
    );

    let result = graph.group_element(group, 0);

    assert_eq!(
        Scalar::F32(4.),
        run(&mut graph, vec![F32], result, &[Scalar::F32(4.)])
    );
    assert_eq!(
        Scalar::F32(0.),
        run(&mut graph, vec![F32], result, &[Scalar::F32(-3.)])
    );
}

// Sum of i over 0..3 where each term is counted by an inner loop that
//   depends on the state of the outer.
#[test]
fn nested_loops_resolve_states_by_scope() {
    let mut graph = InstrGraph::new();
    let zero = graph.num(0.);

    let outer = build_loop(
        &mut graph,
        0,
        &[zero, zero],
        |g, s| {
            let three = g.num(3.);
            g.binary(BinaryOp::Lt, s[0], three)
        },
        |g, s| {
            let i = s[0];
            let zero = g.num(0.);

            let inner = build_loop(
                g,
                1,
                &[zero, zero],
                |g, t| g.binary(BinaryOp::Lt, t[0], i),
                |g, t| {
                    let one = g.num(1.);
                    vec![
                        g.binary(BinaryOp::Add, t[0], one),
                        g.binary(BinaryOp::Add, t[1], one),
                    ]
                },
            );

            let count = g.group_element(inner, 1);
            let one = g.num(1.);

            vec![
                g.binary(BinaryOp::Add, i, one),
                g.binary(BinaryOp::Add, s[1], count),
            ]
        },
    );

    let total = graph.group_element(outer, 1);
    let program = compile(&mut graph, vec![], &[total], true);

    assert_eq!(vec![Scalar::F32(3.)], program.run(&[]));
}

#[test]
fn multiple_elements_of_one_loop_share_it() {
    let mut graph = InstrGraph::new();
    let init = [graph.num(0.), graph.num(100.)];

    let group = build_loop(
        &mut graph,
        0,
        &init,
        |g, s| {
            let five = g.num(5.);
            g.binary(BinaryOp::Lt, s[0], five)
        },
        |g, s| {
            let one = g.num(1.);
            vec![
                g.binary(BinaryOp::Add, s[0], one),
                g.binary(BinaryOp::Sub, s[1], one),
            ]
        },
    );

    let a = graph.group_element(group, 0);
    let b = graph.group_element(group, 1);
    let program = compile(&mut graph, vec![], &[a, b], true);

    let loops = program
        .body()
        .iter()
        .filter(|stmt| matches!(stmt, NativeStmt::Loop(_)))
        .count();

    assert_eq!(1, loops);
    assert_eq!(vec![Scalar::F32(5.), Scalar::F32(95.)], program.run(&[]));
}

#[test]
#[should_panic]
fn state_outside_of_loop_is_internal_error() {
    let mut graph = InstrGraph::new();
    let init = graph.num(1.);
    let state = graph.state(0, 0, init);

    compile(&mut graph, vec![], &[state], true);
}

#[test]
#[should_panic]
fn run_with_wrong_argument_count_is_internal_error() {
    let mut graph = InstrGraph::new();
    let x = graph.input(0, ScalarType::Num);

    compile(&mut graph, vec![F32], &[x], true).run(&[]);
}
