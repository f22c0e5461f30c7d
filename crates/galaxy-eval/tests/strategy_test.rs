mod common;

use galaxy_core::{GalaxyError, Value};
use std::collections::HashSet;

// ============================================================
// Arithmetic
// ============================================================

dual_strategy_tests! {
    add_small: "ap ap add 1 2" => "3",
    add_negative: "ap ap add -3 -7" => "-10",
    mul_signs: "ap ap mul 3 -2" => "-6",
    div_positive: "ap ap div 4 3" => "1",
    div_negative_dividend: "ap ap div -5 3" => "-1",
    div_negative_divisor: "ap ap div 5 -3" => "-1",
    div_both_negative: "ap ap div -5 -3" => "1",
    lt_true: "ap ap lt 0 1" => "t",
    lt_equal: "ap ap lt 1 1" => "f",
    eq_true: "ap ap eq 2 2" => "t",
    eq_false: "ap ap eq 2 3" => "f",
    neg_nested: "ap neg ap ap add 1 2" => "-3",
    big_integers: "ap ap mul 4294967296 4294967296" => "18446744073709551616",
}

// ============================================================
// Combinators
// ============================================================

dual_strategy_tests! {
    s_combinator: "ap ap ap s add inc 1" => "3",
    c_combinator: "ap ap ap c add 1 2" => "3",
    b_combinator: "ap ap ap b inc dec 7" => "7",
    t_selects_first: "ap ap t 1 5" => "1",
    f_selects_second: "ap ap f 1 5" => "5",
    i_identity: "ap i 5" => "5",
    t_is_lazy: "ap ap t 1 ap neg nil" => "1",
    inc_from_prelude: "ap inc 41" => "42",
    dec_from_prelude: "ap dec 0" => "-1",
}

// ============================================================
// Lists
// ============================================================

dual_strategy_tests! {
    cons_selector: "ap ap ap cons 1 2 add" => "3",
    car_of_pair: "ap car ap ap cons 1 2" => "1",
    cdr_of_pair: "ap cdr ap ap cons 1 nil" => "nil",
    nil_ignores_argument: "ap nil 5" => "t",
    isnil_of_nil: "ap isnil nil" => "t",
    isnil_of_pair: "ap isnil ap ap cons 1 2" => "f",
    pair_components_reduce: "ap ap cons ap ap add 1 2 nil" => "ap ap cons 3 nil",
    vec_is_cons: "ap car ap ap vec 4 8" => "4",
}

#[test]
fn pwr2_by_recursion() {
    for (n, expected) in [(0, "1"), (1, "2"), (2, "4"), (3, "8"), (8, "256")] {
        assert_eq!(common::eval_reduce(&format!("ap pwr2 {n}")), expected);
    }
}

#[test]
fn checkerboard_draws_even_cells() {
    let value = common::eval_value("ap ap checkerboard 7 0");
    let points = value.as_points().expect("a list of points");
    assert_eq!(points.len(), 25);
    let distinct: HashSet<_> = points.iter().copied().collect();
    assert_eq!(distinct.len(), 25);
    for (x, y) in points {
        assert!((0..7).contains(&x) && (0..7).contains(&y), "({x}, {y})");
        assert_eq!((x + y) % 2, 0, "({x}, {y})");
    }
}

#[test]
fn force_value_reads_nested_lists() {
    let value = common::eval_value("ap ap cons ap inc 0 ap ap cons ap ap vec 4 8 nil");
    assert_eq!(
        value,
        Value::list([Value::int(1), Value::from((4, 8))])
    );
    assert_eq!(value.to_string(), "(1, <4, 8>)");
}

#[test]
fn arithmetic_on_non_integers_is_fatal() {
    for src in ["ap ap add 1 nil", "ap neg t", "ap ap mul ap ap cons 1 2 3"] {
        let err = common::eval_reduce_err(src);
        assert!(matches!(err, GalaxyError::Type { .. }), "{src}: {err}");
        assert!(err.is_fatal());
    }
}

#[test]
fn division_by_zero_is_fatal() {
    let err = common::eval_reduce_err("ap ap div 1 0");
    assert!(err.to_string().contains("nonzero"), "{err}");
}

#[test]
fn placeholders_cannot_be_forced() {
    let err = common::eval_reduce_err("ap inc x0");
    assert!(matches!(err, GalaxyError::Malformed(_)), "{err}");
}

#[test]
fn unreduced_placeholders_stay_put() {
    assert_eq!(common::eval_reduce("ap ap t x0 x1"), "x0");
    assert_eq!(common::eval_rewrite("ap ap ap s x0 x1 x2"), "ap ap x0 x2 ap x1 x2");
}
