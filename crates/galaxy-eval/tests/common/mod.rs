#![allow(dead_code)]

use galaxy_core::{GalaxyError, Value};
use galaxy_eval::{Evaluator, RuleSet, SearchBudget, Simplifier, Status};

/// A fresh evaluator with the prelude loaded.
pub fn evaluator() -> Evaluator {
    Evaluator::with_prelude(1 << 16).unwrap_or_else(|e| panic!("prelude failed to load: {e}"))
}

/// Evaluate by graph reduction and print the result in prefix form.
pub fn eval_reduce(input: &str) -> String {
    let mut ev = evaluator();
    let result = ev
        .eval_str(input)
        .unwrap_or_else(|e| panic!("reduction failed for `{input}`: {e}"));
    ev.arena().display(result)
}

/// Simplify by rewrite search with the standard rules and the prelude
/// definitions, requiring a normal form.
pub fn eval_rewrite(input: &str) -> String {
    let mut ev = evaluator();
    let mut rules = RuleSet::standard(ev.arena_mut()).unwrap();
    rules.add_definitions(&ev).unwrap();
    let term = ev.read(input).unwrap();
    let out = Simplifier::new(&rules, SearchBudget::default())
        .simplify(ev.store_mut(), term)
        .unwrap_or_else(|e| panic!("rewrite failed for `{input}`: {e}"));
    assert_eq!(out.status, Status::Normal, "rewrite gave up on `{input}`");
    ev.arena().display(out.term)
}

/// Evaluate and force the result into a value.
pub fn eval_value(input: &str) -> Value {
    let mut ev = evaluator();
    let term = ev.read(input).unwrap();
    ev.force_value(term)
        .unwrap_or_else(|e| panic!("forcing failed for `{input}`: {e}"))
}

/// Evaluate by graph reduction, expecting an error.
pub fn eval_reduce_err(input: &str) -> GalaxyError {
    let mut ev = evaluator();
    match ev.eval_str(input) {
        Ok(t) => panic!("expected error for `{input}`, got {}", ev.arena().display(t)),
        Err(e) => e,
    }
}

/// Generate tests checking both strategies against the same printed result.
///
/// ```ignore
/// dual_strategy_tests! {
///     name: "ap ap add 1 2" => "3",
/// }
/// ```
///
/// This generates `name_reduce` and `name_rewrite`.
#[macro_export]
macro_rules! dual_strategy_tests {
    ($($name:ident : $input:expr => $expected:expr),* $(,)?) => {
        $(
            paste::paste! {
                #[test]
                fn [<$name _reduce>]() {
                    assert_eq!(common::eval_reduce($input), $expected, "reduce: {}", $input);
                }

                #[test]
                fn [<$name _rewrite>]() {
                    assert_eq!(common::eval_rewrite($input), $expected, "rewrite: {}", $input);
                }
            }
        )*
    };
}
