use galaxy_core::TermArena;
use galaxy_reader::{read_program, read_term};
use proptest::prelude::*;

proptest! {
    #[test]
    fn reader_never_panics(input in "\\PC*") {
        // Any arbitrary string should produce Ok or Err, never panic
        let mut arena = TermArena::new();
        let _ = read_term(&mut arena, &input);
    }

    #[test]
    fn program_reader_never_panics(input in "\\PC*") {
        let mut arena = TermArena::new();
        let _ = read_program(&mut arena, &input);
    }
}

fn galaxy_atom() -> impl Strategy<Value = String> {
    prop_oneof![
        // Integers, including ones past i64
        (-1000i64..1000).prop_map(|n| n.to_string()),
        "[1-9][0-9]{19,30}",
        // Primitive operators
        prop::sample::select(vec![
            "s", "c", "b", "t", "f", "i", "neg", "add", "mul", "div", "lt", "eq", "cons",
            "car", "cdr", "nil", "isnil",
        ])
        .prop_map(str::to_string),
        // Names
        "[0-9]{1,4}".prop_map(|s| format!(":{s}")),
        "[a-z]{2,6}[0-9]{1,3}",
        // Placeholders
        (0u32..16).prop_map(|n| format!("x{n}")),
    ]
}

fn galaxy_term(depth: u32) -> impl Strategy<Value = String> {
    if depth == 0 {
        galaxy_atom().boxed()
    } else {
        prop_oneof![
            galaxy_atom(),
            (galaxy_term(depth - 1), galaxy_term(depth - 1))
                .prop_map(|(f, x)| format!("ap {f} {x}")),
        ]
        .boxed()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn valid_terms_parse_and_print_back(src in galaxy_term(5)) {
        let mut arena = TermArena::new();
        let term = read_term(&mut arena, &src).unwrap_or_else(|e| {
            panic!("Failed to parse generated term: {src:?}\nError: {e}")
        });
        prop_assert_eq!(arena.display(term), src);
    }

    #[test]
    fn generated_programs_parse(lines in prop::collection::vec(galaxy_term(3), 1..6)) {
        let src: String = lines
            .iter()
            .enumerate()
            .map(|(i, body)| format!(":{i} = {body}\n"))
            .collect();
        let mut arena = TermArena::new();
        let defs = read_program(&mut arena, &src).unwrap_or_else(|e| {
            panic!("Failed to parse: {src:?}\nError: {e}")
        });
        prop_assert_eq!(defs.len(), lines.len());
    }
}
