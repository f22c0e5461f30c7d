use galaxy_core::{TermArena, Value};
use galaxy_modem::{
    decode_value, demodulate, encode_number, encode_value, modulate_term, term_to_value,
    value_to_term,
};
use galaxy_reader::read_term;
use num_bigint::{BigInt, Sign};
use proptest::prelude::*;

fn big_int() -> impl Strategy<Value = BigInt> {
    prop_oneof![
        any::<i64>().prop_map(BigInt::from),
        (-64i64..64).prop_map(BigInt::from),
        (any::<bool>(), prop::collection::vec(any::<u8>(), 0..40)).prop_map(|(neg, bytes)| {
            let sign = if neg { Sign::Minus } else { Sign::Plus };
            BigInt::from_bytes_be(sign, &bytes)
        }),
    ]
}

fn value_tree() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Nil),
        (-300i64..300).prop_map(Value::from),
        big_int().prop_map(Value::Int),
    ];
    leaf.prop_recursive(6, 64, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(h, t)| Value::pair(h, t)),
            prop::collection::vec(inner, 0..6).prop_map(Value::list),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn numbers_round_trip(n in big_int()) {
        let bits = encode_number(&n);
        let (decoded, rest) = decode_value(&bits).unwrap();
        prop_assert_eq!(decoded, Value::Int(n));
        prop_assert!(rest.is_empty());
    }

    #[test]
    fn number_field_is_whole_nibbles(n in big_int()) {
        let bits = encode_number(&n);
        let ones = bits[2..].chars().take_while(|c| *c == '1').count();
        prop_assert_eq!(bits.len(), 2 + ones + 1 + 4 * ones);
    }

    #[test]
    fn values_round_trip(v in value_tree()) {
        let bits = encode_value(&v);
        let (decoded, rest) = decode_value(&bits).unwrap();
        prop_assert_eq!(decoded, v);
        prop_assert!(rest.is_empty());
    }

    #[test]
    fn decode_leaves_the_suffix(v in value_tree(), suffix in "[01]{0,24}") {
        let bits = format!("{}{suffix}", encode_value(&v));
        let (decoded, rest) = decode_value(&bits).unwrap();
        prop_assert_eq!(decoded, v);
        prop_assert_eq!(rest, suffix.as_str());
    }

    #[test]
    fn lifting_is_bijective(v in value_tree()) {
        let mut arena = TermArena::new();
        let term = value_to_term(&mut arena, &v);
        prop_assert_eq!(term_to_value(&arena, term).unwrap(), v);
    }

    #[test]
    fn demodulate_never_panics(bits in "[01]{0,64}") {
        let _ = demodulate(&bits);
    }
}

#[test]
fn modulate_parsed_term() {
    let mut arena = TermArena::new();
    let term = read_term(&mut arena, "ap ap cons 1 ap ap cons 2 nil").unwrap();
    assert_eq!(
        modulate_term(&arena, term).unwrap(),
        "1101100001110110001000"
    );
    let vec = read_term(&mut arena, "ap ap vec 0 nil").unwrap();
    assert_eq!(modulate_term(&arena, vec).unwrap(), "1101000");
}

#[test]
fn large_magnitudes_need_many_nibbles() {
    let n: BigInt = "-340282366920938463463374607431768211456".parse().unwrap();
    let bits = encode_number(&n);
    assert!(bits.starts_with("10"));
    assert_eq!(demodulate(&bits).unwrap(), Value::Int(n));
}
