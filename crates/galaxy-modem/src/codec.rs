use galaxy_core::{GalaxyError, Value};
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::Zero;

const TAG_NIL: &str = "00";
const TAG_PAIR: &str = "11";
const TAG_POSITIVE: &str = "01";
const TAG_NEGATIVE: &str = "10";

/// Encode one integer.
///
/// Sign tag, then `k` ones and a zero, then the magnitude in exactly `4k`
/// bits where `k` is the number of nibbles the magnitude needs. Zero has no
/// unary prefix at all: `010`.
pub fn encode_number(n: &BigInt) -> String {
    let mut out = String::new();
    push_number(&mut out, n);
    out
}

fn push_number(out: &mut String, n: &BigInt) {
    if n.is_zero() {
        out.push_str("010");
        return;
    }
    out.push_str(if n.sign() == Sign::Minus {
        TAG_NEGATIVE
    } else {
        TAG_POSITIVE
    });
    let magnitude = n.magnitude();
    let nibbles = magnitude.bits().div_ceil(4) as usize;
    out.extend(std::iter::repeat('1').take(nibbles));
    out.push('0');
    let digits = magnitude.to_str_radix(2);
    out.extend(std::iter::repeat('0').take(nibbles * 4 - digits.len()));
    out.push_str(&digits);
}

/// Encode a value tree; pairs are `11` followed by head then tail.
pub fn encode_value(value: &Value) -> String {
    let mut out = String::new();
    let mut stack = vec![value];
    while let Some(next) = stack.pop() {
        match next {
            Value::Int(n) => push_number(&mut out, n),
            Value::Nil => out.push_str(TAG_NIL),
            Value::Pair(head, tail) => {
                out.push_str(TAG_PAIR);
                stack.push(tail);
                stack.push(head);
            }
        }
    }
    out
}

struct BitReader<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> BitReader<'a> {
    fn bit(&mut self) -> Result<bool, GalaxyError> {
        match self.src.as_bytes().get(self.pos) {
            Some(b'0') => {
                self.pos += 1;
                Ok(false)
            }
            Some(b'1') => {
                self.pos += 1;
                Ok(true)
            }
            Some(_) => Err(self.bad_character()),
            None => Err(GalaxyError::decode(format!(
                "input ends after {} bits",
                self.pos
            ))),
        }
    }

    fn bad_character(&self) -> GalaxyError {
        let ch = self.src[self.pos..].chars().next().unwrap_or('?');
        GalaxyError::decode(format!("unexpected character {ch:?} at bit {}", self.pos))
    }

    fn tag(&mut self) -> Result<(bool, bool), GalaxyError> {
        Ok((self.bit()?, self.bit()?))
    }

    fn magnitude(&mut self) -> Result<BigUint, GalaxyError> {
        let mut nibbles = 0usize;
        while self.bit()? {
            nibbles += 1;
        }
        let width = nibbles * 4;
        let start = self.pos;
        let field = self.src.as_bytes().get(start..start + width).ok_or_else(|| {
            GalaxyError::decode(format!(
                "number field needs {width} bits at bit {start}, only {} left",
                self.src.len() - start
            ))
        })?;
        if width == 0 {
            return Ok(BigUint::zero());
        }
        if let Some(offset) = field.iter().position(|b| !matches!(b, b'0' | b'1')) {
            self.pos = start + offset;
            return Err(self.bad_character());
        }
        let magnitude = BigUint::parse_bytes(field, 2).ok_or_else(|| {
            GalaxyError::decode(format!("malformed number field at bit {start}"))
        })?;
        self.pos += width;
        Ok(magnitude)
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }
}

/// Decode one value from the front of `bits`, returning the unread rest.
pub fn decode_value(bits: &str) -> Result<(Value, &str), GalaxyError> {
    enum Pending {
        Head,
        Tail(Value),
    }

    let mut reader = BitReader { src: bits, pos: 0 };
    let mut stack = Vec::new();
    loop {
        let mut value = match reader.tag()? {
            (false, false) => Value::Nil,
            (true, true) => {
                stack.push(Pending::Head);
                continue;
            }
            (false, true) => Value::Int(BigInt::from_biguint(Sign::Plus, reader.magnitude()?)),
            (true, false) => Value::Int(BigInt::from_biguint(Sign::Minus, reader.magnitude()?)),
        };
        loop {
            match stack.pop() {
                None => return Ok((value, reader.rest())),
                Some(Pending::Head) => {
                    stack.push(Pending::Tail(value));
                    break;
                }
                Some(Pending::Tail(head)) => value = Value::pair(head, value),
            }
        }
    }
}

pub fn modulate(value: &Value) -> String {
    encode_value(value)
}

/// Decode a complete message; trailing bits are an error.
pub fn demodulate(bits: &str) -> Result<Value, GalaxyError> {
    let (value, rest) = decode_value(bits.trim())?;
    if !rest.is_empty() {
        return Err(GalaxyError::decode(format!(
            "{} trailing bits after value",
            rest.len()
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: i64) -> String {
        encode_number(&BigInt::from(n))
    }

    #[test]
    fn worked_number_vectors() {
        assert_eq!(num(0), "010");
        assert_eq!(num(1), "01100001");
        assert_eq!(num(-1), "10100001");
        assert_eq!(num(2), "01100010");
        assert_eq!(num(15), "01101111");
        assert_eq!(num(16), "0111000010000");
        assert_eq!(num(-16), "1011000010000");
        assert_eq!(num(255), "0111011111111");
        assert_eq!(num(256), "011110000100000000");
    }

    #[test]
    fn worked_value_vectors() {
        assert_eq!(encode_value(&Value::Nil), "00");
        assert_eq!(
            encode_value(&Value::pair(Value::Nil, Value::Nil)),
            "110000"
        );
        assert_eq!(
            encode_value(&Value::pair(Value::from(0), Value::Nil)),
            "1101000"
        );
        assert_eq!(
            encode_value(&Value::pair(Value::from(1), Value::from(2))),
            "110110000101100010"
        );
        assert_eq!(
            encode_value(&Value::list([Value::from(1), Value::from(2)])),
            "1101100001110110001000"
        );
    }

    #[test]
    fn decode_returns_remainder() {
        let (v, rest) = decode_value("01011101").unwrap();
        assert_eq!(v, Value::from(0));
        assert_eq!(rest, "11101");

        let (v, rest) = decode_value("1101100001110110001000").unwrap();
        assert_eq!(v, Value::list([Value::from(1), Value::from(2)]));
        assert!(rest.is_empty());
    }

    #[test]
    fn negative_zero_decodes_to_zero() {
        assert_eq!(demodulate("100").unwrap(), Value::from(0));
    }

    #[test]
    fn demodulate_rejects_trailing_bits() {
        assert!(matches!(
            demodulate("0100"),
            Err(GalaxyError::Decode(m)) if m.contains("1 trailing")
        ));
    }

    #[test]
    fn demodulate_trims_whitespace() {
        assert_eq!(demodulate("010\n").unwrap(), Value::from(0));
    }

    #[test]
    fn truncated_input() {
        for bits in ["", "0", "11", "1101", "0110000", "01111"] {
            assert!(
                matches!(decode_value(bits), Err(GalaxyError::Decode(_))),
                "{bits:?} should not decode"
            );
        }
    }

    #[test]
    fn bad_characters() {
        let err = decode_value("01a00001").unwrap_err();
        assert!(err.to_string().contains("'a'"), "{err}");
        assert!(decode_value("0110002").is_err());
        assert!(decode_value("011000x1").is_err());
        for bits in ["0110+001", "01100_01"] {
            let err = demodulate(bits).unwrap_err();
            assert!(matches!(err, GalaxyError::Decode(_)), "{bits}: {err}");
        }
    }

    #[test]
    fn long_lists_round_trip() {
        let list = Value::list((0..5_000).map(Value::from));
        let bits = modulate(&list);
        assert_eq!(demodulate(&bits).unwrap(), list);
    }
}
