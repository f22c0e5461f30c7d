use galaxy_core::{GalaxyError, Op, Term, TermArena, TermId, Value};

use crate::codec::{demodulate, modulate};

/// Read a term built from `cons`, `nil` and integers as a value.
pub fn term_to_value(arena: &TermArena, term: TermId) -> Result<Value, GalaxyError> {
    enum Pending {
        Head(TermId),
        Tail(Value),
    }

    let mut stack = Vec::new();
    let mut cur = term;
    loop {
        let mut value = match arena.term(cur) {
            Term::Int(n) => Value::Int(n.clone()),
            Term::Op(Op::Nil) => Value::Nil,
            _ => match arena.pair_parts(cur) {
                Some((head, tail)) => {
                    stack.push(Pending::Head(tail));
                    cur = head;
                    continue;
                }
                None => {
                    return Err(GalaxyError::decode(format!(
                        "{} is not an integer, nil or cons pair",
                        arena.describe(cur)
                    )))
                }
            },
        };
        loop {
            match stack.pop() {
                None => return Ok(value),
                Some(Pending::Head(tail)) => {
                    stack.push(Pending::Tail(value));
                    cur = tail;
                    break;
                }
                Some(Pending::Tail(head)) => value = Value::pair(head, value),
            }
        }
    }
}

/// Build the `cons`/`nil`/integer term for a value.
pub fn value_to_term(arena: &mut TermArena, value: &Value) -> TermId {
    enum Pending<'v> {
        Head(&'v Value),
        Tail(TermId),
    }

    let mut stack = Vec::new();
    let mut cur = value;
    loop {
        let mut term = match cur {
            Value::Int(n) => arena.int(n.clone()),
            Value::Nil => arena.op(Op::Nil),
            Value::Pair(head, tail) => {
                stack.push(Pending::Head(tail));
                cur = head;
                continue;
            }
        };
        loop {
            match stack.pop() {
                None => return term,
                Some(Pending::Head(tail)) => {
                    stack.push(Pending::Tail(term));
                    cur = tail;
                    break;
                }
                Some(Pending::Tail(head)) => term = arena.vector(head, term),
            }
        }
    }
}

pub fn modulate_term(arena: &TermArena, term: TermId) -> Result<String, GalaxyError> {
    Ok(modulate(&term_to_value(arena, term)?))
}

pub fn demodulate_term(arena: &mut TermArena, bits: &str) -> Result<TermId, GalaxyError> {
    let value = demodulate(bits)?;
    Ok(value_to_term(arena, &value))
}
