use galaxy_core::{GalaxyError, Op, Term, TermArena, TermId};
use num_bigint::BigInt;
use num_traits::Zero;

use crate::store::TermStore;

/// Fire the rule of `op` applied to `args` (in application order).
///
/// Positions listed by [`Op::strict_args`] must already hold evaluated
/// terms; everything else is passed through untouched.
pub fn reduce(store: &mut TermStore, op: Op, args: &[TermId]) -> Result<TermId, GalaxyError> {
    match (op, args) {
        (Op::I, &[x]) => Ok(x),
        (Op::Neg, &[x]) => {
            let n = integer(store.arena(), op, x)?.clone();
            Ok(store.arena_mut().int(-n))
        }
        (Op::Nil, &[_]) => Ok(store.op(Op::T)),
        (Op::IsNil, &[x]) => {
            let t = store.op(Op::T);
            let f = store.op(Op::F);
            let tf = store.app(t, f);
            let ttf = store.app(t, tf);
            Ok(store.app(x, ttf))
        }
        (Op::Car, &[x]) => {
            let t = store.op(Op::T);
            Ok(store.app(x, t))
        }
        (Op::Cdr, &[x]) => {
            let f = store.op(Op::F);
            Ok(store.app(x, f))
        }
        (Op::T, &[y, _]) => Ok(y),
        (Op::F, &[_, x]) => Ok(x),
        (Op::Add | Op::Mul | Op::Div | Op::Lt | Op::Eq, &[y, x]) => arithmetic(store, op, y, x),
        (Op::Cons, &[y, x]) => Ok(pair(store, y, x)),
        (Op::Cons, &[x, y, z]) => {
            let zx = store.app(z, x);
            Ok(store.app(zx, y))
        }
        (Op::S, &[x, y, z]) => {
            let xz = store.app(x, z);
            let yz = store.app(y, z);
            Ok(store.app(xz, yz))
        }
        (Op::C, &[x, y, z]) => {
            let xz = store.app(x, z);
            Ok(store.app(xz, y))
        }
        (Op::B, &[x, y, z]) => {
            let yz = store.app(y, z);
            Ok(store.app(x, yz))
        }
        _ => Err(GalaxyError::malformed(format!(
            "{op} does not reduce with {} argument(s)",
            args.len()
        ))),
    }
}

fn arithmetic(
    store: &mut TermStore,
    op: Op,
    first: TermId,
    second: TermId,
) -> Result<TermId, GalaxyError> {
    let a = integer(store.arena(), op, first)?;
    let b = integer(store.arena(), op, second)?;
    let result = match op {
        Op::Add => a + b,
        Op::Mul => a * b,
        Op::Div => {
            if b.is_zero() {
                return Err(GalaxyError::type_error(op.name(), "a nonzero divisor", "0"));
            }
            // truncates toward zero
            a / b
        }
        Op::Lt => return Ok(boolean(store, a < b)),
        Op::Eq => return Ok(boolean(store, a == b)),
        _ => {
            return Err(GalaxyError::malformed(format!(
                "{op} is not an arithmetic operator"
            )))
        }
    };
    Ok(store.arena_mut().int(result))
}

/// Build `ap ap cons head tail` from forced components and mark it as its
/// own normal form.
fn pair(store: &mut TermStore, head: TermId, tail: TermId) -> TermId {
    let cons = store.op(Op::Cons);
    let partial = store.app(cons, head);
    let pair = store.app(partial, tail);
    if store.arena().evaluated(pair).is_none() {
        store.arena_mut().set_evaluated(pair, pair);
    }
    pair
}

fn boolean(store: &mut TermStore, b: bool) -> TermId {
    store.op(if b { Op::T } else { Op::F })
}

fn integer(arena: &TermArena, op: Op, id: TermId) -> Result<BigInt, GalaxyError> {
    match arena.term(id) {
        Term::Int(n) => Ok(n.clone()),
        Term::Placeholder(n) => Err(GalaxyError::malformed(format!(
            "placeholder x{n} reached {op} during evaluation"
        ))),
        other => Err(GalaxyError::type_error(
            op.name(),
            "integer",
            format!("{} {}", other.kind(), arena.describe(id)),
        )),
    }
}
