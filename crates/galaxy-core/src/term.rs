use std::cell::Cell;
use std::fmt;

use hashbrown::{HashMap, HashSet};
use lasso::{Rodeo, Spur};
use num_bigint::BigInt;

use crate::error::GalaxyError;
use crate::op::Op;

/// Stable index of a node in a [`TermArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId(u32);

impl TermId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// The id of the node stored at `index`.
    ///
    /// # Panics
    ///
    /// Panics once the arena outgrows `u32` indices.
    fn from_index(index: usize) -> Self {
        match u32::try_from(index) {
            Ok(raw) => TermId(raw),
            Err(_) => panic!("term arena exhausted at {index} nodes"),
        }
    }
}

impl fmt::Display for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    App(TermId, TermId),
    Int(BigInt),
    Op(Op),
    Placeholder(u32),
    Name(Spur),
}

impl Term {
    pub fn is_leaf(&self) -> bool {
        !matches!(self, Term::App(..))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Term::App(..) => "application",
            Term::Int(_) => "integer",
            Term::Op(_) => "operator",
            Term::Placeholder(_) => "placeholder",
            Term::Name(_) => "name",
        }
    }
}

#[derive(Debug)]
struct Slot {
    term: Term,
    evaluated: Option<TermId>,
    dirty: bool,
    parents: Vec<TermId>,
    size: Cell<Option<u64>>,
}

/// Owner of every term node.
///
/// Children of an application are fixed once the node is built. The only
/// mutable per-node state is the write-once `evaluated` slot and the dirty
/// flag, which [`TermArena::invalidate`] resets explicitly. Leaves are
/// interned, so two leaf ids are equal exactly when their values are.
#[derive(Debug, Default)]
pub struct TermArena {
    slots: Vec<Slot>,
    leaves: HashMap<Term, TermId>,
    names: Rodeo,
}

impl TermArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes ever allocated.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn push(&mut self, term: Term) -> TermId {
        let id = TermId::from_index(self.slots.len());
        let dirty = !term.is_leaf();
        self.slots.push(Slot {
            term,
            evaluated: None,
            dirty,
            parents: Vec::new(),
            size: Cell::new(None),
        });
        id
    }

    fn leaf(&mut self, term: Term) -> TermId {
        if let Some(&id) = self.leaves.get(&term) {
            return id;
        }
        let id = self.push(term.clone());
        self.leaves.insert(term, id);
        id
    }

    // --- construction ---

    /// Allocate a fresh application node. No sharing is attempted here; the
    /// evaluator's store layers hash-consing on top.
    ///
    /// # Panics
    ///
    /// Panics once the arena outgrows `u32` indices.
    pub fn app(&mut self, f: TermId, x: TermId) -> TermId {
        let id = self.push(Term::App(f, x));
        self.slots[f.index()].parents.push(id);
        if x != f {
            self.slots[x.index()].parents.push(id);
        }
        id
    }

    pub fn int(&mut self, n: impl Into<BigInt>) -> TermId {
        self.leaf(Term::Int(n.into()))
    }

    pub fn op(&mut self, op: Op) -> TermId {
        self.leaf(Term::Op(op))
    }

    pub fn placeholder(&mut self, n: u32) -> TermId {
        self.leaf(Term::Placeholder(n))
    }

    pub fn name(&mut self, name: &str) -> TermId {
        let spur = self.names.get_or_intern(name);
        self.leaf(Term::Name(spur))
    }

    /// Build `ap ap cons head tail`.
    pub fn vector(&mut self, head: TermId, tail: TermId) -> TermId {
        let cons = self.op(Op::Cons);
        let partial = self.app(cons, head);
        self.app(partial, tail)
    }

    /// Build a `cons` chain ending in `nil`.
    pub fn list(&mut self, items: &[TermId]) -> TermId {
        let mut acc = self.op(Op::Nil);
        for &item in items.iter().rev() {
            acc = self.vector(item, acc);
        }
        acc
    }

    // --- queries ---

    pub fn term(&self, id: TermId) -> &Term {
        &self.slots[id.index()].term
    }

    pub fn children(&self, id: TermId) -> Option<(TermId, TermId)> {
        match self.term(id) {
            Term::App(f, x) => Some((*f, *x)),
            _ => None,
        }
    }

    pub fn is_app(&self, id: TermId) -> bool {
        matches!(self.term(id), Term::App(..))
    }

    pub fn as_int(&self, id: TermId) -> Option<&BigInt> {
        match self.term(id) {
            Term::Int(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_op(&self, id: TermId) -> Option<Op> {
        match self.term(id) {
            Term::Op(op) => Some(*op),
            _ => None,
        }
    }

    pub fn is_op(&self, id: TermId, op: Op) -> bool {
        self.as_op(id) == Some(op)
    }

    pub fn resolve(&self, spur: Spur) -> &str {
        self.names.resolve(&spur)
    }

    pub fn name_of(&self, id: TermId) -> Option<&str> {
        match self.term(id) {
            Term::Name(spur) => Some(self.resolve(*spur)),
            _ => None,
        }
    }

    pub fn parents(&self, id: TermId) -> &[TermId] {
        &self.slots[id.index()].parents
    }

    /// `(head, tail)` if `id` is literally `ap ap cons head tail`.
    pub fn pair_parts(&self, id: TermId) -> Option<(TermId, TermId)> {
        let (partial, tail) = self.children(id)?;
        let (cons, head) = self.children(partial)?;
        self.is_op(cons, Op::Cons).then_some((head, tail))
    }

    pub fn as_vector(&self, id: TermId) -> Result<(TermId, TermId), GalaxyError> {
        self.pair_parts(id).ok_or_else(|| {
            GalaxyError::decode(format!("expected a vector, found {}", self.describe(id)))
        })
    }

    /// Read a `cons` chain ending in `nil` as a sequence.
    pub fn as_list(&self, id: TermId) -> Result<Vec<TermId>, GalaxyError> {
        let mut items = Vec::new();
        let mut cur = id;
        loop {
            if self.is_op(cur, Op::Nil) {
                return Ok(items);
            }
            match self.pair_parts(cur) {
                Some((head, tail)) => {
                    items.push(head);
                    cur = tail;
                }
                None => {
                    return Err(GalaxyError::decode(format!(
                        "expected a nil-terminated list, found {}",
                        self.describe(cur)
                    )))
                }
            }
        }
    }

    /// Structural node count; shared subterms count once per occurrence.
    pub fn size(&self, id: TermId) -> u64 {
        if let Some(n) = self.slots[id.index()].size.get() {
            return n;
        }
        let known = |t: TermId| self.slots[t.index()].size.get().unwrap_or(1);
        let mut stack = vec![(id, false)];
        while let Some((next, expanded)) = stack.pop() {
            let slot = &self.slots[next.index()];
            if slot.size.get().is_some() {
                continue;
            }
            match slot.term {
                Term::App(f, x) if expanded => {
                    let n = 1u64.saturating_add(known(f)).saturating_add(known(x));
                    slot.size.set(Some(n));
                }
                Term::App(f, x) => {
                    stack.push((next, true));
                    stack.push((x, false));
                    stack.push((f, false));
                }
                _ => slot.size.set(Some(1)),
            }
        }
        known(id)
    }

    /// Compare two terms by shape and leaf values rather than by identity.
    pub fn structurally_equal(&self, a: TermId, b: TermId) -> bool {
        let mut stack = vec![(a, b)];
        while let Some((l, r)) = stack.pop() {
            if l == r {
                continue;
            }
            match (self.term(l), self.term(r)) {
                (Term::App(lf, lx), Term::App(rf, rx)) => {
                    stack.push((*lx, *rx));
                    stack.push((*lf, *rf));
                }
                // Leaves are interned: distinct ids mean distinct values.
                _ => return false,
            }
        }
        true
    }

    // --- memo slot and invalidation ---

    pub fn evaluated(&self, id: TermId) -> Option<TermId> {
        self.slots[id.index()].evaluated
    }

    /// Record the normal form of an application.
    ///
    /// # Panics
    ///
    /// Panics if the slot is already set or `id` is not an application.
    pub fn set_evaluated(&mut self, id: TermId, result: TermId) {
        let slot = &mut self.slots[id.index()];
        assert!(
            !slot.term.is_leaf(),
            "{id} is a {} and carries no evaluated slot",
            slot.term.kind()
        );
        assert!(
            slot.evaluated.is_none(),
            "evaluated slot of {id} set twice"
        );
        slot.evaluated = Some(result);
        slot.dirty = false;
    }

    pub fn is_dirty(&self, id: TermId) -> bool {
        self.slots[id.index()].dirty
    }

    /// Clear the memo of every application above `id` and mark it dirty.
    /// Returns the number of applications touched.
    pub fn invalidate(&mut self, id: TermId) -> usize {
        let mut seen = HashSet::new();
        let mut work = vec![id];
        let mut touched = 0;
        while let Some(next) = work.pop() {
            if !seen.insert(next) {
                continue;
            }
            let slot = &mut self.slots[next.index()];
            if !slot.term.is_leaf() {
                slot.evaluated = None;
                slot.dirty = true;
                touched += 1;
            }
            work.extend(slot.parents.iter().copied());
        }
        touched
    }

    // --- printing ---

    fn leaf_token(&self, term: &Term) -> String {
        match term {
            Term::App(..) => "ap".to_string(),
            Term::Int(n) => n.to_string(),
            Term::Op(op) => op.name().to_string(),
            Term::Placeholder(n) => format!("x{n}"),
            Term::Name(spur) => self.resolve(*spur).to_string(),
        }
    }

    /// Prefix `ap` notation, the same syntax the reader accepts.
    pub fn display(&self, id: TermId) -> String {
        self.display_limited(id, usize::MAX)
    }

    /// Like [`display`](Self::display) but stops after `max_tokens` tokens.
    pub fn display_limited(&self, id: TermId, max_tokens: usize) -> String {
        let mut out = String::new();
        let mut stack = vec![id];
        let mut emitted = 0;
        while let Some(next) = stack.pop() {
            if emitted == max_tokens {
                out.push_str(" …");
                return out;
            }
            if !out.is_empty() {
                out.push(' ');
            }
            match self.term(next) {
                Term::App(f, x) => {
                    out.push_str("ap");
                    stack.push(*x);
                    stack.push(*f);
                }
                leaf => out.push_str(&self.leaf_token(leaf)),
            }
            emitted += 1;
        }
        out
    }

    /// Short rendering for error messages.
    pub fn describe(&self, id: TermId) -> String {
        self.display_limited(id, 16)
    }

    /// Human-oriented rendering: `nil`-terminated lists print as
    /// `(a, b, c)`, other pairs as `<a, b>`.
    pub fn sugar(&self, id: TermId) -> String {
        enum Piece {
            Term(TermId),
            Text(&'static str),
        }

        let mut out = String::new();
        let mut stack = vec![Piece::Term(id)];
        while let Some(piece) = stack.pop() {
            let next = match piece {
                Piece::Text(s) => {
                    out.push_str(s);
                    continue;
                }
                Piece::Term(next) => next,
            };
            if let Some(items) = self.as_list(next).ok().filter(|items| !items.is_empty()) {
                stack.push(Piece::Text(")"));
                for (i, item) in items.iter().enumerate().rev() {
                    stack.push(Piece::Term(*item));
                    if i > 0 {
                        stack.push(Piece::Text(", "));
                    }
                }
                stack.push(Piece::Text("("));
            } else if let Some((head, tail)) = self.pair_parts(next) {
                stack.push(Piece::Text(">"));
                stack.push(Piece::Term(tail));
                stack.push(Piece::Text(", "));
                stack.push(Piece::Term(head));
                stack.push(Piece::Text("<"));
            } else if let Term::App(f, x) = self.term(next) {
                stack.push(Piece::Term(*x));
                stack.push(Piece::Text(" "));
                stack.push(Piece::Term(*f));
                stack.push(Piece::Text("ap "));
            } else {
                out.push_str(&self.leaf_token(self.term(next)));
            }
        }
        out
    }
}
