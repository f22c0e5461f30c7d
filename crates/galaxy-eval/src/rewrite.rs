use std::cmp::Reverse;
use std::collections::BinaryHeap;

use galaxy_core::{GalaxyError, Op, Term, TermArena, TermId};
use galaxy_reader::read_program;
use hashbrown::HashSet;
use tracing::{debug, warn};

use crate::eval::Evaluator;
use crate::matcher::{instantiate, match_term, placeholders};
use crate::operators;
use crate::store::TermStore;

/// Combinator equations, written as pattern lines.
pub const STANDARD_RULES: &str = r#"
ap i x0 = x0
ap ap t x0 x1 = x0
ap ap f x0 x1 = x1
ap ap ap s x0 x1 x2 = ap ap x0 x2 ap x1 x2
ap ap ap c x0 x1 x2 = ap ap x0 x2 x1
ap ap ap b x0 x1 x2 = ap x0 ap x1 x2
ap ap ap cons x0 x1 x2 = ap ap x2 x0 x1
ap car ap ap cons x0 x1 = x0
ap cdr ap ap cons x0 x1 = x1
ap car x0 = ap x0 t
ap cdr x0 = ap x0 f
ap nil x0 = t
ap isnil nil = t
ap isnil ap ap cons x0 x1 = f
"#;

/// Positions visited per candidate before successor generation stops.
const MAX_POSITIONS: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub pattern: TermId,
    pub replacement: TermId,
}

/// An ordered list of rewrite rules, optionally with native folding of
/// integer arithmetic.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
    fold_natives: bool,
}

impl RuleSet {
    /// No rules and no folding.
    pub fn new() -> Self {
        Self::default()
    }

    /// The combinator equations plus native arithmetic.
    pub fn standard(arena: &mut TermArena) -> Result<Self, GalaxyError> {
        let mut rules = RuleSet {
            rules: Vec::new(),
            fold_natives: true,
        };
        rules.load(arena, STANDARD_RULES)?;
        Ok(rules)
    }

    pub fn with_native_folding(mut self, on: bool) -> Self {
        self.fold_natives = on;
        self
    }

    pub fn folds_natives(&self) -> bool {
        self.fold_natives
    }

    /// Append a rule.
    ///
    /// The pattern cannot be a bare placeholder, and every placeholder in
    /// the replacement must occur in the pattern.
    pub fn push(
        &mut self,
        arena: &TermArena,
        pattern: TermId,
        replacement: TermId,
    ) -> Result<(), GalaxyError> {
        if let Term::Placeholder(n) = arena.term(pattern) {
            return Err(GalaxyError::malformed(format!(
                "pattern x{n} would match every term"
            )));
        }
        let bound = placeholders(arena, pattern);
        if let Some(free) = placeholders(arena, replacement)
            .into_iter()
            .find(|n| !bound.contains(n))
        {
            return Err(GalaxyError::malformed(format!(
                "placeholder x{free} in {} does not occur in {}",
                arena.describe(replacement),
                arena.describe(pattern)
            )));
        }
        self.rules.push(Rule {
            pattern,
            replacement,
        });
        Ok(())
    }

    /// Read `<pattern> = <replacement>` lines and append each.
    pub fn load(&mut self, arena: &mut TermArena, src: &str) -> Result<usize, GalaxyError> {
        let defs = read_program(arena, src)?;
        for def in &defs {
            self.push(arena, def.lhs, def.rhs)
                .map_err(|e| e.with_note(format!("in rule at line {}", def.span.line)))?;
        }
        Ok(defs.len())
    }

    /// Turn each of the evaluator's definitions into a `name = body` rule.
    pub fn add_definitions(&mut self, evaluator: &Evaluator) -> Result<usize, GalaxyError> {
        let mut defs: Vec<_> = evaluator.definitions().collect();
        defs.sort();
        for (name, body) in &defs {
            self.push(evaluator.arena(), *name, *body)?;
        }
        Ok(defs.len())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBudget {
    /// Candidates expanded before giving up.
    pub max_steps: usize,
    /// Candidates held in the frontier; further successors are dropped.
    pub max_queue: usize,
    /// Successors generated per candidate.
    pub max_successors: usize,
}

impl Default for SearchBudget {
    fn default() -> Self {
        SearchBudget {
            max_steps: 10_000,
            max_queue: 50_000,
            max_successors: 64,
        }
    }
}

/// When the search may stop early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Goal {
    /// Only a candidate without successors ends the search.
    NormalForm,
    /// Also stop at the first candidate built from integers, `nil` and
    /// `cons` pairs.
    Data,
}

impl Goal {
    fn reached(self, arena: &TermArena, term: TermId) -> bool {
        match self {
            Goal::NormalForm => false,
            Goal::Data => is_data(arena, term),
        }
    }
}

fn is_data(arena: &TermArena, term: TermId) -> bool {
    let mut work = vec![term];
    while let Some(next) = work.pop() {
        if arena.as_int(next).is_some() || arena.is_op(next, Op::Nil) {
            continue;
        }
        match arena.pair_parts(next) {
            Some((head, tail)) => {
                work.push(tail);
                work.push(head);
            }
            None => return false,
        }
    }
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// A candidate with no successors.
    Normal,
    /// The goal predicate held.
    Goal,
    /// Budget spent or frontier drained; the smallest candidate seen.
    GaveUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Simplified {
    pub term: TermId,
    pub status: Status,
    pub steps: usize,
}

impl Simplified {
    pub fn gave_up(&self) -> bool {
        self.status == Status::GaveUp
    }

    /// The term, or `BudgetExceeded` if the search gave up.
    pub fn into_result(self) -> Result<TermId, GalaxyError> {
        match self.status {
            Status::GaveUp => Err(GalaxyError::BudgetExceeded { steps: self.steps }),
            _ => Ok(self.term),
        }
    }
}

/// Where a position sits under its parent, carrying the sibling.
#[derive(Debug, Clone, Copy)]
enum Side {
    Fun { arg: TermId },
    Arg { fun: TermId },
}

#[derive(Debug, Clone, Copy)]
struct Position {
    node: TermId,
    parent: Option<(usize, Side)>,
}

/// Best-first search over one-step rewrites, smallest term first.
pub struct Simplifier<'r> {
    rules: &'r RuleSet,
    budget: SearchBudget,
}

impl<'r> Simplifier<'r> {
    pub fn new(rules: &'r RuleSet, budget: SearchBudget) -> Self {
        Simplifier { rules, budget }
    }

    pub fn simplify(&self, store: &mut TermStore, term: TermId) -> Result<Simplified, GalaxyError> {
        self.simplify_until(store, term, Goal::NormalForm)
    }

    pub fn simplify_until(
        &self,
        store: &mut TermStore,
        term: TermId,
        goal: Goal,
    ) -> Result<Simplified, GalaxyError> {
        let mut queue = BinaryHeap::new();
        let mut seen = HashSet::new();
        let mut seq = 0u64;
        let mut best = (store.arena().size(term), term);
        queue.push(Reverse((best.0, seq, term)));
        seen.insert(term);

        let mut steps = 0;
        while let Some(Reverse((_, _, candidate))) = queue.pop() {
            if goal.reached(store.arena(), candidate) {
                debug!(steps, "rewrite goal reached");
                return Ok(Simplified {
                    term: candidate,
                    status: Status::Goal,
                    steps,
                });
            }
            if steps >= self.budget.max_steps {
                break;
            }
            steps += 1;

            let next = self.successors(store, candidate)?;
            if next.is_empty() {
                debug!(steps, "rewrite reached a normal form");
                return Ok(Simplified {
                    term: candidate,
                    status: Status::Normal,
                    steps,
                });
            }
            for succ in next {
                if !seen.insert(succ) {
                    continue;
                }
                let size = store.arena().size(succ);
                if size < best.0 {
                    best = (size, succ);
                }
                if queue.len() < self.budget.max_queue {
                    seq += 1;
                    queue.push(Reverse((size, seq, succ)));
                }
            }
        }

        warn!(
            steps,
            best = %store.arena().describe(best.1),
            "rewrite search gave up"
        );
        Ok(Simplified {
            term: best.1,
            status: Status::GaveUp,
            steps,
        })
    }

    /// Every term one rewrite away from `term`, outermost then leftmost
    /// position first, rules in order at each position.
    pub fn successors(
        &self,
        store: &mut TermStore,
        term: TermId,
    ) -> Result<Vec<TermId>, GalaxyError> {
        let mut out = Vec::new();
        let mut positions: Vec<Position> = Vec::new();
        let mut work = vec![Position {
            node: term,
            parent: None,
        }];

        while let Some(pos) = work.pop() {
            if positions.len() >= MAX_POSITIONS {
                break;
            }
            let index = positions.len();
            positions.push(pos);

            for rewritten in self.rewrites_at(store, pos.node)? {
                out.push(rebuild(store, &positions, index, rewritten));
                if out.len() >= self.budget.max_successors {
                    return Ok(out);
                }
            }

            if let Some((f, x)) = store.arena().children(pos.node) {
                work.push(Position {
                    node: x,
                    parent: Some((index, Side::Arg { fun: f })),
                });
                work.push(Position {
                    node: f,
                    parent: Some((index, Side::Fun { arg: x })),
                });
            }
        }
        Ok(out)
    }

    fn rewrites_at(&self, store: &mut TermStore, node: TermId) -> Result<Vec<TermId>, GalaxyError> {
        let mut found = Vec::new();
        for rule in &self.rules.rules {
            if let Some(bindings) = match_term(store.arena(), node, rule.pattern) {
                let rewritten = instantiate(store, rule.replacement, &bindings)?;
                if rewritten != node {
                    found.push(rewritten);
                }
            }
        }
        if self.rules.fold_natives {
            if let Some(folded) = fold(store, node) {
                found.push(folded);
            }
        }
        Ok(found)
    }
}

/// Replace the node at `positions[index]` and rebuild its ancestors.
fn rebuild(store: &mut TermStore, positions: &[Position], index: usize, node: TermId) -> TermId {
    let mut built = node;
    let mut at = index;
    while let Some((parent, side)) = positions[at].parent {
        built = match side {
            Side::Fun { arg } => store.app(built, arg),
            Side::Arg { fun } => store.app(fun, built),
        };
        at = parent;
    }
    built
}

/// Evaluate `neg add mul div lt eq` when their operands are integer
/// leaves. `eq` of one term with itself is `t` whatever the term.
fn fold(store: &mut TermStore, node: TermId) -> Option<TermId> {
    let arena = store.arena();
    let mut args = Vec::with_capacity(2);
    let mut head = node;
    while let Some((f, x)) = arena.children(head) {
        if args.len() == 2 {
            return None;
        }
        args.push(x);
        head = f;
    }
    args.reverse();

    let op = arena.as_op(head)?;
    match (op, args.len()) {
        (Op::Neg, 1) | (Op::Add | Op::Mul | Op::Div | Op::Lt, 2) => {}
        (Op::Eq, 2) if arena.structurally_equal(args[0], args[1]) => {
            return Some(store.op(Op::T));
        }
        (Op::Eq, 2) => {}
        _ => return None,
    }
    if !args.iter().all(|a| arena.as_int(*a).is_some()) {
        return None;
    }
    // division by zero stays unreduced
    operators::reduce(store, op, &args).ok()
}
