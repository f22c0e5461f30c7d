use galaxy_core::{GalaxyError, Op, Term, TermArena, TermId, Value};
use galaxy_reader::{read_program, read_term};
use hashbrown::{HashMap, HashSet};
use tracing::debug;

use crate::operators;
use crate::prelude::PRELUDE;
use crate::store::{TermStore, DEFAULT_CACHE_CAPACITY};

pub type EvalResult = Result<TermId, GalaxyError>;

/// What a frame is waiting for.
enum Stage {
    Step,
    /// `expr = ap f x`, waiting for `f`.
    Head1 { x: TermId },
    /// `f` evaluated to `ap g y`, waiting for `g`.
    Head2 { x: TermId, y: TermId },
    /// `g` evaluated to `ap h z`, waiting for `h`.
    Head3 { x: TermId, y: TermId, z: TermId },
    /// Forcing the strict arguments of `op`, `next` indexes its strict list.
    Force {
        op: Op,
        args: Vec<TermId>,
        next: usize,
    },
}

/// One evaluation in progress: the node whose memo slot gets the result,
/// and the term it has been stepped to so far.
struct Frame {
    root: TermId,
    expr: TermId,
    stage: Stage,
}

impl Frame {
    fn new(root: TermId) -> Self {
        Frame {
            root,
            expr: root,
            stage: Stage::Step,
        }
    }
}

enum Action {
    /// Evaluate this term, then resume the current frame in this stage.
    Need(TermId, Stage),
    /// The current term steps to this one; a step to itself is a normal form.
    Next(TermId),
}

/// Graph-reduction evaluator over a hash-consed term store.
#[derive(Debug)]
pub struct Evaluator {
    store: TermStore,
    definitions: HashMap<TermId, TermId>,
    steps: u64,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(cache_capacity: usize) -> Self {
        Evaluator {
            store: TermStore::new(cache_capacity),
            definitions: HashMap::new(),
            steps: 0,
        }
    }

    /// An evaluator with `inc`, `dec`, `pwr2` and `checkerboard` defined.
    pub fn with_prelude(cache_capacity: usize) -> Result<Self, GalaxyError> {
        let mut evaluator = Self::with_capacity(cache_capacity);
        evaluator.load_program(PRELUDE)?;
        Ok(evaluator)
    }

    pub fn store(&self) -> &TermStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut TermStore {
        &mut self.store
    }

    pub fn arena(&self) -> &TermArena {
        self.store.arena()
    }

    pub fn arena_mut(&mut self) -> &mut TermArena {
        self.store.arena_mut()
    }

    /// Reduction steps taken since construction.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    // --- definitions ---

    /// Bind `name` to `body`.
    ///
    /// Every memoized application that mentions `name`, directly or through
    /// another definition, is invalidated.
    pub fn define(&mut self, name: TermId, body: TermId) -> Result<(), GalaxyError> {
        match self.arena().term(name) {
            Term::Name(_) => {}
            Term::Op(op) => {
                return Err(GalaxyError::malformed(format!(
                    "cannot redefine primitive operator {op}"
                )))
            }
            _ => {
                return Err(GalaxyError::malformed(format!(
                    "definition target must be a name, got {}",
                    self.arena().describe(name)
                )))
            }
        }
        self.definitions.insert(name, body);

        let mut changed = vec![name];
        let mut affected: HashSet<TermId> = HashSet::new();
        affected.insert(name);
        let mut touched = 0;
        while let Some(next) = changed.pop() {
            touched += self.store.arena_mut().invalidate(next);
            for (&other, &other_body) in &self.definitions {
                if !affected.contains(&other) && mentions(self.store.arena(), other_body, next) {
                    affected.insert(other);
                    changed.push(other);
                }
            }
        }
        if touched > 0 {
            debug!(
                name = self.arena().name_of(name).unwrap_or_default(),
                touched, "invalidated memoized terms"
            );
        }
        Ok(())
    }

    pub fn definition(&self, name: TermId) -> Option<TermId> {
        self.definitions.get(&name).copied()
    }

    /// Every `(name, body)` pair, in no particular order.
    pub fn definitions(&self) -> impl Iterator<Item = (TermId, TermId)> + '_ {
        self.definitions.iter().map(|(name, body)| (*name, *body))
    }

    pub fn lookup(&mut self, name: &str) -> Option<TermId> {
        let id = self.arena_mut().name(name);
        self.definition(id)
    }

    /// Read `name = body` lines and define each. Returns how many.
    pub fn load_program(&mut self, src: &str) -> Result<usize, GalaxyError> {
        let defs = read_program(self.store.arena_mut(), src)?;
        for def in &defs {
            self.define(def.lhs, def.rhs)
                .map_err(|e| e.with_note(format!("in definition at line {}", def.span.line)))?;
        }
        debug!(count = defs.len(), "loaded definitions");
        Ok(defs.len())
    }

    pub fn read(&mut self, src: &str) -> EvalResult {
        read_term(self.store.arena_mut(), src)
    }

    pub fn eval_str(&mut self, src: &str) -> EvalResult {
        let term = self.read(src)?;
        self.evaluate(term)
    }

    // --- reduction ---

    /// The cached result for `id`, or `id` itself when it cannot reduce.
    fn memo(&self, id: TermId) -> Option<TermId> {
        let arena = self.store.arena();
        match arena.term(id) {
            Term::App(..) => arena.evaluated(id).filter(|_| !arena.is_dirty(id)),
            Term::Name(_) if self.definitions.contains_key(&id) => None,
            _ => Some(id),
        }
    }

    /// Reduce `term` to normal form.
    ///
    /// Each step either needs some subterm evaluated first (a new frame is
    /// pushed) or moves the current term; a step that returns its own input
    /// finishes the frame and caches the result on the frame's root.
    pub fn evaluate(&mut self, term: TermId) -> EvalResult {
        if let Some(done) = self.memo(term) {
            return Ok(done);
        }
        let start = self.steps;
        let mut peak = 0;
        let mut stack: Vec<Frame> = Vec::new();
        let mut frame = Frame::new(term);
        let mut action = self.step(term);
        loop {
            match action {
                Action::Need(child, stage) => match self.memo(child) {
                    Some(value) => action = self.resume(frame.expr, stage, value)?,
                    None => {
                        frame.stage = stage;
                        stack.push(std::mem::replace(&mut frame, Frame::new(child)));
                        peak = peak.max(stack.len());
                        action = self.step(child);
                    }
                },
                Action::Next(next) if next == frame.expr => {
                    self.finish(frame.root, next);
                    match stack.pop() {
                        Some(mut parent) => {
                            let stage = std::mem::replace(&mut parent.stage, Stage::Step);
                            action = self.resume(parent.expr, stage, next)?;
                            frame = parent;
                        }
                        None => {
                            debug!(steps = self.steps - start, peak, "evaluated");
                            return Ok(next);
                        }
                    }
                }
                Action::Next(next) => {
                    self.steps += 1;
                    frame.expr = next;
                    action = self.step(next);
                }
            }
        }
    }

    fn step(&self, expr: TermId) -> Action {
        if let Some((f, x)) = self.store.arena().children(expr) {
            return match self.memo(expr) {
                Some(done) => Action::Next(done),
                None => Action::Need(f, Stage::Head1 { x }),
            };
        }
        Action::Next(self.definition(expr).unwrap_or(expr))
    }

    fn resume(&mut self, expr: TermId, stage: Stage, value: TermId) -> Result<Action, GalaxyError> {
        match stage {
            Stage::Step => Ok(self.step(expr)),
            Stage::Head1 { x } => {
                if let Some(op) = self.rule_at(value, 1) {
                    return self.force_or_reduce(op, vec![x], 0);
                }
                Ok(match self.store.arena().children(value) {
                    Some((g, y)) => Action::Need(g, Stage::Head2 { x, y }),
                    None => Action::Next(expr),
                })
            }
            Stage::Head2 { x, y } => {
                if let Some(op) = self.rule_at(value, 2) {
                    return self.force_or_reduce(op, vec![y, x], 0);
                }
                Ok(match self.store.arena().children(value) {
                    Some((h, z)) => Action::Need(h, Stage::Head3 { x, y, z }),
                    None => Action::Next(expr),
                })
            }
            Stage::Head3 { x, y, z } => match self.rule_at(value, 3) {
                Some(op) => self.force_or_reduce(op, vec![z, y, x], 0),
                None => Ok(Action::Next(expr)),
            },
            Stage::Force { op, mut args, next } => {
                let slot = op.strict_args(args.len())[next];
                args[slot] = value;
                self.force_or_reduce(op, args, next + 1)
            }
        }
    }

    fn rule_at(&self, head: TermId, argc: usize) -> Option<Op> {
        self.store
            .arena()
            .as_op(head)
            .filter(|op| op.reduces_at(argc))
    }

    fn force_or_reduce(
        &mut self,
        op: Op,
        args: Vec<TermId>,
        next: usize,
    ) -> Result<Action, GalaxyError> {
        match op.strict_args(args.len()).get(next) {
            Some(&slot) => Ok(Action::Need(args[slot], Stage::Force { op, args, next })),
            None => Ok(Action::Next(operators::reduce(&mut self.store, op, &args)?)),
        }
    }

    fn finish(&mut self, root: TermId, result: TermId) {
        let arena = self.store.arena_mut();
        if arena.is_app(root) && arena.evaluated(root).is_none() {
            arena.set_evaluated(root, result);
        }
    }

    /// Evaluate `term` and every component of the data it produces.
    pub fn force_value(&mut self, term: TermId) -> Result<Value, GalaxyError> {
        enum Pending {
            Head(TermId),
            Tail(Value),
        }

        let mut stack = Vec::new();
        let mut cur = term;
        loop {
            let normal = self.evaluate(cur)?;
            let arena = self.store.arena();
            let mut value = match arena.term(normal) {
                Term::Int(n) => Value::Int(n.clone()),
                Term::Op(Op::Nil) => Value::Nil,
                _ => match arena.pair_parts(normal) {
                    Some((head, tail)) => {
                        stack.push(Pending::Head(tail));
                        cur = head;
                        continue;
                    }
                    None => {
                        return Err(GalaxyError::decode(format!(
                            "expected data, evaluation produced {}",
                            arena.describe(normal)
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
}

/// Whether `needle` occurs anywhere inside `term`.
fn mentions(arena: &TermArena, term: TermId, needle: TermId) -> bool {
    let mut seen = HashSet::new();
    let mut work = vec![term];
    while let Some(next) = work.pop() {
        if next == needle {
            return true;
        }
        if !seen.insert(next) {
            continue;
        }
        if let Some((f, x)) = arena.children(next) {
            work.push(f);
            work.push(x);
        }
    }
    false
}
