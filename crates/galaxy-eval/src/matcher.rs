use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use galaxy_core::{GalaxyError, Term, TermArena, TermId};

use crate::store::TermStore;

/// Placeholder bindings produced by a successful match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VarMap {
    bindings: BTreeMap<u32, TermId>,
}

impl VarMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, placeholder: u32) -> Option<TermId> {
        self.bindings.get(&placeholder).copied()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, TermId)> + '_ {
        self.bindings.iter().map(|(k, v)| (*k, *v))
    }

    /// Add a binding; `None` if the placeholder is already bound.
    pub fn bind(mut self, placeholder: u32, term: TermId) -> Option<VarMap> {
        match self.bindings.entry(placeholder) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(term);
                Some(self)
            }
        }
    }

    /// Union of two maps; `None` if any placeholder is bound in both, even
    /// to the same term.
    pub fn merge(self, other: VarMap) -> Option<VarMap> {
        other
            .bindings
            .into_iter()
            .try_fold(self, |acc, (k, v)| acc.bind(k, v))
    }
}

/// Match `term` against `pattern`.
///
/// A placeholder matches anything; leaves must be equal; applications match
/// position by position. Binding one placeholder twice fails the match.
pub fn match_term(arena: &TermArena, term: TermId, pattern: TermId) -> Option<VarMap> {
    let mut bindings = VarMap::new();
    let mut work = vec![(term, pattern)];
    while let Some((t, p)) = work.pop() {
        match (arena.term(t), arena.term(p)) {
            (_, Term::Placeholder(n)) => bindings = bindings.bind(*n, t)?,
            (Term::App(tf, tx), Term::App(pf, px)) => {
                work.push((*tx, *px));
                work.push((*tf, *pf));
            }
            (tl, pl) if tl.is_leaf() && tl == pl => {}
            _ => return None,
        }
    }
    Some(bindings)
}

/// Rebuild `template` with every placeholder replaced by its binding.
///
/// Subterms without placeholders keep their identity.
pub fn instantiate(
    store: &mut TermStore,
    template: TermId,
    bindings: &VarMap,
) -> Result<TermId, GalaxyError> {
    enum Pending {
        Fun { node: TermId, arg: TermId },
        Arg { node: TermId, fun: TermId },
    }

    let mut pending = Vec::new();
    let mut cur = template;
    loop {
        let mut built = match store.arena().term(cur) {
            Term::Placeholder(n) => bindings.get(*n).ok_or_else(|| {
                GalaxyError::malformed(format!("placeholder x{n} is unbound"))
            })?,
            Term::App(f, x) => {
                pending.push(Pending::Fun { node: cur, arg: *x });
                cur = *f;
                continue;
            }
            _ => cur,
        };
        loop {
            match pending.pop() {
                None => return Ok(built),
                Some(Pending::Fun { node, arg }) => {
                    pending.push(Pending::Arg { node, fun: built });
                    cur = arg;
                    break;
                }
                Some(Pending::Arg { node, fun }) => {
                    built = if store.arena().children(node) == Some((fun, built)) {
                        node
                    } else {
                        store.app(fun, built)
                    };
                }
            }
        }
    }
}

/// Placeholder ids occurring in `term`.
pub fn placeholders(arena: &TermArena, term: TermId) -> Vec<u32> {
    let mut found = Vec::new();
    let mut work = vec![term];
    while let Some(next) = work.pop() {
        match arena.term(next) {
            Term::Placeholder(n) if !found.contains(n) => found.push(*n),
            Term::App(f, x) => {
                work.push(*x);
                work.push(*f);
            }
            _ => {}
        }
    }
    found
}
