//! Reduction of galaxy terms: a memoizing graph-reduction evaluator over a
//! hash-consed store, and a budgeted rewrite search over pattern rules.

mod eval;
pub mod matcher;
mod operators;
pub mod prelude;
pub mod rewrite;
mod store;

pub use eval::{EvalResult, Evaluator};
pub use matcher::{instantiate, match_term, VarMap};
pub use rewrite::{Goal, Rule, RuleSet, SearchBudget, Simplified, Simplifier, Status};
pub use store::{ApCache, CacheStats, TermStore, DEFAULT_CACHE_CAPACITY};
