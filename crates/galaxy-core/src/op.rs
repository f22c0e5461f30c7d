use std::fmt;

/// The closed set of primitive combinators and arithmetic functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Op {
    S,
    C,
    B,
    T,
    F,
    I,
    Neg,
    Add,
    Mul,
    Div,
    Lt,
    Eq,
    Cons,
    Car,
    Cdr,
    Nil,
    IsNil,
}

impl Op {
    pub const ALL: [Op; 17] = [
        Op::S,
        Op::C,
        Op::B,
        Op::T,
        Op::F,
        Op::I,
        Op::Neg,
        Op::Add,
        Op::Mul,
        Op::Div,
        Op::Lt,
        Op::Eq,
        Op::Cons,
        Op::Car,
        Op::Cdr,
        Op::Nil,
        Op::IsNil,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Op::S => "s",
            Op::C => "c",
            Op::B => "b",
            Op::T => "t",
            Op::F => "f",
            Op::I => "i",
            Op::Neg => "neg",
            Op::Add => "add",
            Op::Mul => "mul",
            Op::Div => "div",
            Op::Lt => "lt",
            Op::Eq => "eq",
            Op::Cons => "cons",
            Op::Car => "car",
            Op::Cdr => "cdr",
            Op::Nil => "nil",
            Op::IsNil => "isnil",
        }
    }

    /// Look up a primitive by its source name. `vec` spells `cons`.
    pub fn from_name(name: &str) -> Option<Op> {
        match name {
            "vec" => Some(Op::Cons),
            _ => Op::ALL.iter().copied().find(|op| op.name() == name),
        }
    }

    /// Number of arguments the operator consumes as a combinator.
    pub fn arity(self) -> usize {
        match self {
            Op::I | Op::Neg | Op::Car | Op::Cdr | Op::Nil | Op::IsNil => 1,
            Op::T | Op::F | Op::Add | Op::Mul | Op::Div | Op::Lt | Op::Eq => 2,
            Op::S | Op::C | Op::B | Op::Cons => 3,
        }
    }

    /// Whether a reduction rule fires once `n` arguments are applied.
    ///
    /// `cons` has two rules: with two arguments it forces a data pair, with
    /// three it selects through the Church encoding.
    pub fn reduces_at(self, n: usize) -> bool {
        match self {
            Op::Cons => n == 2 || n == 3,
            _ => self.arity() == n,
        }
    }

    /// Argument positions (in application order) that must be evaluated
    /// before the rule for `n` arguments can fire.
    pub fn strict_args(self, n: usize) -> &'static [usize] {
        match (self, n) {
            (Op::Neg, 1) => &[0],
            (Op::Add | Op::Mul | Op::Div | Op::Lt | Op::Eq, 2) => &[1, 0],
            (Op::Cons, 2) => &[0, 1],
            _ => &[],
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
