use std::fmt;

use num_bigint::BigInt;
use num_traits::ToPrimitive;

/// The data exchanged with the remote peer: integers, unit and pairs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Int(BigInt),
    Nil,
    Pair(Box<Value>, Box<Value>),
}

/// A drawable point.
pub type Point = (i64, i64);

impl Value {
    pub fn int(n: impl Into<BigInt>) -> Self {
        Value::Int(n.into())
    }

    pub fn pair(head: Value, tail: Value) -> Self {
        Value::Pair(Box::new(head), Box::new(tail))
    }

    /// Build a nil-terminated list.
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        let items: Vec<Value> = items.into_iter().collect();
        items
            .into_iter()
            .rev()
            .fold(Value::Nil, |tail, head| Value::pair(head, tail))
    }

    pub fn as_int(&self) -> Option<&BigInt> {
        match self {
            Value::Int(n) => Some(n),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Elements of a nil-terminated list, or `None` for any other shape.
    pub fn as_list(&self) -> Option<Vec<&Value>> {
        let mut items = Vec::new();
        let mut cur = self;
        loop {
            match cur {
                Value::Nil => return Some(items),
                Value::Pair(head, tail) => {
                    items.push(head.as_ref());
                    cur = tail;
                }
                Value::Int(_) => return None,
            }
        }
    }

    /// A pair of machine-sized integers.
    pub fn as_point(&self) -> Option<Point> {
        match self {
            Value::Pair(x, y) => Some((x.as_int()?.to_i64()?, y.as_int()?.to_i64()?)),
            _ => None,
        }
    }

    /// A list of points, the payload of a draw instruction.
    pub fn as_points(&self) -> Option<Vec<Point>> {
        self.as_list()?.into_iter().map(Value::as_point).collect()
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(BigInt::from(n))
    }
}

impl From<Point> for Value {
    fn from((x, y): Point) -> Self {
        Value::pair(Value::from(x), Value::from(y))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Nil => f.write_str("nil"),
            Value::Pair(head, tail) => match self.as_list() {
                Some(items) => {
                    f.write_str("(")?;
                    for (i, item) in items.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{item}")?;
                    }
                    f.write_str(")")
                }
                None => write!(f, "<{head}, {tail}>"),
            },
        }
    }
}
