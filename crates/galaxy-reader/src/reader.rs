use galaxy_core::{GalaxyError, Span, TermArena, TermId};

use crate::lexer::{tokenize, SpannedToken, Token};

/// A line of the form `<lhs> = <rhs>`.
///
/// Programs use it to bind a name to a body; rewrite rules use the same
/// syntax with a pattern on the left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Definition {
    pub lhs: TermId,
    pub rhs: TermId,
    pub span: Span,
}

struct Parser<'a> {
    tokens: Vec<SpannedToken>,
    pos: usize,
    arena: &'a mut TermArena,
}

impl<'a> Parser<'a> {
    fn new(tokens: Vec<SpannedToken>, arena: &'a mut TermArena) -> Self {
        Parser {
            tokens,
            pos: 0,
            arena,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    /// Span of the next token, or the end of the last one at end of input.
    fn span(&self) -> Span {
        match self.tokens.get(self.pos) {
            Some(t) => t.span,
            None => self
                .tokens
                .last()
                .map(|t| Span::point(t.span.end_line, t.span.end_col))
                .unwrap_or(Span::point(1, 1)),
        }
    }

    fn advance(&mut self) -> Option<&SpannedToken> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, expected: &Token) -> Result<(), GalaxyError> {
        let span = self.span();
        match self.advance() {
            Some(t) if &t.token == expected => Ok(()),
            Some(t) => Err(GalaxyError::reader(
                format!("expected {expected:?}, got {:?}", t.token),
                span,
            )),
            None => Err(GalaxyError::reader(
                format!("expected {expected:?}, got end of input"),
                span,
            )),
        }
    }

    fn expect_end(&self) -> Result<(), GalaxyError> {
        match self.peek() {
            None => Ok(()),
            Some(t) => Err(GalaxyError::reader(
                format!("unexpected trailing token: {t:?}"),
                self.span(),
            )),
        }
    }

    /// Parse one prefix term. `ap` pushes a pending application; each
    /// completed operand fills the innermost pending slot.
    fn parse_term(&mut self) -> Result<TermId, GalaxyError> {
        enum Pending {
            Fun,
            Arg(TermId),
        }

        let mut pending = Vec::new();
        loop {
            let span = self.span();
            let token = match self.advance() {
                Some(t) => t.token.clone(),
                None if pending.is_empty() => {
                    return Err(GalaxyError::reader("unexpected end of input", span))
                }
                None => {
                    return Err(GalaxyError::reader(
                        format!(
                            "unexpected end of input: {} application(s) left incomplete",
                            pending.len()
                        ),
                        span,
                    ))
                }
            };
            let mut term = match token {
                Token::Ap => {
                    pending.push(Pending::Fun);
                    continue;
                }
                Token::Int(n) => self.arena.int(n),
                Token::Op(op) => self.arena.op(op),
                Token::Placeholder(n) => self.arena.placeholder(n),
                Token::Name(name) => self.arena.name(&name),
                Token::Equals => return Err(GalaxyError::reader("unexpected '='", span)),
            };
            loop {
                match pending.pop() {
                    None => return Ok(term),
                    Some(Pending::Fun) => {
                        pending.push(Pending::Arg(term));
                        break;
                    }
                    Some(Pending::Arg(f)) => term = self.arena.app(f, term),
                }
            }
        }
    }

    fn parse_definition(&mut self) -> Result<Definition, GalaxyError> {
        let span = self.span();
        let lhs = self.parse_term()?;
        self.expect(&Token::Equals)?;
        let rhs = self.parse_term()?;
        let end = self.tokens.get(self.pos.saturating_sub(1)).map(|t| t.span);
        let span = match end {
            Some(end) => span.with_end(end.end_line, end.end_col),
            None => span,
        };
        Ok(Definition { lhs, rhs, span })
    }
}

/// Read exactly one term from `input`.
pub fn read_term(arena: &mut TermArena, input: &str) -> Result<TermId, GalaxyError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser::new(tokens, arena);
    let term = parser.parse_term()?;
    parser.expect_end()?;
    Ok(term)
}

/// Read a single `<lhs> = <rhs>` line.
pub fn read_definition(arena: &mut TermArena, input: &str) -> Result<Definition, GalaxyError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser::new(tokens, arena);
    let def = parser.parse_definition()?;
    parser.expect_end()?;
    Ok(def)
}

/// Read a program: one definition per non-blank line, `#` starts a comment.
pub fn read_program(arena: &mut TermArena, input: &str) -> Result<Vec<Definition>, GalaxyError> {
    let tokens = tokenize(input)?;
    let mut lines: Vec<Vec<SpannedToken>> = Vec::new();
    for tok in tokens {
        match lines.last_mut() {
            Some(line) if line[0].span.line == tok.span.line => line.push(tok),
            _ => lines.push(vec![tok]),
        }
    }

    let mut defs = Vec::with_capacity(lines.len());
    for line in lines {
        let mut parser = Parser::new(line, arena);
        defs.push(parser.parse_definition()?);
        parser.expect_end()?;
    }
    Ok(defs)
}
