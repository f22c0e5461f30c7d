use galaxy_core::{GalaxyError, Op, Span};
use num_bigint::BigInt;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ap,
    Int(BigInt),
    Op(Op),
    Placeholder(u32),
    Name(String),
    Equals,
}

#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

pub fn tokenize(input: &str) -> Result<Vec<SpannedToken>, GalaxyError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;
    let mut line = 1;
    let mut col = 1;

    while i < chars.len() {
        let ch = chars[i];
        let span = Span::point(line, col);

        match ch {
            // Whitespace
            ' ' | '\t' | '\r' => {
                col += 1;
                i += 1;
            }
            '\n' => {
                line += 1;
                col = 1;
                i += 1;
            }

            // Comments
            '#' => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }

            '=' => {
                if i + 1 < chars.len() && !chars[i + 1].is_whitespace() {
                    return Err(GalaxyError::reader(
                        "'=' must stand alone between a left and right side",
                        span,
                    ));
                }
                tokens.push(SpannedToken {
                    token: Token::Equals,
                    span: span.with_end(line, col + 1),
                });
                col += 1;
                i += 1;
            }

            // Names (:1029)
            ':' => {
                let start = i;
                i += 1;
                while i < chars.len() && is_ident_char(chars[i]) {
                    i += 1;
                }
                if i == start + 1 {
                    return Err(GalaxyError::reader("expected name after ':'", span));
                }
                let name: String = chars[start..i].iter().collect();
                col += i - start;
                tokens.push(SpannedToken {
                    token: Token::Name(name),
                    span: span.with_end(line, col),
                });
            }

            // Numbers and identifiers
            _ => {
                if ch.is_ascii_digit()
                    || (ch == '-' && i + 1 < chars.len() && chars[i + 1].is_ascii_digit())
                {
                    let (tok, len) = read_number(&chars[i..], &span)?;
                    i += len;
                    col += len;
                    tokens.push(SpannedToken {
                        token: tok,
                        span: span.with_end(line, col),
                    });
                } else if is_ident_start(ch) {
                    let start = i;
                    while i < chars.len() && is_ident_char(chars[i]) {
                        i += 1;
                    }
                    let word: String = chars[start..i].iter().collect();
                    col += i - start;
                    tokens.push(SpannedToken {
                        token: classify(word, &span)?,
                        span: span.with_end(line, col),
                    });
                } else {
                    return Err(GalaxyError::reader(
                        format!("unexpected character: '{ch}'"),
                        span,
                    ));
                }
            }
        }
    }

    Ok(tokens)
}

fn read_number(chars: &[char], span: &Span) -> Result<(Token, usize), GalaxyError> {
    let mut i = 0;
    if chars[i] == '-' {
        i += 1;
    }
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    if i < chars.len() && is_ident_char(chars[i]) {
        let rest: String = chars[..]
            .iter()
            .take_while(|c| is_ident_char(**c) || **c == '-')
            .collect();
        return Err(GalaxyError::reader(format!("invalid integer: {rest}"), *span));
    }
    let s: String = chars[..i].iter().collect();
    let n: BigInt = s
        .parse()
        .map_err(|_| GalaxyError::reader(format!("invalid integer: {s}"), *span))?;
    Ok((Token::Int(n), i))
}

fn classify(word: String, span: &Span) -> Result<Token, GalaxyError> {
    if word == "ap" {
        return Ok(Token::Ap);
    }
    if let Some(op) = Op::from_name(&word) {
        return Ok(Token::Op(op));
    }
    if let Some(digits) = word.strip_prefix('x') {
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            let n = digits.parse::<u32>().map_err(|_| {
                GalaxyError::reader(format!("placeholder index out of range: {word}"), *span)
            })?;
            return Ok(Token::Placeholder(n));
        }
    }
    Ok(Token::Name(word))
}

fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '-' | '.' | '?' | '!' | '\'')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn tokenize_application() {
        assert_eq!(
            kinds("ap ap add 1 -2"),
            vec![
                Token::Ap,
                Token::Ap,
                Token::Op(Op::Add),
                Token::Int(BigInt::from(1)),
                Token::Int(BigInt::from(-2)),
            ]
        );
    }

    #[test]
    fn tokenize_names_and_placeholders() {
        assert_eq!(
            kinds(":1029 galaxy x0 x12 xs"),
            vec![
                Token::Name(":1029".into()),
                Token::Name("galaxy".into()),
                Token::Placeholder(0),
                Token::Placeholder(12),
                Token::Name("xs".into()),
            ]
        );
    }

    #[test]
    fn vec_is_cons() {
        assert_eq!(kinds("vec"), vec![Token::Op(Op::Cons)]);
    }

    #[test]
    fn definition_line() {
        let toks = tokenize("inc = ap add 1 # increment\ndec = ap add -1").unwrap();
        assert_eq!(toks.len(), 10);
        assert_eq!(toks[1].token, Token::Equals);
        assert_eq!(toks[5].token, Token::Name("dec".into()));
        assert_eq!(toks[5].span.line, 2);
        assert_eq!(toks[5].span.col, 1);
    }

    #[test]
    fn spans_cover_the_token() {
        let toks = tokenize("ap  :42").unwrap();
        assert_eq!(toks[1].span, Span::point(1, 5).with_end(1, 8));
    }

    #[test]
    fn big_integers() {
        let big = "123456789012345678901234567890";
        assert_eq!(kinds(big), vec![Token::Int(big.parse().unwrap())]);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            tokenize("ap (add) 1"),
            Err(GalaxyError::Reader { .. })
        ));
        assert!(tokenize("12abc").is_err());
        assert!(tokenize(": 1").is_err());
        assert!(tokenize("a =b").is_err());
        assert!(tokenize("x99999999999").is_err());
    }
}
