//! Textual chain scripts in the format printed by addchain:
//!
//! ```text
//! _10    = 2*1
//! _11    = 1 + _10
//! _1100  = _11 << 2
//! return   (_1100 + _11) << 4 + 1
//! ```
//!
//! `+` adds, `<< k` shifts (binds tighter than `+`), `2*e` doubles, `1`
//! is the input. Comments start with `#` or `//`. Every assignment
//! introduces a new name; `return` must be the last statement.

use num_bigint::BigUint;

use super::{AdditionChain, ChainBuilder, Op, StepRef};
use crate::diagnostic::Diagnostic;
use crate::span::{Span, Spanned};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    Ident(String),
    Int(u64),
    Return,
    Plus,
    Shl,
    Star,
    Eq,
    LParen,
    RParen,
    Eof,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Ident(name) => format!("`{}`", name),
            Token::Int(v) => format!("`{}`", v),
            Token::Return => "`return`".to_string(),
            Token::Plus => "`+`".to_string(),
            Token::Shl => "`<<`".to_string(),
            Token::Star => "`*`".to_string(),
            Token::Eq => "`=`".to_string(),
            Token::LParen => "`(`".to_string(),
            Token::RParen => "`)`".to_string(),
            Token::Eof => "end of script".to_string(),
        }
    }
}

fn is_ident_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_'
}

fn is_ident_continue(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_'
}

fn tokenize(source: &str) -> Result<Vec<Spanned<Token>>, Vec<Diagnostic>> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let ch = bytes[pos];
        if ch.is_ascii_whitespace() {
            pos += 1;
            continue;
        }
        if ch == b'#' || (ch == b'/' && bytes.get(pos + 1) == Some(&b'/')) {
            while pos < bytes.len() && bytes[pos] != b'\n' {
                pos += 1;
            }
            continue;
        }

        let start = pos;
        let token = if is_ident_start(ch) {
            while pos < bytes.len() && is_ident_continue(bytes[pos]) {
                pos += 1;
            }
            match &source[start..pos] {
                "return" => Token::Return,
                name => Token::Ident(name.to_string()),
            }
        } else if ch.is_ascii_digit() {
            while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                pos += 1;
            }
            match source[start..pos].parse::<u64>() {
                Ok(v) => Token::Int(v),
                Err(_) => {
                    errors.push(Diagnostic::error(
                        "integer literal out of range".to_string(),
                        Span::new(start as u32, pos as u32),
                    ));
                    continue;
                }
            }
        } else if ch == b'<' && bytes.get(pos + 1) == Some(&b'<') {
            pos += 2;
            Token::Shl
        } else {
            pos += 1;
            match ch {
                b'+' => Token::Plus,
                b'*' => Token::Star,
                b'=' => Token::Eq,
                b'(' => Token::LParen,
                b')' => Token::RParen,
                _ => {
                    let ch_end = source[start..]
                        .chars()
                        .next()
                        .map(|c| start + c.len_utf8())
                        .unwrap_or(pos);
                    pos = ch_end;
                    errors.push(Diagnostic::error(
                        format!("unexpected character `{}`", &source[start..ch_end]),
                        Span::new(start as u32, ch_end as u32),
                    ));
                    continue;
                }
            }
        };
        tokens.push(Spanned::new(token, Span::new(start as u32, pos as u32)));
    }

    let end = source.len() as u32;
    tokens.push(Spanned::new(Token::Eof, Span::new(end, end)));
    if errors.is_empty() {
        Ok(tokens)
    } else {
        Err(errors)
    }
}

/// Recursive-descent parser that builds chain steps while it parses.
struct Parser {
    tokens: Vec<Spanned<Token>>,
    pos: usize,
    builder: ChainBuilder,
    names: Vec<(String, StepRef)>,
}

impl Parser {
    fn peek(&self) -> &Spanned<Token> {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> Spanned<Token> {
        let tok = self.tokens[self.pos].clone();
        if tok.node != Token::Eof {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, expected: Token) -> Result<Span, Diagnostic> {
        let tok = self.advance();
        if tok.node == expected {
            Ok(tok.span)
        } else {
            Err(Diagnostic::error(
                format!("expected {}, found {}", expected.describe(), tok.node.describe()),
                tok.span,
            ))
        }
    }

    fn lookup(&self, name: &str) -> Option<StepRef> {
        self.names
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, step)| *step)
    }

    fn parse(mut self) -> Result<AdditionChain, Diagnostic> {
        loop {
            let tok = self.advance();
            match tok.node {
                Token::Ident(name) => {
                    if self.lookup(&name).is_some() {
                        return Err(Diagnostic::error(
                            format!("`{}` is already defined", name),
                            tok.span,
                        )
                        .with_help("every chain variable is assigned exactly once".to_string()));
                    }
                    self.expect(Token::Eq)?;
                    let value = self.expr()?;
                    self.names.push((name, value.node));
                }
                Token::Return => {
                    let value = self.expr()?;
                    let next = self.advance();
                    if next.node != Token::Eof {
                        return Err(Diagnostic::error(
                            "`return` must be the last statement".to_string(),
                            next.span,
                        ));
                    }
                    if value.node != self.builder.current() {
                        return Err(Diagnostic::error(
                            "returned value is not the last computed step".to_string(),
                            value.span,
                        )
                        .with_note("later assignments would never be used".to_string()));
                    }
                    let steps = std::mem::take(&mut self.builder);
                    let probe = steps.clone().finish(BigUint::from(1u32));
                    let values = probe
                        .values()
                        .map_err(|e| Diagnostic::error(e.to_string(), value.span))?;
                    let target = values[probe.last()].clone();
                    return Ok(steps.finish(target));
                }
                Token::Eof => {
                    return Err(Diagnostic::error(
                        "missing `return` statement".to_string(),
                        tok.span,
                    ));
                }
                other => {
                    return Err(Diagnostic::error(
                        format!("expected an assignment or `return`, found {}", other.describe()),
                        tok.span,
                    ));
                }
            }
        }
    }

    /// expr := shift ('+' shift)*
    fn expr(&mut self) -> Result<Spanned<StepRef>, Diagnostic> {
        let mut lhs = self.shift()?;
        while self.peek().node == Token::Plus {
            self.advance();
            let rhs = self.shift()?;
            let step = self.builder.add(lhs.node, rhs.node);
            lhs = Spanned::new(step, lhs.span.merge(rhs.span));
        }
        Ok(lhs)
    }

    /// shift := unary ('<<' int)*
    fn shift(&mut self) -> Result<Spanned<StepRef>, Diagnostic> {
        let mut lhs = self.unary()?;
        while self.peek().node == Token::Shl {
            self.advance();
            let tok = self.advance();
            let count = match tok.node {
                Token::Int(v) if v > 0 && v <= u32::MAX as u64 => v as u32,
                Token::Int(_) => {
                    return Err(Diagnostic::error(
                        "shift amount must be between 1 and 2^32 - 1".to_string(),
                        tok.span,
                    ));
                }
                other => {
                    return Err(Diagnostic::error(
                        format!("expected a shift amount, found {}", other.describe()),
                        tok.span,
                    ));
                }
            };
            let step = self.builder.shift(lhs.node, count);
            lhs = Spanned::new(step, lhs.span.merge(tok.span));
        }
        Ok(lhs)
    }

    /// unary := '2' '*' unary | primary
    fn unary(&mut self) -> Result<Spanned<StepRef>, Diagnostic> {
        let is_double = self.peek().node == Token::Int(2)
            && self.tokens.get(self.pos + 1).map(|t| &t.node) == Some(&Token::Star);
        if is_double {
            let start = self.advance().span;
            self.advance();
            let operand = self.unary()?;
            let step = self.builder.double(operand.node);
            return Ok(Spanned::new(step, start.merge(operand.span)));
        }
        self.primary()
    }

    /// primary := '1' | ident | '(' expr ')'
    fn primary(&mut self) -> Result<Spanned<StepRef>, Diagnostic> {
        let tok = self.advance();
        match tok.node {
            Token::Int(1) => Ok(Spanned::new(self.builder.one(), tok.span)),
            Token::Int(v) => Err(Diagnostic::error(
                format!("literal `{}` is not a chain value", v),
                tok.span,
            )
            .with_help("only `1` and `2*` may appear as literals".to_string())),
            Token::Ident(name) => match self.lookup(&name) {
                Some(step) => Ok(Spanned::new(step, tok.span)),
                None => Err(Diagnostic::error(
                    format!("undefined variable `{}`", name),
                    tok.span,
                )),
            },
            Token::LParen => {
                let inner = self.expr()?;
                let close = self.expect(Token::RParen)?;
                Ok(Spanned::new(inner.node, tok.span.merge(close)))
            }
            other => Err(Diagnostic::error(
                format!("expected an operand, found {}", other.describe()),
                tok.span,
            )),
        }
    }
}

/// Parse a chain script. The chain's target is the value it computes.
pub fn parse_script(source: &str) -> Result<AdditionChain, Vec<Diagnostic>> {
    let tokens = tokenize(source)?;
    let parser = Parser {
        tokens,
        pos: 0,
        builder: ChainBuilder::new(),
        names: Vec::new(),
    };
    parser.parse().map_err(|d| vec![d])
}

/// Name a chain value the way addchain does: `_` plus the binary digits
/// for small values, `i<step>` otherwise.
fn value_name(value: &BigUint, step: StepRef) -> String {
    if value.bits() <= 16 {
        format!("_{:b}", value)
    } else {
        format!("i{}", step)
    }
}

/// Print a chain as a script, one statement per step.
///
/// Steps whose values coincide with an earlier step keep the earlier name
/// only when they are the same step, so names never collide.
pub fn print_script(chain: &AdditionChain) -> String {
    let values = match chain.values() {
        Ok(values) => values,
        Err(e) => return format!("# malformed chain: {}\n", e),
    };

    let mut names: Vec<String> = Vec::with_capacity(values.len());
    names.push("1".to_string());
    let mut used: std::collections::HashSet<String> = std::collections::HashSet::new();
    for (step, value) in values.iter().enumerate().skip(1) {
        let mut name = value_name(value, step);
        if !used.insert(name.clone()) {
            name = format!("i{}", step);
            used.insert(name.clone());
        }
        names.push(name);
    }

    let width = names.iter().skip(1).map(|n| n.len()).max().unwrap_or(0).max(6);
    let mut out = String::new();
    if chain.is_empty() {
        out.push_str("return 1\n");
        return out;
    }
    for (i, op) in chain.steps().iter().enumerate() {
        let step = i + 1;
        let rhs = match *op {
            Op::Double(of) => format!("2*{}", names[of]),
            Op::Add(x, y) => format!("{} + {}", names[x], names[y]),
            Op::Shift(of, count) => format!("{} << {}", names[of], count),
        };
        if step == chain.last() {
            out.push_str(&format!("{:<width$} {}\n", "return", rhs, width = width));
        } else {
            out.push_str(&format!("{:<width$} = {}\n", names[step], rhs, width = width));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# x^0xff
_10       = 2*1
_11       = 1 + _10
_1100     = _11 << 2
_1111     = _11 + _1100
_11110000 = _1111 << 4
return      _1111 + _11110000
";

    #[test]
    fn test_parse_sample() {
        let chain = parse_script(SAMPLE).unwrap();
        assert_eq!(chain.target(), &BigUint::from(0xffu32));
        assert_eq!(
            chain.steps(),
            &[
                Op::Double(0),
                Op::Add(0, 1),
                Op::Shift(2, 2),
                Op::Add(2, 3),
                Op::Shift(4, 4),
                Op::Add(4, 5),
            ]
        );
        assert!(chain.validate().is_ok());
    }

    #[test]
    fn test_nested_expression() {
        // ((1 << 3) + 1) << 1 = 18
        let chain = parse_script("return (1 << 3 + 1) << 1").unwrap();
        assert_eq!(chain.target(), &BigUint::from(18u32));
        assert_eq!(chain.len(), 3);
    }

    #[test]
    fn test_shift_binds_tighter_than_add() {
        let chain = parse_script("_11 = 1 + 2*1\nreturn _11 << 2 + _11").unwrap();
        assert_eq!(chain.target(), &BigUint::from(15u32));
    }

    #[test]
    fn test_return_one() {
        let chain = parse_script("return 1").unwrap();
        assert!(chain.is_empty());
        assert_eq!(chain.target(), &BigUint::from(1u32));
    }

    #[test]
    fn test_undefined_variable() {
        let source = "_10 = 2*1\nreturn _10 + _11\n";
        let errs = parse_script(source).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert!(errs[0].message.contains("undefined variable `_11`"));
        assert_eq!(&source[errs[0].span.range()], "_11");
    }

    #[test]
    fn test_redefinition() {
        let errs = parse_script("a = 2*1\na = 2*a\nreturn a").unwrap_err();
        assert!(errs[0].message.contains("already defined"));
    }

    #[test]
    fn test_missing_return() {
        let errs = parse_script("_10 = 2*1\n").unwrap_err();
        assert!(errs[0].message.contains("missing `return`"));
    }

    #[test]
    fn test_return_must_be_last_step() {
        let errs = parse_script("a = 2*1\nb = 2*a\nreturn a").unwrap_err();
        assert!(errs[0].message.contains("not the last computed step"));
    }

    #[test]
    fn test_statement_after_return() {
        let errs = parse_script("return 2*1\nx = 2*1").unwrap_err();
        assert!(errs[0].message.contains("last statement"));
    }

    #[test]
    fn test_zero_shift_rejected() {
        let errs = parse_script("return 1 << 0").unwrap_err();
        assert!(errs[0].message.contains("shift amount"));
    }

    #[test]
    fn test_bad_literal() {
        let errs = parse_script("return 3 + 1").unwrap_err();
        assert!(errs[0].message.contains("literal `3`"));
    }

    #[test]
    fn test_bad_character() {
        let errs = parse_script("a = 2*1 - 1\nreturn a").unwrap_err();
        assert!(errs[0].message.contains("unexpected character `-`"));
    }

    #[test]
    fn test_print_then_parse() {
        let chain = parse_script(SAMPLE).unwrap();
        let printed = print_script(&chain);
        assert!(printed.starts_with("_10"));
        assert!(printed.lines().last().unwrap().starts_with("return"));
        assert_eq!(parse_script(&printed).unwrap(), chain);
    }

    #[test]
    fn test_print_large_values_use_step_names() {
        let mut b = ChainBuilder::new();
        let one = b.one();
        let big = b.shift(one, 40);
        b.add(big, one);
        let chain = b.finish((BigUint::from(1u32) << 40u32) + 1u32);
        let printed = print_script(&chain);
        assert!(printed.contains("i1"));
        assert_eq!(parse_script(&printed).unwrap(), chain);
    }
}
