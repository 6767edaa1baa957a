use unicode_normalization::UnicodeNormalization;

use crate::ast::{
    AggregateFunction, BodyAggregate, BodyAggregateElement, BodyLiteral, ConditionalLiteral,
    Guard, Head, HeadAggregate, HeadAggregateElement, OptimizeElement, OptimizeKind, Program,
    Rule, SetAggregate, Statement, StatementKind,
};
use crate::diagnostics::{Diagnostic, make_span};
use crate::types::{Atom, BinOp, CompOp, Literal, LiteralKind, Sign, Signature, Term};

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    start: usize,
    end: usize,
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Ident(String),
    Variable(String),
    Anonymous,
    Number(i64),
    Str(String),
    Directive(String),
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Colon,
    If,
    WeakIf,
    Dot,
    DotDot,
    At,
    Bar,
    Cmp(CompOp),
    Plus,
    Minus,
    Star,
    Slash,
    Backslash,
    Power,
}

impl TokenKind {
    fn describe(&self) -> String {
        match self {
            TokenKind::Ident(s) | TokenKind::Variable(s) | TokenKind::Directive(s) => {
                format!("`{s}`")
            }
            TokenKind::Anonymous => "`_`".to_string(),
            TokenKind::Number(n) => format!("`{n}`"),
            TokenKind::Str(s) => format!("string \"{s}\""),
            TokenKind::LParen => "`(`".to_string(),
            TokenKind::RParen => "`)`".to_string(),
            TokenKind::LBrace => "`{`".to_string(),
            TokenKind::RBrace => "`}`".to_string(),
            TokenKind::LBracket => "`[`".to_string(),
            TokenKind::RBracket => "`]`".to_string(),
            TokenKind::Comma => "`,`".to_string(),
            TokenKind::Semicolon => "`;`".to_string(),
            TokenKind::Colon => "`:`".to_string(),
            TokenKind::If => "`:-`".to_string(),
            TokenKind::WeakIf => "`:~`".to_string(),
            TokenKind::Dot => "`.`".to_string(),
            TokenKind::DotDot => "`..`".to_string(),
            TokenKind::At => "`@`".to_string(),
            TokenKind::Bar => "`|`".to_string(),
            TokenKind::Cmp(op) => format!("`{}`", op.symbol()),
            TokenKind::Plus => "`+`".to_string(),
            TokenKind::Minus => "`-`".to_string(),
            TokenKind::Star => "`*`".to_string(),
            TokenKind::Slash => "`/`".to_string(),
            TokenKind::Backslash => "`\\`".to_string(),
            TokenKind::Power => "`**`".to_string(),
        }
    }
}

pub fn parse_program(src: &str) -> Result<Program, Vec<Diagnostic>> {
    let tokens = lex(src)?;
    let mut parser = Parser::new(src, tokens);
    let mut program = Program::new();
    let mut errors = Vec::new();

    while !parser.at_end() {
        let start = parser.current_start();
        match parser.parse_statement() {
            Ok(kind) => {
                let span = make_span(src, start, parser.prev_end());
                program.statements.push(Statement::new(kind, Some(span)));
            }
            Err(e) => {
                errors.push(e);
                parser.recover();
            }
        }
    }

    if errors.is_empty() {
        Ok(program)
    } else {
        Err(errors)
    }
}

/// Parses a whitespace separated sequence of terms, as solvers print answer sets.
pub fn parse_terms(src: &str) -> Result<Vec<Term>, Vec<Diagnostic>> {
    let tokens = lex(src)?;
    let mut parser = Parser::new(src, tokens);
    let mut terms = Vec::new();
    while !parser.at_end() {
        // Top-level atoms are never arithmetic, so `a -b` is two terms.
        let term = parser.parse_unary().map_err(|e| vec![e])?;
        terms.push(term);
        parser.eat(&TokenKind::Comma);
    }
    Ok(terms)
}

fn lex(src: &str) -> Result<Vec<Token>, Vec<Diagnostic>> {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    let chars: Vec<(usize, char)> = src.char_indices().collect();
    let offset_at = |i: usize| chars.get(i).map(|(o, _)| *o).unwrap_or(src.len());
    let mut i = 0usize;

    while i < chars.len() {
        let (start, ch) = chars[i];
        let next = chars.get(i + 1).map(|(_, c)| *c);

        if ch.is_whitespace() {
            i += 1;
            continue;
        }
        if ch == '%' {
            if next == Some('*') {
                let mut j = i + 2;
                let mut closed = false;
                while j < chars.len() {
                    if chars[j].1 == '*' && chars.get(j + 1).map(|(_, c)| *c) == Some('%') {
                        closed = true;
                        j += 2;
                        break;
                    }
                    j += 1;
                }
                if !closed {
                    errors.push(Diagnostic::new(
                        "E-PARSE",
                        "unterminated block comment",
                        Some(make_span(src, start, start + 2)),
                    ));
                }
                i = j;
            } else {
                while i < chars.len() && chars[i].1 != '\n' {
                    i += 1;
                }
            }
            continue;
        }

        if ch.is_ascii_digit() {
            let mut j = i;
            while j < chars.len() && chars[j].1.is_ascii_digit() {
                j += 1;
            }
            let end = offset_at(j);
            match src[start..end].parse::<i64>() {
                Ok(n) => tokens.push(Token {
                    kind: TokenKind::Number(n),
                    start,
                    end,
                }),
                Err(_) => errors.push(Diagnostic::new(
                    "E-PARSE",
                    format!("integer literal out of range: {}", &src[start..end]),
                    Some(make_span(src, start, end)),
                )),
            }
            i = j;
            continue;
        }

        if ch == '"' {
            let mut j = i + 1;
            let mut value = String::new();
            let mut closed = false;
            while j < chars.len() {
                let c = chars[j].1;
                if c == '"' {
                    closed = true;
                    j += 1;
                    break;
                }
                if c == '\\' {
                    match chars.get(j + 1).map(|(_, c)| *c) {
                        Some('n') => value.push('\n'),
                        Some('"') => value.push('"'),
                        Some('\\') => value.push('\\'),
                        Some(other) => {
                            value.push('\\');
                            value.push(other);
                        }
                        None => break,
                    }
                    j += 2;
                    continue;
                }
                value.push(c);
                j += 1;
            }
            if !closed {
                errors.push(Diagnostic::new(
                    "E-PARSE",
                    "unterminated string literal",
                    Some(make_span(src, start, start + 1)),
                ));
                break;
            }
            tokens.push(Token {
                kind: TokenKind::Str(value),
                start,
                end: offset_at(j),
            });
            i = j;
            continue;
        }

        if ch == '#' {
            let mut j = i + 1;
            while j < chars.len() && chars[j].1.is_alphabetic() {
                j += 1;
            }
            if j == i + 1 {
                errors.push(Diagnostic::new(
                    "E-PARSE",
                    "expected directive name after `#`",
                    Some(make_span(src, start, start + 1)),
                ));
                i += 1;
                continue;
            }
            let mut name = src[start..offset_at(j)].to_string();
            if name == "#sum" && chars.get(j).map(|(_, c)| *c) == Some('+') {
                name.push('+');
                j += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Directive(name),
                start,
                end: offset_at(j),
            });
            i = j;
            continue;
        }

        if ch.is_alphabetic() || ch == '_' {
            let mut j = i;
            while j < chars.len() {
                let c = chars[j].1;
                if c.is_alphanumeric() || c == '_' || c == '\'' {
                    j += 1;
                } else {
                    break;
                }
            }
            let end = offset_at(j);
            let text: String = src[start..end].nfc().collect();
            let stripped = text.trim_start_matches('_');
            let kind = match stripped.chars().next() {
                None => TokenKind::Anonymous,
                Some(first) if first.is_uppercase() => TokenKind::Variable(text),
                Some(_) => TokenKind::Ident(text),
            };
            tokens.push(Token { kind, start, end });
            i = j;
            continue;
        }

        let (kind, width) = match (ch, next) {
            (':', Some('-')) => (TokenKind::If, 2),
            (':', Some('~')) => (TokenKind::WeakIf, 2),
            (':', _) => (TokenKind::Colon, 1),
            ('.', Some('.')) => (TokenKind::DotDot, 2),
            ('.', _) => (TokenKind::Dot, 1),
            ('=', Some('=')) => (TokenKind::Cmp(CompOp::Eq), 2),
            ('=', _) => (TokenKind::Cmp(CompOp::Eq), 1),
            ('!', Some('=')) => (TokenKind::Cmp(CompOp::Ne), 2),
            ('<', Some('>')) => (TokenKind::Cmp(CompOp::Ne), 2),
            ('<', Some('=')) => (TokenKind::Cmp(CompOp::Le), 2),
            ('<', _) => (TokenKind::Cmp(CompOp::Lt), 1),
            ('>', Some('=')) => (TokenKind::Cmp(CompOp::Ge), 2),
            ('>', _) => (TokenKind::Cmp(CompOp::Gt), 1),
            ('*', Some('*')) => (TokenKind::Power, 2),
            ('*', _) => (TokenKind::Star, 1),
            ('(', _) => (TokenKind::LParen, 1),
            (')', _) => (TokenKind::RParen, 1),
            ('{', _) => (TokenKind::LBrace, 1),
            ('}', _) => (TokenKind::RBrace, 1),
            ('[', _) => (TokenKind::LBracket, 1),
            (']', _) => (TokenKind::RBracket, 1),
            (',', _) => (TokenKind::Comma, 1),
            (';', _) => (TokenKind::Semicolon, 1),
            ('@', _) => (TokenKind::At, 1),
            ('|', _) => (TokenKind::Bar, 1),
            ('+', _) => (TokenKind::Plus, 1),
            ('-', _) => (TokenKind::Minus, 1),
            ('/', _) => (TokenKind::Slash, 1),
            ('\\', _) => (TokenKind::Backslash, 1),
            _ => {
                errors.push(Diagnostic::new(
                    "E-PARSE",
                    format!("unexpected character '{ch}'"),
                    Some(make_span(src, start, start + ch.len_utf8())),
                ));
                i += 1;
                continue;
            }
        };
        tokens.push(Token {
            kind,
            start,
            end: offset_at(i + width),
        });
        i += width;
    }

    if errors.is_empty() {
        Ok(tokens)
    } else {
        Err(errors)
    }
}

type PResult<T> = Result<T, Diagnostic>;

struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str, tokens: Vec<Token>) -> Self {
        Self {
            src,
            tokens,
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&TokenKind> {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + n).map(|t| &t.kind)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek() == Some(kind)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn advance(&mut self) -> Option<TokenKind> {
        let token = self.tokens.get(self.pos).map(|t| t.kind.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn current_start(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|t| t.start)
            .unwrap_or(self.src.len())
    }

    fn prev_end(&self) -> usize {
        if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].end
        }
    }

    fn error(&self, message: impl Into<String>) -> Diagnostic {
        let span = match self.tokens.get(self.pos) {
            Some(t) => make_span(self.src, t.start, t.end),
            None => make_span(self.src, self.src.len(), self.src.len()),
        };
        Diagnostic::new("E-PARSE", message, Some(span))
    }

    fn unexpected(&self, expected: &str) -> Diagnostic {
        match self.peek() {
            Some(kind) => self.error(format!("expected {expected}, found {}", kind.describe())),
            None => self.error(format!("expected {expected}, found end of input")),
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> PResult<()> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.unexpected(&kind.describe()))
        }
    }

    /// Skips past the next statement terminator.
    fn recover(&mut self) {
        while let Some(kind) = self.advance() {
            if kind == TokenKind::Dot {
                break;
            }
        }
    }

    fn expect_ident(&mut self) -> PResult<String> {
        match self.peek() {
            Some(TokenKind::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn parse_statement(&mut self) -> PResult<StatementKind> {
        match self.peek() {
            Some(TokenKind::If) => {
                self.pos += 1;
                let body = self.parse_body()?;
                self.expect(&TokenKind::Dot)?;
                Ok(StatementKind::Rule(Rule::new(Head::Empty, body)))
            }
            Some(TokenKind::WeakIf) => {
                self.pos += 1;
                self.parse_weak_constraint()
            }
            Some(TokenKind::Directive(name)) => match name.clone().as_str() {
                "#minimize" => {
                    self.pos += 1;
                    self.parse_optimize(OptimizeKind::Minimize)
                }
                "#maximize" => {
                    self.pos += 1;
                    self.parse_optimize(OptimizeKind::Maximize)
                }
                "#show" => {
                    self.pos += 1;
                    self.parse_show()
                }
                "#const" => {
                    self.pos += 1;
                    let name = self.expect_ident()?;
                    self.expect(&TokenKind::Cmp(CompOp::Eq))?;
                    let value = self.parse_term()?;
                    self.expect(&TokenKind::Dot)?;
                    Ok(StatementKind::Const { name, value })
                }
                "#program" => {
                    self.pos += 1;
                    let name = self.expect_ident()?;
                    let mut params = Vec::new();
                    if self.eat(&TokenKind::LParen) && !self.eat(&TokenKind::RParen) {
                        loop {
                            params.push(self.expect_ident()?);
                            if !self.eat(&TokenKind::Comma) {
                                break;
                            }
                        }
                        self.expect(&TokenKind::RParen)?;
                    }
                    self.expect(&TokenKind::Dot)?;
                    Ok(StatementKind::Program { name, params })
                }
                "#external" => {
                    self.pos += 1;
                    let term = self.parse_term()?;
                    let atom = self.term_to_atom(term)?;
                    let body = if self.eat(&TokenKind::Colon) {
                        self.parse_body()?
                    } else {
                        Vec::new()
                    };
                    self.expect(&TokenKind::Dot)?;
                    Ok(StatementKind::External { atom, body })
                }
                "#false" => {
                    self.pos += 1;
                    let body = if self.eat(&TokenKind::If) {
                        self.parse_body()?
                    } else {
                        Vec::new()
                    };
                    self.expect(&TokenKind::Dot)?;
                    Ok(StatementKind::Rule(Rule::new(Head::Empty, body)))
                }
                other if AggregateFunction::from_directive(other).is_some() => self.parse_rule(),
                _ => self.parse_raw_directive(),
            },
            _ => self.parse_rule(),
        }
    }

    fn parse_rule(&mut self) -> PResult<StatementKind> {
        let head = self.parse_head()?;
        let body = if self.eat(&TokenKind::If) {
            self.parse_body()?
        } else {
            Vec::new()
        };
        self.expect(&TokenKind::Dot)?;
        Ok(StatementKind::Rule(Rule::new(head, body)))
    }

    fn parse_raw_directive(&mut self) -> PResult<StatementKind> {
        let start = self.current_start();
        let name = match self.advance() {
            Some(TokenKind::Directive(name)) => name,
            _ => return Err(self.unexpected("directive")),
        };
        loop {
            match self.advance() {
                Some(TokenKind::Dot) => break,
                Some(_) => {}
                None => return Err(self.unexpected("`.`")),
            }
        }
        let text = self.src[start..self.prev_end()]
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        Ok(StatementKind::Directive { name, text })
    }

    fn parse_weak_constraint(&mut self) -> PResult<StatementKind> {
        let body = self.parse_body()?;
        self.expect(&TokenKind::Dot)?;
        self.expect(&TokenKind::LBracket)?;
        let weight = self.parse_term()?;
        let priority = if self.eat(&TokenKind::At) {
            Some(self.parse_term()?)
        } else {
            None
        };
        let mut terms = Vec::new();
        while self.eat(&TokenKind::Comma) {
            terms.push(self.parse_term()?);
        }
        self.expect(&TokenKind::RBracket)?;
        Ok(StatementKind::WeakConstraint {
            body,
            weight,
            priority,
            terms,
        })
    }

    fn parse_optimize(&mut self, kind: OptimizeKind) -> PResult<StatementKind> {
        self.expect(&TokenKind::LBrace)?;
        let mut elements = Vec::new();
        if !self.check(&TokenKind::RBrace) {
            loop {
                let weight = self.parse_term()?;
                let priority = if self.eat(&TokenKind::At) {
                    Some(self.parse_term()?)
                } else {
                    None
                };
                let mut terms = Vec::new();
                while self.eat(&TokenKind::Comma) {
                    terms.push(self.parse_term()?);
                }
                let condition = if self.eat(&TokenKind::Colon) {
                    self.parse_condition()?
                } else {
                    Vec::new()
                };
                elements.push(OptimizeElement {
                    weight,
                    priority,
                    terms,
                    condition,
                });
                if !self.eat(&TokenKind::Semicolon) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RBrace)?;
        self.expect(&TokenKind::Dot)?;
        Ok(StatementKind::Optimize { kind, elements })
    }

    fn parse_show(&mut self) -> PResult<StatementKind> {
        if self.eat(&TokenKind::Dot) {
            return Ok(StatementKind::ShowAll);
        }
        let classical = self.check(&TokenKind::Minus);
        let offset = usize::from(classical);
        if let (
            Some(TokenKind::Ident(name)),
            Some(TokenKind::Slash),
            Some(TokenKind::Number(arity)),
            Some(TokenKind::Dot),
        ) = (
            self.peek_at(offset),
            self.peek_at(offset + 1),
            self.peek_at(offset + 2),
            self.peek_at(offset + 3),
        ) {
            let name = if classical {
                format!("-{name}")
            } else {
                name.clone()
            };
            let Ok(arity) = usize::try_from(*arity) else {
                return Err(self.error("signature arity must be non-negative"));
            };
            self.pos += offset + 4;
            return Ok(StatementKind::ShowSignature(Signature::new(name, arity)));
        }
        let term = self.parse_term()?;
        let body = if self.eat(&TokenKind::Colon) {
            self.parse_body()?
        } else {
            Vec::new()
        };
        self.expect(&TokenKind::Dot)?;
        Ok(StatementKind::ShowTerm { term, body })
    }

    fn starts_aggregate(&self, n: usize) -> bool {
        match self.peek_at(n) {
            Some(TokenKind::LBrace) => true,
            Some(TokenKind::Directive(name)) => AggregateFunction::from_directive(name).is_some(),
            _ => false,
        }
    }

    fn starts_term(&self) -> bool {
        match self.peek() {
            Some(
                TokenKind::Number(_)
                | TokenKind::Variable(_)
                | TokenKind::Anonymous
                | TokenKind::Ident(_)
                | TokenKind::Str(_)
                | TokenKind::LParen
                | TokenKind::Minus,
            ) => true,
            Some(TokenKind::Directive(name)) => name == "#inf" || name == "#sup",
            _ => false,
        }
    }

    fn parse_left_guard(&mut self) -> PResult<Option<Guard>> {
        if self.starts_aggregate(0) {
            return Ok(None);
        }
        let term = self.parse_term()?;
        let op = match self.peek() {
            Some(TokenKind::Cmp(op)) => {
                let op = *op;
                self.pos += 1;
                op
            }
            _ => CompOp::Le,
        };
        Ok(Some(Guard { op, term }))
    }

    fn parse_right_guard(&mut self) -> PResult<Option<Guard>> {
        if let Some(TokenKind::Cmp(op)) = self.peek() {
            let op = *op;
            self.pos += 1;
            let term = self.parse_term()?;
            return Ok(Some(Guard { op, term }));
        }
        if self.starts_term() {
            let term = self.parse_term()?;
            return Ok(Some(Guard {
                op: CompOp::Le,
                term,
            }));
        }
        Ok(None)
    }

    /// True when the tokens ahead are `[term [op]] {` or `[term [op]] #agg`.
    fn lookahead_aggregate(&self) -> bool {
        if self.starts_aggregate(0) {
            return true;
        }
        let mut depth = 0usize;
        let mut n = 0usize;
        while let Some(kind) = self.peek_at(n) {
            match kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => depth = depth.saturating_sub(1),
                TokenKind::LBrace if depth == 0 => return true,
                TokenKind::Directive(name)
                    if depth == 0 && AggregateFunction::from_directive(name).is_some() =>
                {
                    return true;
                }
                TokenKind::Comma
                | TokenKind::Semicolon
                | TokenKind::Colon
                | TokenKind::If
                | TokenKind::Dot
                | TokenKind::Bar
                    if depth == 0 =>
                {
                    return false;
                }
                _ => {}
            }
            n += 1;
        }
        false
    }

    fn parse_head(&mut self) -> PResult<Head> {
        if self.lookahead_aggregate() {
            let left = self.parse_left_guard()?;
            if self.eat(&TokenKind::LBrace) {
                let elements = self.parse_set_elements(true)?;
                let right = self.parse_right_guard()?;
                return Ok(Head::Choice(SetAggregate {
                    left,
                    elements,
                    right,
                }));
            }
            let function = self.parse_aggregate_function()?;
            self.expect(&TokenKind::LBrace)?;
            let mut elements = Vec::new();
            if !self.check(&TokenKind::RBrace) {
                loop {
                    let terms = self.parse_element_terms()?;
                    self.expect(&TokenKind::Colon)?;
                    let literal = self.parse_head_conditional()?;
                    elements.push(HeadAggregateElement { terms, literal });
                    if !self.eat(&TokenKind::Semicolon) {
                        break;
                    }
                }
            }
            self.expect(&TokenKind::RBrace)?;
            let right = self.parse_right_guard()?;
            return Ok(Head::Aggregate(HeadAggregate {
                left,
                function,
                elements,
                right,
            }));
        }

        let first = self.parse_head_conditional()?;
        if !self.check(&TokenKind::Semicolon) && !self.check(&TokenKind::Bar) {
            if first.condition.is_empty() {
                if let LiteralKind::Atom(atom) = first.literal.kind {
                    return Ok(Head::Atom(atom));
                }
            }
            return Ok(Head::Disjunction(vec![first]));
        }
        let mut elements = vec![first];
        while self.eat(&TokenKind::Semicolon) || self.eat(&TokenKind::Bar) {
            elements.push(self.parse_head_conditional()?);
        }
        Ok(Head::Disjunction(elements))
    }

    /// A positive head atom with an optional `: condition`.
    fn parse_head_conditional(&mut self) -> PResult<ConditionalLiteral> {
        let term = self.parse_term()?;
        let atom = self.term_to_atom(term)?;
        let condition = if self.eat(&TokenKind::Colon) {
            self.parse_condition()?
        } else {
            Vec::new()
        };
        Ok(ConditionalLiteral {
            literal: Literal::positive(atom),
            condition,
        })
    }

    fn parse_aggregate_function(&mut self) -> PResult<AggregateFunction> {
        if let Some(TokenKind::Directive(name)) = self.peek() {
            if let Some(function) = AggregateFunction::from_directive(name) {
                self.pos += 1;
                return Ok(function);
            }
        }
        Err(self.unexpected("aggregate function"))
    }

    fn parse_element_terms(&mut self) -> PResult<Vec<Term>> {
        let mut terms = Vec::new();
        if self.check(&TokenKind::Colon) {
            return Ok(terms);
        }
        loop {
            terms.push(self.parse_term()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Ok(terms)
    }

    /// Elements of `{ ... }` after the opening brace, consuming the closing one.
    fn parse_set_elements(&mut self, head: bool) -> PResult<Vec<ConditionalLiteral>> {
        let mut elements = Vec::new();
        if !self.check(&TokenKind::RBrace) {
            loop {
                let element = if head {
                    self.parse_head_conditional()?
                } else {
                    let literal = self.parse_literal()?;
                    let condition = if self.eat(&TokenKind::Colon) {
                        self.parse_condition()?
                    } else {
                        Vec::new()
                    };
                    ConditionalLiteral { literal, condition }
                };
                elements.push(element);
                if !self.eat(&TokenKind::Semicolon) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(elements)
    }

    fn parse_body(&mut self) -> PResult<Vec<BodyLiteral>> {
        let mut body = Vec::new();
        loop {
            body.push(self.parse_body_literal()?);
            if !(self.eat(&TokenKind::Comma) || self.eat(&TokenKind::Semicolon)) {
                break;
            }
        }
        Ok(body)
    }

    fn parse_sign(&mut self) -> Sign {
        let is_not = |kind: Option<&TokenKind>| matches!(kind, Some(TokenKind::Ident(s)) if s == "not");
        if !is_not(self.peek()) {
            return Sign::Positive;
        }
        self.pos += 1;
        if is_not(self.peek()) {
            self.pos += 1;
            Sign::DoubleNegative
        } else {
            Sign::Negative
        }
    }

    fn parse_body_literal(&mut self) -> PResult<BodyLiteral> {
        let checkpoint = self.pos;
        let sign = self.parse_sign();
        if self.lookahead_aggregate() {
            let left = self.parse_left_guard()?;
            if self.eat(&TokenKind::LBrace) {
                let elements = self.parse_set_elements(false)?;
                let right = self.parse_right_guard()?;
                return Ok(BodyLiteral::SetAggregate {
                    sign,
                    aggregate: SetAggregate {
                        left,
                        elements,
                        right,
                    },
                });
            }
            let function = self.parse_aggregate_function()?;
            self.expect(&TokenKind::LBrace)?;
            let mut elements = Vec::new();
            if !self.check(&TokenKind::RBrace) {
                loop {
                    let terms = self.parse_element_terms()?;
                    let condition = if self.eat(&TokenKind::Colon) {
                        self.parse_condition()?
                    } else {
                        Vec::new()
                    };
                    elements.push(BodyAggregateElement { terms, condition });
                    if !self.eat(&TokenKind::Semicolon) {
                        break;
                    }
                }
            }
            self.expect(&TokenKind::RBrace)?;
            let right = self.parse_right_guard()?;
            return Ok(BodyLiteral::Aggregate {
                sign,
                aggregate: BodyAggregate {
                    left,
                    function,
                    elements,
                    right,
                },
            });
        }

        self.pos = checkpoint;
        let literal = self.parse_literal()?;
        if self.eat(&TokenKind::Colon) {
            let condition = self.parse_condition()?;
            return Ok(BodyLiteral::Conditional(ConditionalLiteral {
                literal,
                condition,
            }));
        }
        Ok(BodyLiteral::Literal(literal))
    }

    fn parse_condition(&mut self) -> PResult<Vec<Literal>> {
        let mut condition = Vec::new();
        loop {
            condition.push(self.parse_literal()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Ok(condition)
    }

    fn parse_literal(&mut self) -> PResult<Literal> {
        let sign = self.parse_sign();
        if let Some(TokenKind::Directive(name)) = self.peek() {
            let value = match name.as_str() {
                "#true" => Some(true),
                "#false" => Some(false),
                _ => None,
            };
            if let Some(value) = value {
                self.pos += 1;
                return Ok(Literal {
                    sign,
                    kind: LiteralKind::Boolean(value),
                });
            }
        }
        let lhs = self.parse_term()?;
        if let Some(TokenKind::Cmp(op)) = self.peek() {
            let op = *op;
            self.pos += 1;
            let rhs = self.parse_term()?;
            return Ok(Literal {
                sign,
                kind: LiteralKind::Comparison { lhs, op, rhs },
            });
        }
        let atom = self.term_to_atom(lhs)?;
        Ok(Literal {
            sign,
            kind: LiteralKind::Atom(atom),
        })
    }

    fn term_to_atom(&self, term: Term) -> PResult<Atom> {
        let shown = term.to_string();
        Atom::from_term(term).ok_or_else(|| {
            let span = self
                .tokens
                .get(self.pos.saturating_sub(1))
                .map(|t| make_span(self.src, t.start, t.end));
            Diagnostic::new("E-PARSE", format!("expected an atom, found `{shown}`"), span)
        })
    }

    fn parse_term(&mut self) -> PResult<Term> {
        let lhs = self.parse_additive()?;
        if self.eat(&TokenKind::DotDot) {
            let rhs = self.parse_additive()?;
            return Ok(Term::Interval(Box::new(lhs), Box::new(rhs)));
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> PResult<Term> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(TokenKind::Plus) => BinOp::Add,
                Some(TokenKind::Minus) => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_multiplicative()?;
            lhs = Term::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> PResult<Term> {
        let mut lhs = self.parse_power()?;
        loop {
            let op = match self.peek() {
                Some(TokenKind::Star) => BinOp::Mul,
                Some(TokenKind::Slash) => BinOp::Div,
                Some(TokenKind::Backslash) => BinOp::Mod,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_power()?;
            lhs = Term::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_power(&mut self) -> PResult<Term> {
        let base = self.parse_unary()?;
        if self.eat(&TokenKind::Power) {
            let exponent = self.parse_power()?;
            return Ok(Term::Binary {
                op: BinOp::Pow,
                lhs: Box::new(base),
                rhs: Box::new(exponent),
            });
        }
        Ok(base)
    }

    fn parse_unary(&mut self) -> PResult<Term> {
        if self.eat(&TokenKind::Minus) {
            let inner = self.parse_unary()?;
            return Ok(match inner {
                Term::Number(n) => Term::Number(-n),
                other => Term::Neg(Box::new(other)),
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> PResult<Term> {
        let Some(kind) = self.peek().cloned() else {
            return Err(self.unexpected("term"));
        };
        match kind {
            TokenKind::Number(n) => {
                self.pos += 1;
                Ok(Term::Number(n))
            }
            TokenKind::Variable(v) => {
                self.pos += 1;
                Ok(Term::Var(v))
            }
            TokenKind::Anonymous => {
                self.pos += 1;
                Ok(Term::Anonymous)
            }
            TokenKind::Str(s) => {
                self.pos += 1;
                Ok(Term::Str(s))
            }
            TokenKind::Directive(name) if name == "#inf" => {
                self.pos += 1;
                Ok(Term::Inf)
            }
            TokenKind::Directive(name) if name == "#sup" => {
                self.pos += 1;
                Ok(Term::Sup)
            }
            TokenKind::Ident(name) => {
                self.pos += 1;
                let mut args = Vec::new();
                if self.eat(&TokenKind::LParen) && !self.eat(&TokenKind::RParen) {
                    loop {
                        args.push(self.parse_term()?);
                        if !self.eat(&TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(&TokenKind::RParen)?;
                }
                Ok(Term::Function { name, args })
            }
            TokenKind::LParen => {
                self.pos += 1;
                if self.eat(&TokenKind::RParen) {
                    return Ok(Term::Tuple(Vec::new()));
                }
                let first = self.parse_term()?;
                if !self.check(&TokenKind::Comma) {
                    self.expect(&TokenKind::RParen)?;
                    return Ok(first);
                }
                let mut items = vec![first];
                while self.eat(&TokenKind::Comma) {
                    if self.check(&TokenKind::RParen) {
                        break;
                    }
                    items.push(self.parse_term()?);
                }
                self.expect(&TokenKind::RParen)?;
                Ok(Term::Tuple(items))
            }
            _ => Err(self.unexpected("term")),
        }
    }
}
