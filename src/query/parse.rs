//! Query text parsing
//!
//! The grammar is a small SQL subset. Keywords are case-insensitive,
//! string literals accept single or double quotes with quote doubling
//! or backslash escapes, and a WHERE clause holds at most one AND/OR.

use thiserror::Error;

use super::ast::{
    Assignment, Condition, Delete, Filter, Insert, Literal, OrderKey, Projection, Select,
    Statement, Test, Update,
};
use crate::syntax::is_key;

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("unexpected end of query, expected {0}")]
    UnexpectedEnd(String),
    #[error("expected {expected}, found '{found}'")]
    Unexpected { expected: String, found: String },
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("invalid field name '{0}'")]
    InvalidField(String),
    #[error("LIMIT expects a non-negative integer, found '{0}'")]
    InvalidLimit(String),
}

/// Parses one statement, rejecting trailing input
pub fn parse_query(input: &str) -> Result<Statement, ParseError> {
    let mut parser = Parser::new(lex(input)?);
    let statement = parser.statement()?;
    parser.expect_end()?;
    Ok(statement)
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Word(String),
    Str(String),
    Symbol(char),
}

impl Tok {
    fn describe(&self) -> String {
        match self {
            Tok::Word(w) => w.clone(),
            Tok::Str(s) => format!("'{}'", s),
            Tok::Symbol(c) => c.to_string(),
        }
    }
}

fn lex(input: &str) -> Result<Vec<Tok>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
        } else if ch == '\'' || ch == '"' {
            chars.next();
            tokens.push(Tok::Str(lex_string(&mut chars, ch)?));
        } else if matches!(ch, '=' | '<' | '>' | ',' | '*') {
            chars.next();
            tokens.push(Tok::Symbol(ch));
        } else {
            let mut word = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() || matches!(c, '=' | '<' | '>' | ',' | '*' | '\'' | '"') {
                    break;
                }
                word.push(c);
                chars.next();
            }
            tokens.push(Tok::Word(word));
        }
    }
    Ok(tokens)
}

/// Reads a quoted literal after its opening quote. A doubled quote or a
/// backslash escape embeds the quote character itself.
fn lex_string(
    chars: &mut std::iter::Peekable<std::str::Chars>,
    quote: char,
) -> Result<String, ParseError> {
    let mut text = String::new();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some(escaped) => text.push(escaped),
                None => return Err(ParseError::UnterminatedString),
            }
        } else if ch == quote {
            if chars.peek() == Some(&quote) {
                chars.next();
                text.push(quote);
            } else {
                return Ok(text);
            }
        } else {
            text.push(ch);
        }
    }
    Err(ParseError::UnterminatedString)
}

struct Parser {
    tokens: Vec<Tok>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Tok>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&Tok> {
        let pos = self.pos;
        if pos < self.tokens.len() {
            self.pos += 1;
        }
        self.tokens.get(pos)
    }

    /// True when the next token is the given keyword, without consuming it
    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Tok::Word(w)) if w.eq_ignore_ascii_case(keyword))
    }

    /// Consumes the next token when it is the given keyword
    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), ParseError> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(self.unexpected(keyword))
        }
    }

    fn expect_symbol(&mut self, symbol: char) -> Result<(), ParseError> {
        match self.next() {
            Some(Tok::Symbol(c)) if *c == symbol => Ok(()),
            Some(tok) => Err(ParseError::Unexpected {
                expected: format!("'{}'", symbol),
                found: tok.describe(),
            }),
            None => Err(ParseError::UnexpectedEnd(format!("'{}'", symbol))),
        }
    }

    fn expect_end(&mut self) -> Result<(), ParseError> {
        match self.peek() {
            None => Ok(()),
            Some(tok) => Err(ParseError::Unexpected {
                expected: "end of query".into(),
                found: tok.describe(),
            }),
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(tok) => ParseError::Unexpected {
                expected: expected.into(),
                found: tok.describe(),
            },
            None => ParseError::UnexpectedEnd(expected.into()),
        }
    }

    fn statement(&mut self) -> Result<Statement, ParseError> {
        if self.eat_keyword("SELECT") {
            return Ok(Statement::Select(self.select()?));
        }
        if self.eat_keyword("UPDATE") {
            return Ok(Statement::Update(self.update()?));
        }
        if self.eat_keyword("DELETE") {
            return Ok(Statement::Delete(self.delete()?));
        }
        if self.eat_keyword("INSERT") {
            return Ok(Statement::Insert(self.insert()?));
        }
        Err(self.unexpected("SELECT, UPDATE, DELETE or INSERT"))
    }

    fn select(&mut self) -> Result<Select, ParseError> {
        let projection = self.projection()?;
        self.expect_keyword("FROM")?;
        let file = self.file_name()?;
        let filter = self.optional_filter()?;
        let order = self.optional_order()?;
        let limit = self.optional_limit()?;
        let into = if self.eat_keyword("INTO") {
            Some(self.file_name()?)
        } else {
            None
        };
        Ok(Select {
            projection,
            file,
            filter,
            order,
            limit,
            into,
        })
    }

    fn update(&mut self) -> Result<Update, ParseError> {
        let file = self.file_name()?;
        self.expect_keyword("SET")?;
        let assignments = self.assignments()?;
        let filter = self.optional_filter()?;
        Ok(Update {
            file,
            assignments,
            filter,
        })
    }

    fn delete(&mut self) -> Result<Delete, ParseError> {
        self.expect_keyword("FROM")?;
        let file = self.file_name()?;
        let filter = self.optional_filter()?;
        Ok(Delete { file, filter })
    }

    fn insert(&mut self) -> Result<Insert, ParseError> {
        self.expect_keyword("INTO")?;
        let file = self.file_name()?;
        self.expect_keyword("SET")?;
        let assignments = self.assignments()?;
        Ok(Insert { file, assignments })
    }

    fn projection(&mut self) -> Result<Projection, ParseError> {
        if matches!(self.peek(), Some(Tok::Symbol('*'))) {
            self.pos += 1;
            return Ok(Projection::All);
        }
        let mut fields = vec![self.field_name()?];
        while matches!(self.peek(), Some(Tok::Symbol(','))) {
            self.pos += 1;
            fields.push(self.field_name()?);
        }
        Ok(Projection::Fields(fields))
    }

    /// A field name: a bare identifier, or `parent` for the tree position
    fn field_name(&mut self) -> Result<String, ParseError> {
        match self.next() {
            Some(Tok::Word(w)) => {
                if is_key(w) {
                    Ok(w.clone())
                } else {
                    Err(ParseError::InvalidField(w.clone()))
                }
            }
            Some(tok) => Err(ParseError::Unexpected {
                expected: "a field name".into(),
                found: tok.describe(),
            }),
            None => Err(ParseError::UnexpectedEnd("a field name".into())),
        }
    }

    /// A file path, bare or quoted
    fn file_name(&mut self) -> Result<String, ParseError> {
        match self.next() {
            Some(Tok::Word(w)) => Ok(w.clone()),
            Some(Tok::Str(s)) => Ok(s.clone()),
            Some(tok) => Err(ParseError::Unexpected {
                expected: "a file path".into(),
                found: tok.describe(),
            }),
            None => Err(ParseError::UnexpectedEnd("a file path".into())),
        }
    }

    fn optional_filter(&mut self) -> Result<Option<Filter>, ParseError> {
        if !self.eat_keyword("WHERE") {
            return Ok(None);
        }
        let first = self.condition()?;
        if self.eat_keyword("AND") {
            let second = self.condition()?;
            return Ok(Some(Filter::And(first, second)));
        }
        if self.eat_keyword("OR") {
            let second = self.condition()?;
            return Ok(Some(Filter::Or(first, second)));
        }
        Ok(Some(Filter::Single(first)))
    }

    fn condition(&mut self) -> Result<Condition, ParseError> {
        let field = self.field_name()?;
        let test = if self.eat_keyword("IS") {
            if self.eat_keyword("NOT") {
                self.expect_keyword("NULL")?;
                Test::IsNotNull
            } else {
                self.expect_keyword("NULL")?;
                Test::IsNull
            }
        } else if self.eat_keyword("CONTAINS") {
            Test::Contains(self.literal()?)
        } else {
            match self.next() {
                Some(Tok::Symbol('=')) => Test::Eq(self.literal()?),
                Some(Tok::Symbol('>')) => Test::Gt(self.literal()?),
                Some(Tok::Symbol('<')) => Test::Lt(self.literal()?),
                Some(tok) => {
                    return Err(ParseError::Unexpected {
                        expected: "a comparison operator".into(),
                        found: tok.describe(),
                    })
                }
                None => return Err(ParseError::UnexpectedEnd("a comparison operator".into())),
            }
        };
        Ok(Condition { field, test })
    }

    fn literal(&mut self) -> Result<Literal, ParseError> {
        match self.next() {
            Some(Tok::Str(s)) => Ok(Literal::Str(s.clone())),
            Some(Tok::Word(w)) => {
                if w.eq_ignore_ascii_case("true") {
                    return Ok(Literal::Bool(true));
                }
                if w.eq_ignore_ascii_case("false") {
                    return Ok(Literal::Bool(false));
                }
                if w.eq_ignore_ascii_case("null") {
                    return Ok(Literal::Null);
                }
                match w.parse::<f64>() {
                    Ok(n) if n.is_finite() => Ok(Literal::Num(n)),
                    _ => Err(ParseError::Unexpected {
                        expected: "a literal".into(),
                        found: w.clone(),
                    }),
                }
            }
            Some(tok) => Err(ParseError::Unexpected {
                expected: "a literal".into(),
                found: tok.describe(),
            }),
            None => Err(ParseError::UnexpectedEnd("a literal".into())),
        }
    }

    fn optional_order(&mut self) -> Result<Vec<OrderKey>, ParseError> {
        if !self.eat_keyword("ORDER") {
            return Ok(Vec::new());
        }
        self.expect_keyword("BY")?;
        let mut keys = vec![self.order_key()?];
        while matches!(self.peek(), Some(Tok::Symbol(','))) {
            self.pos += 1;
            keys.push(self.order_key()?);
        }
        Ok(keys)
    }

    fn order_key(&mut self) -> Result<OrderKey, ParseError> {
        let field = self.field_name()?;
        let descending = if self.eat_keyword("DESC") {
            true
        } else {
            self.eat_keyword("ASC");
            false
        };
        Ok(OrderKey { field, descending })
    }

    fn optional_limit(&mut self) -> Result<Option<usize>, ParseError> {
        if !self.eat_keyword("LIMIT") {
            return Ok(None);
        }
        match self.next() {
            Some(Tok::Word(w)) => w
                .parse::<usize>()
                .map(Some)
                .map_err(|_| ParseError::InvalidLimit(w.clone())),
            Some(tok) => Err(ParseError::InvalidLimit(tok.describe())),
            None => Err(ParseError::UnexpectedEnd("a LIMIT count".into())),
        }
    }

    fn assignments(&mut self) -> Result<Vec<Assignment>, ParseError> {
        let mut assignments = vec![self.assignment()?];
        while matches!(self.peek(), Some(Tok::Symbol(','))) {
            self.pos += 1;
            assignments.push(self.assignment()?);
        }
        Ok(assignments)
    }

    fn assignment(&mut self) -> Result<Assignment, ParseError> {
        let field = self.field_name()?;
        self.expect_symbol('=')?;
        let value = self.literal()?;
        Ok(Assignment { field, value })
    }
}
