//! Tokenizer for construct bodies.

use std::fmt;

/// A lexical token of the expression language.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    /// String literal with outer quotes removed and escapes applied.
    Str(String),
    Int(i64),
    Float(f64),
    /// `$name`
    Var(&'a str),
    Ident(&'a str),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Arrow,
    DoubleColon,
    Question,
    Colon,
    Coalesce,
    Or,
    And,
    Bang,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Tilde,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eof,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Token::Str(s) => return write!(f, "string {:?}", s),
            Token::Int(n) => return write!(f, "number {}", n),
            Token::Float(n) => return write!(f, "number {}", n),
            Token::Var(name) => return write!(f, "${}", name),
            Token::Ident(name) => return write!(f, "'{}'", name),
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::Comma => ",",
            Token::Dot => ".",
            Token::Arrow => "->",
            Token::DoubleColon => "::",
            Token::Question => "?",
            Token::Colon => ":",
            Token::Coalesce => "??",
            Token::Or => "||",
            Token::And => "&&",
            Token::Bang => "!",
            Token::Eq => "==",
            Token::Ne => "!=",
            Token::Lt => "<",
            Token::Le => "<=",
            Token::Gt => ">",
            Token::Ge => ">=",
            Token::Tilde => "~",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Eof => return f.write_str("end of expression"),
        };
        write!(f, "'{}'", symbol)
    }
}

/// Lexing or parsing failure at a byte offset of the construct body.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxError {
    pub offset: usize,
    pub message: String,
}

impl SyntaxError {
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

/// Splits an expression into tokens, each paired with its byte offset.
///
/// The returned list always ends with [`Token::Eof`].
pub fn tokenize(source: &str) -> Result<Vec<(Token<'_>, usize)>, SyntaxError> {
    let mut lexer = Lexer { source, pos: 0 };
    let mut tokens = Vec::new();
    loop {
        lexer.skip_whitespace();
        let start = lexer.pos;
        let token = lexer.next_token()?;
        let done = token == Token::Eof;
        tokens.push((token, start));
        if done {
            return Ok(tokens);
        }
    }
}

struct Lexer<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn next_token(&mut self) -> Result<Token<'a>, SyntaxError> {
        let Some(c) = self.peek() else {
            return Ok(Token::Eof);
        };

        match c {
            '\'' | '"' => return self.string(c),
            '0'..='9' => return self.number(),
            '$' => {
                let start = self.pos;
                self.pos += 1;
                let name = self.identifier();
                if name.is_empty() {
                    return Err(SyntaxError::new(start, "expected a variable name after '$'"));
                }
                return Ok(Token::Var(name));
            }
            c if c == '_' || c.is_alphabetic() => return Ok(Token::Ident(self.identifier())),
            _ => {}
        }

        let rest = self.rest();
        let two = match rest.get(..2) {
            Some("??") => Some(Token::Coalesce),
            Some("||") => Some(Token::Or),
            Some("&&") => Some(Token::And),
            Some("==") => Some(Token::Eq),
            Some("!=") => Some(Token::Ne),
            Some("<=") => Some(Token::Le),
            Some(">=") => Some(Token::Ge),
            Some("->") => Some(Token::Arrow),
            Some("::") => Some(Token::DoubleColon),
            _ => None,
        };
        if let Some(token) = two {
            self.pos += 2;
            return Ok(token);
        }

        let token = match c {
            '(' => Token::LParen,
            ')' => Token::RParen,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            ',' => Token::Comma,
            '.' => Token::Dot,
            '?' => Token::Question,
            ':' => Token::Colon,
            '!' => Token::Bang,
            '<' => Token::Lt,
            '>' => Token::Gt,
            '~' => Token::Tilde,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '%' => Token::Percent,
            _ => {
                return Err(SyntaxError::new(
                    self.pos,
                    format!("unexpected character '{}'", c),
                ))
            }
        };
        self.pos += 1;
        Ok(token)
    }

    fn identifier(&mut self) -> &'a str {
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|&(i, c)| !(c == '_' || c.is_alphanumeric()) || (i == 0 && c.is_ascii_digit()))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn number(&mut self) -> Result<Token<'a>, SyntaxError> {
        let start = self.pos;
        let rest = self.rest();
        let int_len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());

        // A fraction needs a digit after the dot, so `$list.0.name` stays a path.
        let after = &rest[int_len..];
        let frac_len = match after.strip_prefix('.') {
            Some(frac) if frac.starts_with(|c: char| c.is_ascii_digit()) => {
                1 + frac.find(|c: char| !c.is_ascii_digit()).unwrap_or(frac.len())
            }
            _ => 0,
        };

        let literal = &rest[..int_len + frac_len];
        self.pos += literal.len();

        if frac_len == 0 {
            literal
                .parse::<i64>()
                .map(Token::Int)
                .map_err(|_| SyntaxError::new(start, format!("integer {} out of range", literal)))
        } else {
            literal
                .parse::<f64>()
                .map(Token::Float)
                .map_err(|_| SyntaxError::new(start, format!("invalid number {}", literal)))
        }
    }

    /// Reads a quoted string. Only the outer quote pair is stripped; a
    /// backslash escapes the next character.
    fn string(&mut self, quote: char) -> Result<Token<'a>, SyntaxError> {
        let start = self.pos;
        let mut value = String::new();
        let mut chars = self.rest().char_indices().skip(1);

        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, e)) if e == '\\' || e == '\'' || e == '"' => value.push(e),
                    Some((_, e)) => {
                        value.push('\\');
                        value.push(e);
                    }
                    None => break,
                },
                c if c == quote => {
                    self.pos += i + c.len_utf8();
                    return Ok(Token::Str(value));
                }
                c => value.push(c),
            }
        }

        Err(SyntaxError::new(start, "unterminated string literal"))
    }
}
