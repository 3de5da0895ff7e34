use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Name(String),
    Str(String),
    Int(i64),
    Float(f64),

    LBrace,   // {
    RBrace,   // }
    LParen,   // (
    RParen,   // )
    LBracket, // [
    RBracket, // ]
    Colon,    // :
    Eq,       // =
    At,       // @
    Bang,     // !
    Amp,      // &
    Pipe,     // |
    Dollar,   // $
    Spread,   // ...

    Eof,
}

#[derive(Debug, thiserror::Error)]
pub enum LexError {
    #[error("Unexpected character: {0:?}")]
    UnexpectedChar(char),
    #[error("Unterminated string")]
    UnterminatedString,
    #[error("Invalid escape sequence: \\{0}")]
    InvalidEscape(String),
    #[error("Invalid number: {0}")]
    InvalidNumber(String),
}

/// Tokenizer for the GraphQL SDL subset used by subgraph schemas.
///
/// Commas are insignificant, as in GraphQL, and are skipped along with
/// whitespace and `#` comments.
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
        }
    }

    fn skip_ignored(&mut self) {
        loop {
            match self.chars.peek() {
                Some(&c) if c.is_whitespace() || c == ',' || c == '\u{feff}' => {
                    self.chars.next();
                }
                Some('#') => {
                    while let Some(&c) = self.chars.peek() {
                        self.chars.next();
                        if c == '\n' || c == '\r' {
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn read_name(&mut self, first: char) -> String {
        let mut s = String::from(first);
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                s.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        s
    }

    fn read_unicode_escape(&mut self) -> Result<char, LexError> {
        let mut hex = String::with_capacity(4);
        for _ in 0..4 {
            match self.chars.next() {
                Some(c) if c.is_ascii_hexdigit() => hex.push(c),
                Some(c) => {
                    hex.push(c);
                    return Err(LexError::InvalidEscape(format!("u{}", hex)));
                }
                None => return Err(LexError::UnterminatedString),
            }
        }
        u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| LexError::InvalidEscape(format!("u{}", hex)))
    }

    fn read_string(&mut self) -> Result<String, LexError> {
        let mut s = String::new();
        loop {
            match self.chars.next() {
                Some('"') => return Ok(s),
                Some('\\') => match self.chars.next() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some('r') => s.push('\r'),
                    Some('b') => s.push('\u{8}'),
                    Some('f') => s.push('\u{c}'),
                    Some('u') => s.push(self.read_unicode_escape()?),
                    Some(c @ ('"' | '\\' | '/')) => s.push(c),
                    Some(c) => return Err(LexError::InvalidEscape(c.to_string())),
                    None => return Err(LexError::UnterminatedString),
                },
                Some('\n') | None => return Err(LexError::UnterminatedString),
                Some(c) => s.push(c),
            }
        }
    }

    /// Reads the body of a `"""` block string; the opening quotes are consumed.
    fn read_block_string(&mut self) -> Result<String, LexError> {
        let mut s = String::new();
        let mut quotes = 0;
        loop {
            match self.chars.next() {
                Some('"') => {
                    quotes += 1;
                    if quotes == 3 {
                        return Ok(s);
                    }
                }
                Some('\\') if self.chars.peek() == Some(&'"') => {
                    s.extend(std::iter::repeat_n('"', quotes));
                    quotes = 0;
                    // \""" is the only escape in a block string
                    let mut escaped = 0;
                    while escaped < 3 && self.chars.peek() == Some(&'"') {
                        self.chars.next();
                        escaped += 1;
                    }
                    if escaped < 3 {
                        s.push('\\');
                    }
                    s.extend(std::iter::repeat_n('"', escaped));
                }
                Some(c) => {
                    s.extend(std::iter::repeat_n('"', quotes));
                    quotes = 0;
                    s.push(c);
                }
                None => return Err(LexError::UnterminatedString),
            }
        }
    }

    fn read_number(&mut self, first: char) -> Result<Token, LexError> {
        let mut s = String::from(first);
        let mut is_float = false;
        while let Some(&c) = self.chars.peek() {
            match c {
                '0'..='9' => {}
                '.' | 'e' | 'E' => is_float = true,
                '+' | '-' if s.ends_with(['e', 'E']) => {}
                _ => break,
            }
            s.push(c);
            self.chars.next();
        }
        if is_float {
            s.parse().map(Token::Float).map_err(|_| LexError::InvalidNumber(s))
        } else {
            s.parse().map(Token::Int).map_err(|_| LexError::InvalidNumber(s))
        }
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_ignored();

        let c = match self.chars.next() {
            Some(c) => c,
            None => return Ok(Token::Eof),
        };

        let tok = match c {
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            ':' => Token::Colon,
            '=' => Token::Eq,
            '@' => Token::At,
            '!' => Token::Bang,
            '&' => Token::Amp,
            '|' => Token::Pipe,
            '$' => Token::Dollar,
            '.' => {
                for _ in 0..2 {
                    if self.chars.next() != Some('.') {
                        return Err(LexError::UnexpectedChar('.'));
                    }
                }
                Token::Spread
            }
            '"' => {
                if self.chars.peek() == Some(&'"') {
                    self.chars.next();
                    if self.chars.peek() == Some(&'"') {
                        self.chars.next();
                        Token::Str(self.read_block_string()?)
                    } else {
                        // ""
                        Token::Str(String::new())
                    }
                } else {
                    Token::Str(self.read_string()?)
                }
            }
            '-' if self.chars.peek().is_some_and(|c| c.is_ascii_digit()) => {
                self.read_number(c)?
            }
            c if c.is_ascii_digit() => self.read_number(c)?,
            c if c.is_ascii_alphabetic() || c == '_' => Token::Name(self.read_name(c)),
            _ => return Err(LexError::UnexpectedChar(c)),
        };

        Ok(tok)
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            if tok == Token::Eof {
                tokens.push(tok);
                break;
            }
            tokens.push(tok);
        }
        Ok(tokens)
    }
}
