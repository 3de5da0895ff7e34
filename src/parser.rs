use crate::ast::*;
use crate::lexer::{LexError, Lexer, Token};

/// Deepest nesting of list types and argument values the parser accepts.
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Lex error: {0}")]
    Lex(#[from] LexError),
    #[error("Unexpected token: {0:?}, expected {1}")]
    Unexpected(Token, &'static str),
    #[error("Expected {expected:?}, found {found:?}")]
    Expected { expected: Token, found: Token },
    #[error("Unexpected end of input")]
    UnexpectedEof,
    #[error("Unsupported definition: {0}")]
    Unsupported(String),
    #[error("Nesting deeper than {0} levels")]
    TooDeep(usize),
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(input: &str) -> Result<Self, ParseError> {
        let tokens = Lexer::new(input).tokenize()?;
        Ok(Self { tokens, pos: 0 })
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> &Token {
        let tok = self.tokens.get(self.pos).unwrap_or(&Token::Eof);
        self.pos += 1;
        tok
    }

    fn unexpected(tok: Token, expected: &'static str) -> ParseError {
        match tok {
            Token::Eof => ParseError::UnexpectedEof,
            tok => ParseError::Unexpected(tok, expected),
        }
    }

    fn expect_name(&mut self) -> Result<String, ParseError> {
        match self.advance().clone() {
            Token::Name(s) => Ok(s),
            tok => Err(Self::unexpected(tok, "name")),
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        let tok = self.advance().clone();
        if tok == expected {
            Ok(())
        } else if tok == Token::Eof {
            Err(ParseError::UnexpectedEof)
        } else {
            Err(ParseError::Expected {
                expected,
                found: tok,
            })
        }
    }

    fn check_name(&self, name: &str) -> bool {
        matches!(self.peek(), Token::Name(s) if s == name)
    }

    /// Consumes the token if it is `tok`.
    fn eat(&mut self, tok: &Token) -> bool {
        if self.peek() == tok {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Depth of the next nested list or object.
    fn nested(depth: usize) -> Result<usize, ParseError> {
        if depth >= MAX_DEPTH {
            return Err(ParseError::TooDeep(MAX_DEPTH));
        }
        Ok(depth + 1)
    }

    fn skip_description(&mut self) {
        if matches!(self.peek(), Token::Str(_)) {
            self.advance();
        }
    }

    pub fn parse(&mut self) -> Result<Document, ParseError> {
        let mut definitions = Vec::new();

        loop {
            self.skip_description();
            let keyword = match self.peek().clone() {
                Token::Eof => break,
                Token::Name(keyword) => keyword,
                tok => {
                    return Err(ParseError::Unexpected(
                        tok,
                        "type, interface, enum, or scalar",
                    ));
                }
            };
            self.advance();

            let definition = match keyword.as_str() {
                "type" => Definition::Object(self.parse_object()?),
                "interface" => Definition::Interface(self.parse_interface()?),
                "enum" => Definition::Enum(self.parse_enum()?),
                "scalar" => Definition::Scalar(ScalarType {
                    name: self.expect_name()?,
                    directives: self.parse_directives()?,
                }),
                "schema" | "input" | "union" | "directive" | "extend" => {
                    return Err(ParseError::Unsupported(keyword));
                }
                _ => {
                    return Err(ParseError::Unexpected(
                        Token::Name(keyword),
                        "type, interface, enum, or scalar",
                    ));
                }
            };
            definitions.push(definition);
        }

        Ok(Document { definitions })
    }

    fn parse_object(&mut self) -> Result<ObjectType, ParseError> {
        let name = self.expect_name()?;
        let implements = self.parse_implements()?;
        let directives = self.parse_directives()?;
        let fields = self.parse_fields()?;

        Ok(ObjectType {
            name,
            implements,
            directives,
            fields,
        })
    }

    fn parse_interface(&mut self) -> Result<InterfaceType, ParseError> {
        let name = self.expect_name()?;
        // Interfaces implementing interfaces add nothing to the layout
        self.parse_implements()?;
        let directives = self.parse_directives()?;
        let fields = self.parse_fields()?;

        Ok(InterfaceType {
            name,
            directives,
            fields,
        })
    }

    /// Parse `implements A & B`.
    fn parse_implements(&mut self) -> Result<Vec<String>, ParseError> {
        let mut names = Vec::new();
        if !self.check_name("implements") {
            return Ok(names);
        }
        self.advance();
        self.eat(&Token::Amp);
        names.push(self.expect_name()?);

        while self.eat(&Token::Amp) {
            names.push(self.expect_name()?);
        }
        Ok(names)
    }

    /// Parse an optional `{ field* }` block; a type without one has no fields.
    fn parse_fields(&mut self) -> Result<Vec<Field>, ParseError> {
        let mut fields = Vec::new();
        if !self.eat(&Token::LBrace) {
            return Ok(fields);
        }

        loop {
            self.skip_description();
            if self.eat(&Token::RBrace) {
                break;
            }
            fields.push(self.parse_field()?);
        }

        Ok(fields)
    }

    fn parse_field(&mut self) -> Result<Field, ParseError> {
        let name = self.expect_name()?;
        self.expect(Token::Colon)?;
        let typ = self.parse_type(0)?;
        let directives = self.parse_directives()?;

        Ok(Field {
            name,
            typ,
            directives,
        })
    }

    fn parse_type(&mut self, depth: usize) -> Result<TypeRef, ParseError> {
        let typ = match self.advance().clone() {
            Token::Name(name) => TypeRef::Named(name),
            Token::LBracket => {
                let inner = self.parse_type(Self::nested(depth)?)?;
                self.expect(Token::RBracket)?;
                TypeRef::List(Box::new(inner))
            }
            tok => return Err(Self::unexpected(tok, "type")),
        };

        if self.eat(&Token::Bang) {
            Ok(TypeRef::NonNull(Box::new(typ)))
        } else {
            Ok(typ)
        }
    }

    fn parse_enum(&mut self) -> Result<EnumType, ParseError> {
        let name = self.expect_name()?;
        let directives = self.parse_directives()?;
        let mut values = Vec::new();

        if self.eat(&Token::LBrace) {
            loop {
                self.skip_description();
                if self.eat(&Token::RBrace) {
                    break;
                }
                values.push(self.expect_name()?);
                // Directives on enum values carry nothing for the layout
                self.parse_directives()?;
            }
        }

        Ok(EnumType {
            name,
            directives,
            values,
        })
    }

    fn parse_directives(&mut self) -> Result<Vec<Directive>, ParseError> {
        let mut directives = Vec::new();

        while self.eat(&Token::At) {
            let name = self.expect_name()?;
            let mut arguments = Vec::new();

            if self.eat(&Token::LParen) {
                while !self.eat(&Token::RParen) {
                    arguments.push(self.parse_argument(0)?);
                }
            }

            directives.push(Directive { name, arguments });
        }

        Ok(directives)
    }

    fn parse_argument(&mut self, depth: usize) -> Result<Argument, ParseError> {
        let name = self.expect_name()?;
        self.expect(Token::Colon)?;
        let value = self.parse_value(depth)?;
        Ok(Argument { name, value })
    }

    fn parse_value(&mut self, depth: usize) -> Result<Value, ParseError> {
        match self.advance().clone() {
            Token::Int(n) => Ok(Value::Int(n)),
            Token::Float(f) => Ok(Value::Float(f)),
            Token::Str(s) => Ok(Value::Str(s)),
            Token::Name(s) => Ok(match s.as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                "null" => Value::Null,
                _ => Value::Enum(s),
            }),
            Token::LBracket => {
                let depth = Self::nested(depth)?;
                let mut items = Vec::new();
                while !self.eat(&Token::RBracket) {
                    items.push(self.parse_value(depth)?);
                }
                Ok(Value::List(items))
            }
            Token::LBrace => {
                let depth = Self::nested(depth)?;
                let mut fields = Vec::new();
                while !self.eat(&Token::RBrace) {
                    fields.push(self.parse_argument(depth)?);
                }
                Ok(Value::Object(fields))
            }
            tok => Err(Self::unexpected(tok, "value")),
        }
    }
}

/// Parse schema text into a [`Document`].
pub fn parse_document(input: &str) -> Result<Document, ParseError> {
    Parser::new(input)?.parse()
}
