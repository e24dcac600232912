//! Lexer for PEG grammar syntax
//!
//! Converts grammar text into a stream of tokens, skipping whitespace and
//! comments (`# ...` to end of line, and nestable `/* ... */`).

use crate::ast::Mode;
use crate::charclass::hex_to_char;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Ident(String),
    Arrow(Mode), // <-  <=  <:
    Literal { text: String, case_insensitive: bool },
    CharClass(String), // Raw content between [ and ], escapes not yet decoded
    PreParsed(String), // <name>
    Pipe,
    LParen,
    RParen,
    Star,
    Plus,
    Question,
    Colon,
    Bang,
    Amp,
    Dot,
    Eof,
}

pub struct Lexer {
    input: Vec<char>,
    pos: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, String> {
        let mut tokens = Vec::new();

        while self.pos < self.input.len() {
            self.skip_whitespace_and_comments()?;

            if self.pos >= self.input.len() {
                break;
            }

            let token = self.next_token()?;
            tokens.push(token);
        }

        tokens.push(Token::Eof);
        Ok(tokens)
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), String> {
        loop {
            while self.peek().is_some_and(char::is_whitespace) {
                self.pos += 1;
            }

            match (self.peek(), self.peek_at(1)) {
                (Some('#'), _) => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.pos += 1;
                    }
                }
                (Some('/'), Some('*')) => self.skip_block_comment()?,
                _ => break,
            }
        }
        Ok(())
    }

    fn skip_block_comment(&mut self) -> Result<(), String> {
        self.pos += 2; // consume "/*"
        let mut depth = 1;

        while depth > 0 {
            match (self.peek(), self.peek_at(1)) {
                (Some('/'), Some('*')) => {
                    depth += 1;
                    self.pos += 2;
                }
                (Some('*'), Some('/')) => {
                    depth -= 1;
                    self.pos += 2;
                }
                (Some(_), _) => self.pos += 1,
                (None, _) => return Err("Unclosed comment".to_string()),
            }
        }

        Ok(())
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn single(&mut self, token: Token) -> Result<Token, String> {
        self.advance();
        Ok(token)
    }

    fn next_token(&mut self) -> Result<Token, String> {
        match self.peek() {
            Some('\'') => self.read_literal('\'', false),
            Some('"') => self.read_literal('"', true),
            Some('[') => self.read_char_class(),
            Some('<') => self.read_angle(),
            Some('|') => self.single(Token::Pipe),
            Some('(') => self.single(Token::LParen),
            Some(')') => self.single(Token::RParen),
            Some('*') => self.single(Token::Star),
            Some('+') => self.single(Token::Plus),
            Some('?') => self.single(Token::Question),
            Some(':') => self.single(Token::Colon),
            Some('!') => self.single(Token::Bang),
            Some('&') => self.single(Token::Amp),
            Some('.') => self.single(Token::Dot),
            Some(']') => Err("Unexpected ] outside character class".to_string()),
            Some(ch) if ch.is_alphabetic() || ch == '_' => Ok(Token::Ident(self.read_name(false))),
            Some(ch) => Err(format!("Unexpected character: {}", ch)),
            None => Err("Unexpected end of input".to_string()),
        }
    }

    /// Either a definition arrow or a pre-parsed token reference
    fn read_angle(&mut self) -> Result<Token, String> {
        let mode = match self.peek_at(1) {
            Some('-') => Some(Mode::Normal),
            Some('=') => Some(Mode::Prune),
            Some(':') => Some(Mode::Void),
            _ => None,
        };
        if let Some(mode) = mode {
            self.pos += 2;
            return Ok(Token::Arrow(mode));
        }

        self.advance(); // skip '<'
        let name = self.read_name(true);
        if name.is_empty() {
            return Err("Expected element name after '<'".to_string());
        }
        match self.advance() {
            Some('>') => Ok(Token::PreParsed(name)),
            _ => Err(format!("Unterminated element reference <{}", name)),
        }
    }

    /// Identifier characters; element names in `<...>` may also contain `.`
    fn read_name(&mut self, allow_dot: bool) -> String {
        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' || ch == '-' || (allow_dot && ch == '.') {
                name.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        name
    }

    fn read_escape(&mut self) -> Result<char, String> {
        match self.advance() {
            Some('n') => Ok('\n'),
            Some('r') => Ok('\r'),
            Some('t') => Ok('\t'),
            Some('u') => {
                if self.advance() != Some('{') {
                    return Err("Expected '{' after \\u".to_string());
                }
                let mut hex = String::new();
                loop {
                    match self.advance() {
                        Some('}') => break,
                        Some(h) => hex.push(h),
                        None => return Err("Unterminated \\u{...} escape".to_string()),
                    }
                }
                hex_to_char(&hex)
            }
            Some(ch @ ('\\' | '\'' | '"' | '[' | ']' | '-')) => Ok(ch),
            Some(ch) => Err(format!("Unknown escape \\{}", ch)),
            None => Err("Dangling escape at end of input".to_string()),
        }
    }

    fn read_literal(&mut self, quote: char, case_insensitive: bool) -> Result<Token, String> {
        self.advance(); // skip opening quote
        let mut text = String::new();

        while let Some(ch) = self.advance() {
            if ch == quote {
                return Ok(Token::Literal {
                    text,
                    case_insensitive,
                });
            }
            if ch == '\\' {
                text.push(self.read_escape()?);
            } else {
                text.push(ch);
            }
        }

        Err("Unterminated literal".to_string())
    }

    fn read_char_class(&mut self) -> Result<Token, String> {
        self.advance(); // skip opening bracket
        let mut content = String::new();

        while let Some(ch) = self.advance() {
            match ch {
                ']' => return Ok(Token::CharClass(content)),
                '\\' => {
                    content.push(ch);
                    if let Some(escaped) = self.advance() {
                        content.push(escaped);
                    }
                }
                _ => content.push(ch),
            }
        }

        Err("Unterminated character class".to_string())
    }
}
