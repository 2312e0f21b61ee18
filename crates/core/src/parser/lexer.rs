//! Byte-level tokenizer for PDF object syntax.
//!
//! Produces numbers, names, strings and keywords. Structural delimiters
//! (`[`, `]`, `<<`, `>>`) come out as keywords; the object parser builds
//! containers from them.

use crate::error::{PdfError, Result};

/// Lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Integer value
    Int(i64),
    /// Floating point value
    Real(f64),
    /// Boolean value
    Bool(bool),
    /// Name (e.g., /AcroForm), without the slash
    Name(String),
    /// Keyword or delimiter (e.g., obj, R, null, <<)
    Keyword(Vec<u8>),
    /// String (literal or hex), raw bytes
    String(Vec<u8>),
}

pub struct Lexer<'a> {
    data: &'a [u8],
    pos: usize,
    /// Start of the token most recently returned
    token_pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            token_pos: 0,
        }
    }

    /// Start position of the last token
    pub fn token_pos(&self) -> usize {
        self.token_pos
    }

    /// Get remaining unparsed data
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.data.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    pub(crate) fn is_whitespace(b: u8) -> bool {
        matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b'\x00' | b'\x0c')
    }

    fn is_delimiter(b: u8) -> bool {
        matches!(
            b,
            b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
        )
    }

    /// Skip whitespace and comments
    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if Self::is_whitespace(b) {
                self.advance();
            } else if b == b'%' {
                while let Some(c) = self.advance() {
                    if c == b'\r' || c == b'\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    /// Parse a name (/Name), decoding `#xx` escapes.
    fn parse_name(&mut self) -> Token {
        self.advance();
        let mut name = Vec::new();

        while let Some(b) = self.peek() {
            if Self::is_whitespace(b) || Self::is_delimiter(b) {
                break;
            }
            self.advance();
            if b == b'#' {
                let digits = (self.peek(), self.peek_at(1));
                if let (Some(h), Some(l)) = digits
                    && let (Some(h), Some(l)) = (hex_digit(h), hex_digit(l))
                {
                    self.pos += 2;
                    name.push((h << 4) | l);
                }
                // A malformed escape drops the '#' and keeps what follows.
                continue;
            }
            name.push(b);
        }

        Token::Name(String::from_utf8_lossy(&name).into_owned())
    }

    /// Parse a number (integer or real)
    fn parse_number(&mut self) -> Result<Token> {
        let start = self.pos;
        let mut has_dot = false;

        if matches!(self.peek(), Some(b'+') | Some(b'-')) {
            self.advance();
        }

        while let Some(b) = self.peek() {
            if b.is_ascii_digit() {
                self.advance();
            } else if b == b'.' && !has_dot {
                has_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        // Text is ASCII by construction.
        let s = String::from_utf8_lossy(&self.data[start..self.pos]);

        if has_dot {
            let text = match s.as_ref() {
                "." | "+." | "-." => "0",
                other => other,
            };
            text.parse::<f64>()
                .map(Token::Real)
                .map_err(|_| PdfError::TokenError {
                    pos: start,
                    msg: format!("invalid real: {}", s),
                })
        } else {
            s.parse::<i64>()
                .map(Token::Int)
                .map_err(|_| PdfError::TokenError {
                    pos: start,
                    msg: format!("invalid int: {}", s),
                })
        }
    }

    /// Parse a literal string (...)
    fn parse_string(&mut self) -> Result<Token> {
        self.advance();
        let mut result = Vec::new();
        let mut depth = 1;

        while depth > 0 {
            match self.advance() {
                Some(b'(') => {
                    depth += 1;
                    result.push(b'(');
                }
                Some(b')') => {
                    depth -= 1;
                    if depth > 0 {
                        result.push(b')');
                    }
                }
                Some(b'\\') => match self.advance() {
                    Some(b'n') => result.push(b'\n'),
                    Some(b'r') => result.push(b'\r'),
                    Some(b't') => result.push(b'\t'),
                    Some(b'b') => result.push(0x08),
                    Some(b'f') => result.push(0x0c),
                    Some(b'\r') => {
                        // Line continuation
                        if self.peek() == Some(b'\n') {
                            self.advance();
                        }
                    }
                    Some(b'\n') => {}
                    Some(c @ b'0'..=b'7') => {
                        let mut octal = u32::from(c - b'0');
                        for _ in 0..2 {
                            match self.peek() {
                                Some(d @ b'0'..=b'7') => {
                                    self.advance();
                                    octal = octal * 8 + u32::from(d - b'0');
                                }
                                _ => break,
                            }
                        }
                        result.push((octal & 0xFF) as u8);
                    }
                    // Covers \( \) \\ and unknown escapes alike.
                    Some(c) => result.push(c),
                    None => return Err(PdfError::UnexpectedEof),
                },
                Some(c) => result.push(c),
                None => return Err(PdfError::UnexpectedEof),
            }
        }

        Ok(Token::String(result))
    }

    /// Parse a hex string <...>
    fn parse_hex_string(&mut self) -> Result<Token> {
        self.advance();
        let mut nibbles = Vec::new();

        loop {
            match self.advance() {
                Some(b'>') => break,
                Some(c) => {
                    if let Some(n) = hex_digit(c) {
                        nibbles.push(n);
                    }
                }
                None => return Err(PdfError::UnexpectedEof),
            }
        }

        // An odd final nibble is padded with zero.
        let bytes = nibbles
            .chunks(2)
            .map(|pair| (pair[0] << 4) | pair.get(1).copied().unwrap_or(0))
            .collect();
        Ok(Token::String(bytes))
    }

    /// Parse a keyword
    fn parse_keyword(&mut self) -> Token {
        let start = self.pos;

        while let Some(b) = self.peek() {
            if Self::is_whitespace(b) || Self::is_delimiter(b) {
                break;
            }
            self.advance();
        }
        // Stray delimiters still make progress.
        if self.pos == start {
            self.advance();
        }

        match &self.data[start..self.pos] {
            b"true" => Token::Bool(true),
            b"false" => Token::Bool(false),
            keyword => Token::Keyword(keyword.to_vec()),
        }
    }

    /// Get next token together with its start offset.
    pub fn next_token(&mut self) -> Option<Result<(usize, Token)>> {
        self.skip_whitespace();

        if self.at_end() {
            return None;
        }

        self.token_pos = self.pos;
        let b = self.peek()?;

        let result = match b {
            b'/' => Ok(self.parse_name()),
            b'(' => self.parse_string(),
            b'<' if self.peek_at(1) == Some(b'<') => {
                self.pos += 2;
                Ok(Token::Keyword(b"<<".to_vec()))
            }
            b'<' => self.parse_hex_string(),
            b'>' if self.peek_at(1) == Some(b'>') => {
                self.pos += 2;
                Ok(Token::Keyword(b">>".to_vec()))
            }
            b'[' | b']' | b'{' | b'}' | b'>' | b')' => {
                self.advance();
                Ok(Token::Keyword(vec![b]))
            }
            b'+' | b'-' | b'.'
                if matches!(self.peek_at(1), Some(c) if c.is_ascii_digit() || c == b'.') =>
            {
                self.parse_number()
            }
            c if c.is_ascii_digit() => self.parse_number(),
            _ => Ok(self.parse_keyword()),
        };

        Some(result.map(|token| (self.token_pos, token)))
    }
}

fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(data: &[u8]) -> Vec<Token> {
        let mut lexer = Lexer::new(data);
        let mut out = Vec::new();
        while let Some(tok) = lexer.next_token() {
            out.push(tok.unwrap().1);
        }
        out
    }

    #[test]
    fn test_numbers_and_keywords() {
        assert_eq!(
            tokens(b"12 0 obj -3 +.5 4. endobj"),
            vec![
                Token::Int(12),
                Token::Int(0),
                Token::Keyword(b"obj".to_vec()),
                Token::Int(-3),
                Token::Real(0.5),
                Token::Real(4.0),
                Token::Keyword(b"endobj".to_vec()),
            ]
        );
    }

    #[test]
    fn test_names_decode_hex_escapes() {
        assert_eq!(
            tokens(b"/First#20Name/AcroForm"),
            vec![
                Token::Name("First Name".into()),
                Token::Name("AcroForm".into())
            ]
        );
    }

    #[test]
    fn test_literal_strings_handle_escapes_and_nesting() {
        assert_eq!(
            tokens(br"(a\(b\) (nested) \101\n)"),
            vec![Token::String(b"a(b) (nested) A\n".to_vec())]
        );
    }

    #[test]
    fn test_hex_strings_pad_odd_nibble() {
        assert_eq!(
            tokens(b"<48 65 6c6C6f> <7>"),
            vec![Token::String(b"Hello".to_vec()), Token::String(vec![0x70])]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            tokens(b"%PDF-1.7\n%\xe2\xe3\n true"),
            vec![Token::Bool(true)]
        );
    }

    #[test]
    fn test_unterminated_string_is_eof() {
        let mut lexer = Lexer::new(b"(abc");
        assert!(matches!(
            lexer.next_token(),
            Some(Err(PdfError::UnexpectedEof))
        ));
    }
}
