//! PDF object parser - converts lexer tokens to PDF objects.

use super::lexer::{Lexer, Token};
use crate::error::{PdfError, Result};
use crate::model::objects::{PDFDict, PDFObjRef, PDFObject};

/// Nesting limit for arrays and dictionaries in a single object.
const MAX_NESTING: usize = 512;

/// PDF Parser - parses PDF object syntax.
///
/// Builds objects from the token stream, folding `objid genno R` triples
/// into indirect references.
pub struct PDFParser<'a> {
    lexer: Lexer<'a>,
    /// Lookahead buffer for tokens
    lookahead: Vec<Token>,
    depth: usize,
}

impl<'a> PDFParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            lexer: Lexer::new(data),
            lookahead: Vec::new(),
            depth: 0,
        }
    }

    /// Get remaining unparsed data.
    pub fn remaining(&self) -> &'a [u8] {
        self.lexer.remaining()
    }

    fn next_token(&mut self) -> Result<Option<Token>> {
        if let Some(tok) = self.lookahead.pop() {
            return Ok(Some(tok));
        }
        match self.lexer.next_token() {
            Some(Ok((_, tok))) => Ok(Some(tok)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }

    fn push_back(&mut self, tok: Token) {
        self.lookahead.push(tok);
    }

    /// Parse next PDF object
    pub fn parse_object(&mut self) -> Result<PDFObject> {
        let token = self.next_token()?.ok_or(PdfError::UnexpectedEof)?;
        self.token_to_object(token)
    }

    /// Parse the next token, expecting a keyword.
    pub fn expect_keyword(&mut self, keyword: &[u8]) -> Result<()> {
        match self.next_token()? {
            Some(Token::Keyword(kw)) if kw == keyword => Ok(()),
            Some(other) => Err(PdfError::TokenError {
                pos: self.lexer.token_pos(),
                msg: format!(
                    "expected '{}', got {:?}",
                    String::from_utf8_lossy(keyword),
                    other
                ),
            }),
            None => Err(PdfError::UnexpectedEof),
        }
    }

    fn token_to_object(&mut self, token: Token) -> Result<PDFObject> {
        match token {
            Token::Int(n) => self.int_or_ref(n),
            Token::Real(n) => Ok(PDFObject::Real(n)),
            Token::Bool(b) => Ok(PDFObject::Bool(b)),
            Token::Name(s) => Ok(PDFObject::Name(s)),
            Token::String(s) => Ok(PDFObject::String(s)),
            Token::Keyword(kw) => match kw.as_slice() {
                b"null" => Ok(PDFObject::Null),
                b"[" => self.nested(Self::parse_array),
                b"<<" => self.nested(Self::parse_dict),
                _ => Err(PdfError::TokenError {
                    pos: self.lexer.token_pos(),
                    msg: format!("unexpected keyword: {}", String::from_utf8_lossy(&kw)),
                }),
            },
        }
    }

    /// An integer may start an indirect reference: objid genno R
    fn int_or_ref(&mut self, n: i64) -> Result<PDFObject> {
        let Some(tok2) = self.next_token()? else {
            return Ok(PDFObject::Int(n));
        };
        let Token::Int(m) = tok2 else {
            self.push_back(tok2);
            return Ok(PDFObject::Int(n));
        };
        match self.next_token()? {
            Some(Token::Keyword(kw)) if kw == b"R" => {
                if let (Ok(objid), Ok(genno)) = (u32::try_from(n), u32::try_from(m)) {
                    return Ok(PDFObject::Ref(PDFObjRef::new(objid, genno)));
                }
                Err(PdfError::TokenError {
                    pos: self.lexer.token_pos(),
                    msg: format!("invalid reference: {} {} R", n, m),
                })
            }
            Some(tok3) => {
                self.push_back(tok3);
                self.push_back(Token::Int(m));
                Ok(PDFObject::Int(n))
            }
            None => {
                self.push_back(Token::Int(m));
                Ok(PDFObject::Int(n))
            }
        }
    }

    fn nested(&mut self, parse: fn(&mut Self) -> Result<PDFObject>) -> Result<PDFObject> {
        if self.depth >= MAX_NESTING {
            return Err(PdfError::SyntaxError("object nesting too deep".into()));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Parse array contents until ]
    fn parse_array(&mut self) -> Result<PDFObject> {
        let mut arr = Vec::new();

        loop {
            let token = self.next_token()?.ok_or(PdfError::UnexpectedEof)?;
            if matches!(&token, Token::Keyword(kw) if kw == b"]") {
                break;
            }
            arr.push(self.token_to_object(token)?);
        }

        Ok(PDFObject::Array(arr))
    }

    /// Parse dict contents until >>
    fn parse_dict(&mut self) -> Result<PDFObject> {
        let mut dict = PDFDict::new();

        loop {
            let token = self.next_token()?.ok_or(PdfError::UnexpectedEof)?;
            let key = match token {
                Token::Keyword(kw) if kw == b">>" => break,
                Token::Name(name) => name,
                other => {
                    return Err(PdfError::TokenError {
                        pos: self.lexer.token_pos(),
                        msg: format!("expected name as dict key, got {:?}", other),
                    });
                }
            };

            let value = self.parse_object()?;
            dict.insert(key, value);
        }

        Ok(PDFObject::Dict(dict))
    }
}
