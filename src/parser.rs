//! Recursive-descent parser for schema source.
//!
//! ```text
//! module       := "module" ID "{" type_decl* "}"
//! type_decl    := ["shared"] ID "=" ( sum_body | product_body )
//! product_body := "(" field_list? ")"
//! sum_body     := constructor ("|" constructor)* [ "(" field_list ")" ]
//! constructor  := ID [ "(" field_list ")" ]
//! field_list   := field ("," field)*
//! field        := type_expr [ "?" | "*" ] ID      -- quantifier only after a simple name
//! type_expr    := ID | ("array" | "maybe") "[" type_expr "]" | "map" "[" type_expr "," type_expr "]"
//! ```
//!
//! Single pass with one token of lookahead. The first violation
//! aborts the parse.
use std::collections::{HashSet, VecDeque};
use std::io::Read;

use crate::ast::{generic_arity, Constructor, Field, Module, Product, Quantifier, Sum, TypeDecl, TypeExpr};
use crate::error::{Error, Position, Result, SyntaxError};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

/// Contextual modifier marking a sum as part of the shared variant namespace.
pub const SHARED: &str = "shared";

/// Read the stream to completion and parse one module from it.
pub fn parse<R: Read>(mut reader: R) -> Result<Module> {
    let mut src = String::new();
    reader.read_to_string(&mut src)?;
    parse_str(&src)
}

pub fn parse_str(src: &str) -> Result<Module> {
    Parser::new(src).parse_module()
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    lookahead: VecDeque<Token>,
}

impl<'a> Parser<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { lexer: Lexer::new(src), lookahead: VecDeque::with_capacity(1) }
    }

    // ------------------------------ Tokens -------------------------------- //

    /// The upcoming token; past the end this keeps answering `Eof`.
    fn peek(&mut self) -> Result<&Token> {
        if self.lookahead.is_empty() {
            if let Some(tok) = self.lexer.next() {
                self.lookahead.push_back(tok?);
            }
        }
        // the lexer always ends on `Eof`, which `bump` never consumes
        Ok(&self.lookahead[0])
    }

    fn peek_kind(&mut self) -> Result<TokenKind> {
        Ok(self.peek()?.kind)
    }

    fn bump(&mut self) -> Result<Token> {
        let tok = self.peek()?.clone();
        if tok.kind != TokenKind::Eof {
            self.lookahead.pop_front();
        }
        Ok(tok)
    }

    fn eat(&mut self, kind: TokenKind) -> Result<bool> {
        if self.peek_kind()? == kind {
            self.bump()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token> {
        if self.peek_kind()? == kind {
            return self.bump();
        }
        let tok = self.peek()?.clone();
        Err(unexpected(&tok, what))
    }

    // ------------------------------ Grammar ------------------------------- //

    pub fn parse_module(mut self) -> Result<Module> {
        self.expect(TokenKind::Module, "`module`")?;
        let name = self.expect(TokenKind::Ident, "module name")?.text;
        self.expect(TokenKind::LBrace, "`{` after module name")?;

        let mut decls = Vec::new();
        while !self.eat(TokenKind::RBrace)? {
            decls.push(self.parse_decl()?);
        }
        self.expect(TokenKind::Eof, "end of input after module")?;
        Ok(Module { name, decls })
    }

    fn parse_decl(&mut self) -> Result<TypeDecl> {
        let first = self.expect(TokenKind::Ident, "type declaration or `}`")?;
        let (shared, name_tok) = if first.text == SHARED && self.peek_kind()? == TokenKind::Ident {
            (true, self.bump()?)
        } else {
            (false, first)
        };
        self.expect(TokenKind::Equals, &format!("`=` after `{}`", name_tok.text))?;
        let pos = name_tok.position();
        let name = name_tok.text;

        let decl = if self.peek_kind()? == TokenKind::LParen {
            if shared {
                return Err(syntax(
                    format!("product `{name}` cannot be shared; only sum types take `{SHARED}`"),
                    pos,
                ));
            }
            self.bump()?;
            let fields = if self.peek_kind()? == TokenKind::RParen {
                Vec::new()
            } else {
                self.parse_field_list()?
            };
            self.expect(TokenKind::RParen, &format!("`,` or `)` in fields of `{name}`"))?;
            TypeDecl::Product(Product { name, fields: strip(fields) })
        } else {
            TypeDecl::Sum(self.parse_sum_body(name, shared)?)
        };
        tracing::trace!(decl = decl.name(), shared, "parsed declaration");
        Ok(decl)
    }

    fn parse_sum_body(&mut self, name: String, shared: bool) -> Result<Sum> {
        let mut variants: Vec<(Position, Constructor)> = vec![self.parse_constructor()?];
        while self.eat(TokenKind::Pipe)? {
            let (pos, variant) = self.parse_constructor()?;
            if variants.iter().any(|(_, v)| v.name == variant.name) {
                return Err(syntax(format!("duplicate variant `{}` in `{name}`", variant.name), pos));
            }
            variants.push((pos, variant));
        }

        let mut common_fields = Vec::new();
        if self.eat(TokenKind::LParen)? {
            common_fields = self.parse_field_list()?;
            self.expect(TokenKind::RParen, &format!("`,` or `)` in common fields of `{name}`"))?;
        }
        for (pos, common) in &common_fields {
            if let Some((_, variant)) = variants.iter().find(|(_, v)| v.fields.iter().any(|f| f.name == common.name)) {
                return Err(syntax(
                    format!("common field `{}` of `{name}` collides with a field of `{}`", common.name, variant.name),
                    *pos,
                ));
            }
        }

        Ok(Sum {
            name,
            variants: strip(variants),
            shared,
            common_fields: strip(common_fields),
        })
    }

    fn parse_constructor(&mut self) -> Result<(Position, Constructor)> {
        let name_tok = self.expect(TokenKind::Ident, "variant name")?;
        let pos = name_tok.position();
        let mut fields = Vec::new();
        if self.eat(TokenKind::LParen)? {
            fields = strip(self.parse_field_list()?);
            self.expect(TokenKind::RParen, &format!("`,` or `)` in fields of `{}`", name_tok.text))?;
        }
        Ok((pos, Constructor { name: name_tok.text, fields }))
    }

    fn parse_field_list(&mut self) -> Result<Vec<(Position, Field)>> {
        let mut fields: Vec<(Position, Field)> = Vec::new();
        let mut seen = HashSet::new();
        loop {
            let (pos, field) = self.parse_field()?;
            if !seen.insert(field.name.clone()) {
                return Err(syntax(format!("duplicate field `{}`", field.name), pos));
            }
            fields.push((pos, field));
            if !self.eat(TokenKind::Comma)? {
                return Ok(fields);
            }
        }
    }

    fn parse_field(&mut self) -> Result<(Position, Field)> {
        let ty = self.parse_type_expr("field type")?;
        let quantifier = match ty {
            TypeExpr::Named(_) => match self.peek_kind()? {
                TokenKind::Question => { self.bump()?; Quantifier::Optional }
                TokenKind::Star => { self.bump()?; Quantifier::Repeated }
                _ => Quantifier::One,
            },
            _ => Quantifier::One,
        };
        let name = self.expect(TokenKind::Ident, &format!("field name after `{ty}`"))?;
        let pos = name.position();
        Ok((pos, Field::normalized(ty, quantifier, name.text)))
    }

    fn parse_type_expr(&mut self, what: &str) -> Result<TypeExpr> {
        let head = self.expect(TokenKind::Ident, what)?;
        let Some(arity) = generic_arity(&head.text) else {
            if self.peek_kind()? == TokenKind::LBracket {
                let pos = self.peek()?.position();
                return Err(syntax(
                    format!("`{}` takes no type arguments; only array, map and maybe do", head.text),
                    pos,
                ));
            }
            return Ok(TypeExpr::Named(head.text));
        };

        self.expect(TokenKind::LBracket, &format!("`[` after `{}`", head.text))?;
        let mut args = vec![self.parse_type_expr("type argument")?];
        while args.len() < arity {
            self.expect(TokenKind::Comma, &format!("`,` (`{}` takes {arity} type arguments)", head.text))?;
            args.push(self.parse_type_expr("type argument")?);
        }
        self.expect(TokenKind::RBracket, &format!("`]` closing `{}`", head.text))?;
        TypeExpr::new(&head.text, args).map_err(|e| syntax(e.to_string(), head.position()))
    }
}

// ------------------------------ Helpers ----------------------------------- //

fn syntax(message: String, pos: Position) -> Error {
    Error::Syntax(SyntaxError::new(message, pos))
}

fn unexpected(tok: &Token, what: &str) -> Error {
    syntax(format!("expected {what}, found {tok}"), tok.position())
}

fn strip<T>(items: Vec<(Position, T)>) -> Vec<T> {
    items.into_iter().map(|(_, item)| item).collect()
}

// ------------------------------- Tests ------------------------------------ //
