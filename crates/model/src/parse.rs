//! # Content expression parser
//!
//! Compiles strings like `heading paragraph+ (image|text)*[em strong]` into
//! a list of [`ContentElement`]s.
use crate::content::{ContentElement, Count, MarkRule};
use crate::schema::{AttrSpec, TypeTable};
use displaydoc::Display;
use std::collections::BTreeMap;
use thiserror::Error;

/// {message} in content expression `{expr}`
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub struct SyntaxError {
    /// What went wrong
    pub message: String,
    /// The expression that failed to parse
    pub expr: String,
}

pub(crate) struct Parsed {
    pub elements: Vec<ContentElement>,
    pub inline: bool,
}

fn tokenize(expr: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (i, c) in expr.char_indices() {
        let word = c.is_alphanumeric() || c == '_' || c == '-';
        if word {
            start.get_or_insert(i);
            continue;
        }
        if let Some(s) = start.take() {
            tokens.push(&expr[s..i]);
        }
        if !c.is_whitespace() {
            tokens.push(&expr[i..i + c.len_utf8()]);
        }
    }
    if let Some(s) = start {
        tokens.push(&expr[s..]);
    }
    tokens
}

struct Parser<'a> {
    expr: &'a str,
    tokens: Vec<&'a str>,
    pos: usize,
    table: &'a TypeTable,
    node: &'a str,
    attrs: &'a BTreeMap<String, AttrSpec>,
}

impl<'a> Parser<'a> {
    fn err<M: Into<String>>(&self, message: M) -> SyntaxError {
        SyntaxError {
            message: message.into(),
            expr: self.expr.to_owned(),
        }
    }

    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &str) -> Result<(), SyntaxError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.err(format!("Expected `{}`", token)))
        }
    }

    fn word(&mut self) -> Result<&'a str, SyntaxError> {
        match self.peek() {
            Some(tok) if tok.starts_with(|c: char| c.is_alphanumeric() || c == '_') => {
                self.pos += 1;
                Ok(tok)
            }
            Some(tok) => Err(self.err(format!("Unexpected token `{}`", tok))),
            None => Err(self.err("Unexpected end of expression")),
        }
    }

    fn node_types(&mut self, names: &mut Vec<usize>) -> Result<(), SyntaxError> {
        let name = self.word()?;
        let found = self.table.find_nodes(name);
        if found.is_empty() {
            return Err(self.err(format!("No node type or group `{}` found", name)));
        }
        for t in found {
            if !names.contains(&t) {
                names.push(t);
            }
        }
        Ok(())
    }

    fn marks(&mut self) -> Result<MarkRule, SyntaxError> {
        if !self.eat("[") {
            return Ok(MarkRule::None);
        }
        if self.eat("_") {
            self.expect("]")?;
            return Ok(MarkRule::All);
        }
        let mut marks = Vec::new();
        while !self.eat("]") {
            let name = self.word()?;
            let found = self.table.find_marks(name);
            if found.is_empty() {
                return Err(self.err(format!("Unknown mark type `{}`", name)));
            }
            for m in found {
                if !marks.contains(&m) {
                    marks.push(m);
                }
            }
        }
        Ok(MarkRule::Only(marks))
    }

    fn count(&mut self) -> Result<Count, SyntaxError> {
        if self.eat("@") {
            let name = self.word()?;
            if !self.attrs.contains_key(name) {
                return Err(self.err(format!(
                    "Node type `{}` has no attribute `{}`",
                    self.node, name
                )));
            }
            return Ok(Count::Attr(name.to_owned()));
        }
        let tok = self.word()?;
        tok.parse()
            .map(Count::Literal)
            .map_err(|_| self.err(format!("Expected number, got `{}`", tok)))
    }

    fn quantifier(&mut self) -> Result<Option<(Count, Option<Count>)>, SyntaxError> {
        let quant = if self.eat("?") {
            (Count::Literal(0), Some(Count::Literal(1)))
        } else if self.eat("*") {
            (Count::Literal(0), None)
        } else if self.eat("+") {
            (Count::Literal(1), None)
        } else if self.eat("{") {
            let min = self.count()?;
            let max = if self.eat(",") {
                if self.peek() == Some("}") {
                    None
                } else {
                    Some(self.count()?)
                }
            } else {
                Some(min.clone())
            };
            self.expect("}")?;
            (min, max)
        } else {
            return Ok(None);
        };
        Ok(Some(quant))
    }

    fn element(&mut self) -> Result<ContentElement, SyntaxError> {
        let mut node_types = Vec::new();
        if self.eat("(") {
            self.node_types(&mut node_types)?;
            while self.eat("|") {
                self.node_types(&mut node_types)?;
            }
            self.expect(")")?;
        } else {
            self.node_types(&mut node_types)?;
        }
        let marks = self.marks()?;
        let quant = self.quantifier()?;
        let modulo = if self.eat("%") {
            Some(self.count()?)
        } else {
            None
        };
        let (min, max) = match (quant, &modulo) {
            (Some(q), _) => q,
            (None, Some(_)) => (Count::Literal(1), None),
            (None, None) => (Count::Literal(1), Some(Count::Literal(1))),
        };
        Ok(ContentElement {
            node_types,
            marks,
            min,
            max,
            modulo,
        })
    }

    fn check_overlap(
        &self,
        elements: &[ContentElement],
        elt: &ContentElement,
    ) -> Result<(), SyntaxError> {
        for prev in elements.iter().rev() {
            if !prev.is_fixed() && prev.overlaps(elt) {
                return Err(self.err("Possibly ambiguous overlapping adjacent content expressions"));
            }
            if prev.min != Count::Literal(0) {
                break;
            }
        }
        Ok(())
    }
}

/// Parse a content expression for the node type `node` with the given attributes.
pub(crate) fn parse(
    table: &TypeTable,
    node: &str,
    attrs: &BTreeMap<String, AttrSpec>,
    expr: &str,
) -> Result<Parsed, SyntaxError> {
    let mut parser = Parser {
        expr,
        tokens: tokenize(expr),
        pos: 0,
        table,
        node,
        attrs,
    };

    let mut elements: Vec<ContentElement> = Vec::new();
    while parser.peek().is_some() {
        let elt = parser.element()?;
        parser.check_overlap(&elements, &elt)?;
        elements.push(elt);
    }

    let mut inline = None;
    for t in elements.iter().flat_map(|e| e.node_types.iter()) {
        let is_inline = table.nodes[*t].inline;
        match inline {
            None => inline = Some(is_inline),
            Some(i) if i != is_inline => {
                return Err(parser.err("Mixing inline and block content"));
            }
            _ => {}
        }
    }

    Ok(Parsed {
        elements,
        inline: inline.unwrap_or(false),
    })
}
