//! Minimal CSS selector support.
//!
//! Covers the subset the site scripts actually use:
//!
//! ```text
//! div  *  #id  .class  [attr]  [attr="v"]  [attr^="v"]
//! a b        (descendant)
//! a > b      (child)
//! a, b       (selector list)
//! ```
//!
//! Matching runs right-to-left against the [`Document`] arena, so a selector
//! evaluated inside a scope may still constrain ancestors outside it (the
//! same rule `Element.querySelectorAll` follows).

use crate::dom::Document;
use crate::types::NodeId;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("unexpected '{found}' at offset {offset} in selector `{selector}`")]
    Unexpected {
        selector: String,
        offset: usize,
        found: char,
    },
    #[error("unexpected end of selector `{0}`")]
    UnexpectedEnd(String),
}

/// A parsed selector list (`a, b, c`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    alternatives: Vec<Complex>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    compounds: Vec<Compound>,
    /// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`.
    combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeMatch>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttributeMatch {
    name: String,
    op: AttributeOp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttributeOp {
    Exists,
    Equals(String),
    Prefix(String),
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        if source.trim().is_empty() {
            return Err(SelectorError::Empty);
        }
        let mut parser = Parser {
            source,
            chars: source.char_indices().collect(),
            pos: 0,
        };
        let mut alternatives = vec![parser.complex()?];
        while parser.eat(',') {
            alternatives.push(parser.complex()?);
        }
        parser.skip_whitespace();
        if let Some(found) = parser.peek() {
            return Err(parser.unexpected(found));
        }
        Ok(Self {
            source: source.to_string(),
            alternatives,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether `node` is matched by any selector in the list.
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.alternatives.iter().any(|c| c.matches(doc, node))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl std::str::FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Complex {
    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.matches_at(doc, self.compounds.len() - 1, node)
    }

    fn matches_at(&self, doc: &Document, idx: usize, node: NodeId) -> bool {
        if !self.compounds[idx].matches(doc, node) {
            return false;
        }
        if idx == 0 {
            return true;
        }
        match self.combinators[idx - 1] {
            Combinator::Child => doc
                .parent(node)
                .is_some_and(|p| self.matches_at(doc, idx - 1, p)),
            Combinator::Descendant => {
                let mut cursor = doc.parent(node);
                while let Some(ancestor) = cursor {
                    if self.matches_at(doc, idx - 1, ancestor) {
                        return true;
                    }
                    cursor = doc.parent(ancestor);
                }
                false
            }
        }
    }
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attributes.is_empty()
    }

    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let el = doc.node(node);
        let tag_ok = match self.tag.as_deref() {
            None | Some("*") => true,
            Some(tag) => el.tag.eq_ignore_ascii_case(tag),
        };
        if !tag_ok {
            return false;
        }
        if self.id.is_some() && el.id != self.id {
            return false;
        }
        if !self.classes.iter().all(|c| el.has_class(c)) {
            return false;
        }
        self.attributes.iter().all(|a| {
            let value = el.attr(&a.name);
            match &a.op {
                AttributeOp::Exists => value.is_some(),
                AttributeOp::Equals(expected) => value == Some(expected.as_str()),
                AttributeOp::Prefix(prefix) => {
                    value.is_some_and(|v| v.starts_with(prefix.as_str()))
                }
            }
        })
    }
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn unexpected(&self, found: char) -> SelectorError {
        SelectorError::Unexpected {
            selector: self.source.to_string(),
            offset: self
                .chars
                .get(self.pos)
                .map(|(i, _)| *i)
                .unwrap_or(self.source.len()),
            found,
        }
    }

    fn end(&self) -> SelectorError {
        SelectorError::UnexpectedEnd(self.source.to_string())
    }

    fn complex(&mut self) -> Result<Complex, SelectorError> {
        self.skip_whitespace();
        let mut compounds = vec![self.compound()?];
        let mut combinators = Vec::new();
        loop {
            let had_space = self.skip_whitespace();
            match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    combinators.push(Combinator::Child);
                }
                Some(_) if had_space => combinators.push(Combinator::Descendant),
                Some(found) => return Err(self.unexpected(found)),
            }
            compounds.push(self.compound()?);
        }
        Ok(Complex {
            compounds,
            combinators,
        })
    }

    fn compound(&mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();
        match self.peek() {
            Some('*') => {
                self.pos += 1;
                compound.tag = Some("*".to_string());
            }
            Some(c) if is_ident_char(c) => compound.tag = Some(self.ident()?.to_ascii_lowercase()),
            _ => {}
        }
        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.id = Some(self.ident()?);
                }
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.ident()?);
                }
                Some('[') => {
                    self.pos += 1;
                    compound.attributes.push(self.attribute()?);
                }
                _ => break,
            }
        }
        if compound.is_empty() {
            return Err(match self.peek() {
                Some(found) => self.unexpected(found),
                None => self.end(),
            });
        }
        Ok(compound)
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        let mut out = String::new();
        while let Some(c) = self.peek().filter(|c| is_ident_char(*c)) {
            out.push(c);
            self.pos += 1;
        }
        if out.is_empty() {
            return Err(match self.peek() {
                Some(found) => self.unexpected(found),
                None => self.end(),
            });
        }
        Ok(out)
    }

    fn attribute(&mut self) -> Result<AttributeMatch, SelectorError> {
        self.skip_whitespace();
        let name = self.ident()?;
        self.skip_whitespace();
        let op = match self.bump() {
            Some(']') => {
                return Ok(AttributeMatch {
                    name,
                    op: AttributeOp::Exists,
                });
            }
            Some('=') => AttributeOp::Equals(self.attribute_value()?),
            Some('^') => match self.bump() {
                Some('=') => AttributeOp::Prefix(self.attribute_value()?),
                Some(found) => {
                    self.pos -= 1;
                    return Err(self.unexpected(found));
                }
                None => return Err(self.end()),
            },
            Some(found) => {
                self.pos -= 1;
                return Err(self.unexpected(found));
            }
            None => return Err(self.end()),
        };
        self.skip_whitespace();
        match self.bump() {
            Some(']') => Ok(AttributeMatch { name, op }),
            Some(found) => {
                self.pos -= 1;
                Err(self.unexpected(found))
            }
            None => Err(self.end()),
        }
    }

    fn attribute_value(&mut self) -> Result<String, SelectorError> {
        self.skip_whitespace();
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let mut out = String::new();
                loop {
                    match self.bump() {
                        Some(c) if c == quote => return Ok(out),
                        Some(c) => out.push(c),
                        None => return Err(self.end()),
                    }
                }
            }
            _ => self.ident(),
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    #[test]
    fn parse_rejects_empty() {
        assert_eq!(Selector::parse("  "), Err(SelectorError::Empty));
    }

    #[test]
    fn parse_rejects_dangling_combinator() {
        assert!(matches!(
            Selector::parse(".a >"),
            Err(SelectorError::UnexpectedEnd(_))
        ));
    }

    #[test]
    fn parse_rejects_unknown_syntax() {
        let err = Selector::parse(".a:hover").unwrap_err();
        assert!(matches!(err, SelectorError::Unexpected { found: ':', offset: 2, .. }));
    }

    #[test]
    fn parse_rejects_unterminated_attribute() {
        assert!(Selector::parse("button[type=\"submit\"").is_err());
        assert!(Selector::parse("a[href^]").is_err());
    }

    #[test]
    fn display_round_trips_source() {
        let sel = Selector::parse(".hero-section .scroll-animate").unwrap();
        assert_eq!(sel.to_string(), ".hero-section .scroll-animate");
    }

    #[test]
    fn class_and_descendant_matching() {
        let doc = landing_page();
        let hero_items = doc.query_all(".hero-section .scroll-animate").unwrap();
        assert_eq!(ids_of(&doc, &hero_items), vec!["heroTitle"]);
    }

    #[test]
    fn child_combinator_skips_nested_links() {
        let doc = landing_page();
        let top = doc
            .query_all(".navbar-nav > .nav-item > .nav-link")
            .unwrap();
        let all = doc.query_all(".navbar-nav .nav-link").unwrap();
        assert_eq!(top.len(), 6);
        // The dropdown item under "services" is only a descendant.
        assert_eq!(all.len(), 7);
    }

    #[test]
    fn selector_list_preserves_document_order() {
        let doc = landing_page();
        let found = doc.query_all(".timeline-item, .achievement-card").unwrap();
        let ids = ids_of(&doc, &found);
        assert_eq!(ids, vec!["cardProjects", "cardSatisfaction", "timeline2019"]);
    }

    #[test]
    fn attribute_operators() {
        let doc = landing_page();
        assert_eq!(doc.query_all("button[type=\"submit\"]").unwrap().len(), 1);
        assert_eq!(doc.query_all("[data-target]").unwrap().len(), 2);
        assert_eq!(doc.query_all("a[href^='#']").unwrap().len(), 1);
    }

    #[test]
    fn tag_match_is_case_insensitive() {
        let doc = landing_page();
        let spans = doc.query_all("SPAN").unwrap();
        assert!(!spans.is_empty());
    }
}
