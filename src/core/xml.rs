//! Minimal owned element tree over `quick-xml` events.
//!
//! Element names are stored by local name only, so lookups behave the same
//! whether or not a document declares the NF-e namespace
//! (`http://www.portalfiscal.inf.br/nfe`) or uses a prefix for it.

use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum XmlError {
    #[error("{0}")]
    Syntax(#[from] quick_xml::Error),

    #[error("{0}")]
    Attribute(#[from] AttrError),

    #[error("{0}")]
    Escape(#[from] quick_xml::escape::EscapeError),

    #[error("document is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("{0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub name: String,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Trimmed text content; `None` when the element has no non-blank text.
    pub fn text(&self) -> Option<&str> {
        let text = self.text.trim();
        (!text.is_empty()).then_some(text)
    }

    /// First direct child with the given local name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(Element::text)
    }

    /// First element below this one (depth-first, document order) with the
    /// given local name. The element itself is never matched.
    pub fn descendant(&self, name: &str) -> Option<&Element> {
        Descendants::new(self).find(|element| element.name == name)
    }

    pub fn descendant_text(&self, name: &str) -> Option<&str> {
        self.descendant(name).and_then(Element::text)
    }

    /// Every element below this one with the given local name, in document order.
    pub fn descendants<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        Descendants::new(self).filter(move |element| element.name == name)
    }
}

struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Descendants<'a> {
    fn new(root: &'a Element) -> Self {
        Self {
            stack: root.children.iter().rev().collect(),
        }
    }
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children.iter().rev());
        Some(next)
    }
}

fn local_name(raw: &[u8]) -> Result<String, XmlError> {
    Ok(std::str::from_utf8(raw)?.to_string())
}

fn is_ncname(part: &str) -> bool {
    let mut chars = part.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '-' | '.' | '_'))
}

/// 名稱最多一個前綴，且每段皆須為合法 NCName
fn check_name(raw: &[u8]) -> Result<(), XmlError> {
    let name = std::str::from_utf8(raw)?;
    let parts: Vec<&str> = name.split(':').collect();
    if parts.len() > 2 || !parts.iter().all(|part| is_ncname(part)) {
        return Err(XmlError::Malformed(format!("invalid name '{}'", name)));
    }
    Ok(())
}

/// Validate a start tag (name, namespace prefix, attributes) and return its local name.
fn start_tag(namespace: ResolveResult<'_>, tag: &BytesStart<'_>) -> Result<String, XmlError> {
    check_name(tag.name().as_ref())?;
    if let ResolveResult::Unknown(prefix) = namespace {
        return Err(XmlError::Malformed(format!(
            "unbound namespace prefix '{}'",
            String::from_utf8_lossy(&prefix)
        )));
    }

    let mut attributes = tag.attributes();
    attributes.with_checks(true);
    for attribute in attributes {
        let attribute = attribute?;
        check_name(attribute.key.as_ref())?;
        attribute.unescape_value()?;
    }

    local_name(tag.local_name().as_ref())
}

fn open_element(stack: &[Element], root: &Option<Element>, name: &str) -> Result<(), XmlError> {
    if stack.is_empty() && root.is_some() {
        return Err(XmlError::Malformed(format!(
            "element <{}> found after the root element",
            name
        )));
    }
    Ok(())
}

fn close_element(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}

fn append_text(stack: &mut [Element], text: &str) -> Result<(), XmlError> {
    match stack.last_mut() {
        // 只保留第一個子元素之前的文字
        Some(current) if current.children.is_empty() => current.text.push_str(text),
        Some(_) => {}
        None if text.trim().is_empty() => {}
        None => {
            return Err(XmlError::Malformed(
                "text content outside the root element".to_string(),
            ))
        }
    }
    Ok(())
}

/// Parse a whole document into its root element.
pub fn parse_document(input: &str) -> Result<Element, XmlError> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let mut reader = NsReader::from_str(input);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_resolved_event()? {
            (namespace, Event::Start(ref e)) => {
                let name = start_tag(namespace, e)?;
                open_element(&stack, &root, &name)?;
                stack.push(Element::new(name));
            }
            (namespace, Event::Empty(ref e)) => {
                let name = start_tag(namespace, e)?;
                open_element(&stack, &root, &name)?;
                close_element(&mut stack, &mut root, Element::new(name));
            }
            (_, Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| XmlError::Malformed("unexpected closing tag".to_string()))?;
                close_element(&mut stack, &mut root, element);
            }
            (_, Event::Text(ref e)) => {
                let text = e.unescape()?;
                append_text(&mut stack, &text)?;
            }
            (_, Event::CData(ref e)) => {
                let text = std::str::from_utf8(e)?;
                append_text(&mut stack, text)?;
            }
            (_, Event::Eof) => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(XmlError::Malformed(format!(
            "unexpected end of document: <{}> is not closed",
            open.name
        )));
    }

    root.ok_or_else(|| XmlError::Malformed("document has no root element".to_string()))
}
