//! SOAP response parsing.
//!
//! Uses quick-xml, which never expands entities; documents carrying a DOCTYPE
//! are rejected outright.
//!
//! Responses are held as a small element tree keyed by local name, so lookups
//! ignore namespace prefixes (`m:ResponseCode` and `ResponseCode` match alike).

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// SOAP 1.1 envelope namespace.
pub const SOAP_11_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
/// EWS types namespace.
pub const EWS_TYPES_NS: &str = "http://schemas.microsoft.com/exchange/services/2006/types";
/// EWS messages namespace.
pub const EWS_MESSAGES_NS: &str = "http://schemas.microsoft.com/exchange/services/2006/messages";
/// Autodiscover SOAP namespace.
pub const AUTODISCOVER_NS: &str = "http://schemas.microsoft.com/exchange/2010/Autodiscover";
/// WS-Addressing namespace.
pub const WSA_NS: &str = "http://www.w3.org/2005/08/addressing";

/// A parsed XML element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    /// Local name, without namespace prefix
    pub name: String,
    /// Attributes as (local name, unescaped value)
    pub attributes: Vec<(String, String)>,
    /// Concatenated text and CDATA content directly inside this element
    pub text: String,
    /// Child elements, in document order
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    fn from_start(e: &BytesStart) -> Result<Self, String> {
        let mut attributes = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|e| format!("invalid attribute: {}", e))?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| format!("invalid attribute value: {}", e))?
                .into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name: String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
            attributes,
            text: String::new(),
            children: Vec::new(),
        })
    }

    /// First element with the given local name, searching this element and
    /// all descendants depth-first in document order.
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    /// Every element with the given local name, depth-first in document
    /// order. Matches are not searched for nested matches.
    pub fn find_all<'a>(&'a self, name: &str) -> Vec<&'a XmlElement> {
        let mut found = Vec::new();
        self.collect(name, &mut found);
        found
    }

    fn collect<'a>(&'a self, name: &str, found: &mut Vec<&'a XmlElement>) {
        if self.name == name {
            found.push(self);
            return;
        }
        for child in &self.children {
            child.collect(name, found);
        }
    }

    /// Direct child with the given local name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Trimmed text content, or `None` when the element has none.
    pub fn text(&self) -> Option<&str> {
        let text = self.text.trim();
        (!text.is_empty()).then_some(text)
    }

    /// Attribute value by local name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// A parsed response document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    root: XmlElement,
}

impl XmlDocument {
    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// See [`XmlElement::find`].
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        self.root.find(name)
    }

    /// See [`XmlElement::find_all`].
    pub fn find_all<'a>(&'a self, name: &str) -> Vec<&'a XmlElement> {
        self.root.find_all(name)
    }

    /// Text of the first element with the given local name, if it has any.
    pub fn find_text(&self, name: &str) -> Option<&str> {
        self.find(name).and_then(XmlElement::text)
    }
}

/// Parse raw response bytes into a document.
pub fn parse_document(data: &[u8]) -> Result<XmlDocument, String> {
    let xml_str = std::str::from_utf8(data).map_err(|e| format!("Invalid UTF-8: {}", e))?;

    let mut reader = Reader::from_str(xml_str);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                if root.is_some() {
                    return Err("content after root element".to_string());
                }
                stack.push(XmlElement::from_start(e)?);
            }

            Ok(Event::Empty(ref e)) => {
                if root.is_some() {
                    return Err("content after root element".to_string());
                }
                let element = XmlElement::from_start(e)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }

            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| "unexpected closing tag".to_string())?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }

            Ok(Event::Text(ref e)) => {
                if let Some(current) = stack.last_mut() {
                    let text = e.unescape().map_err(|e| format!("invalid text: {}", e))?;
                    current.text.push_str(&text);
                }
            }

            Ok(Event::CData(e)) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }

            Ok(Event::DocType(_)) => {
                return Err("DOCTYPE declarations are not allowed".to_string());
            }

            Ok(Event::Eof) => break,

            Err(e) => {
                return Err(format!("XML parse error: {}", e));
            }

            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err("unexpected end of document".to_string());
    }

    root.map(|root| XmlDocument { root })
        .ok_or_else(|| "no root element".to_string())
}
