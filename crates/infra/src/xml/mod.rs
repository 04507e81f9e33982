//! XML readers for the service's SOAP and OData (Atom) responses
//!
//! Elements are matched by local name so documents may bind whatever
//! namespace prefixes they like. Parse failures name the element that was
//! expected, using the prefix the service conventionally sends
//! (`d:FormDigestValue`, `wsse:BinarySecurityToken`).

pub mod records;

use std::collections::HashMap;

use quick_xml::events::Event;
use quick_xml::Reader;
use sprest_domain::{Result, SpError};

use crate::errors::IntoSpError;

pub use records::{role_definitions_from_feed, users_from_feed};

const TIMEOUT_ELEMENT: &str = "d:FormDigestTimeoutSeconds";
const DIGEST_ELEMENT: &str = "d:FormDigestValue";

/// Form digest and its lifetime as reported by `_api/contextinfo`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextInfo {
    pub timeout_secs: i64,
    pub digest: String,
}

fn reader(xml: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    reader
}

fn next_event<'a>(reader: &mut Reader<&'a [u8]>) -> Result<Event<'a>> {
    reader.read_event().map_err(IntoSpError::into_sp)
}

fn local_name(name: &[u8]) -> String {
    String::from_utf8_lossy(name).into_owned()
}

/// Text content of the element whose start tag was just read, up to its
/// matching end tag. Text of nested elements is included.
fn element_text(reader: &mut Reader<&[u8]>, element: &str) -> Result<String> {
    let mut text = String::new();
    let mut depth = 0_usize;
    loop {
        match next_event(reader)? {
            Event::Text(t) => {
                let unescaped = t.unescape().map_err(|err| SpError::parse(element, err.to_string()))?;
                text.push_str(&unescaped);
            }
            Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c.into_inner())),
            Event::Start(_) => depth += 1,
            Event::End(_) if depth == 0 => return Ok(text),
            Event::End(_) => depth -= 1,
            Event::Eof => return Err(SpError::parse(element, "document ended inside element")),
            _ => {}
        }
    }
}

/// Text of the first element named `local` (any prefix), or `None` if the
/// document has no such element. A self-closing element yields `""`.
pub fn find_element_text(xml: &str, local: &str) -> Result<Option<String>> {
    let mut reader = reader(xml);
    loop {
        match next_event(&mut reader)? {
            Event::Start(e) if e.local_name().as_ref() == local.as_bytes() => {
                return element_text(&mut reader, local).map(Some);
            }
            Event::Empty(e) if e.local_name().as_ref() == local.as_bytes() => {
                return Ok(Some(String::new()));
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// Parse a `_api/contextinfo` response.
///
/// `FormDigestTimeoutSeconds` must be a positive integer and must be
/// immediately followed by a non-empty `FormDigestValue`.
pub fn parse_context_info(xml: &str) -> Result<ContextInfo> {
    let mut reader = reader(xml);
    loop {
        match next_event(&mut reader)? {
            Event::Start(e) if e.local_name().as_ref() == b"FormDigestTimeoutSeconds" => {
                let raw = element_text(&mut reader, TIMEOUT_ELEMENT)?;
                let timeout_secs = raw
                    .trim()
                    .parse::<i64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .ok_or_else(|| {
                        SpError::parse(TIMEOUT_ELEMENT, format!("expected a positive integer, got {raw:?}"))
                    })?;
                let digest = adjacent_digest(&mut reader)?;
                return Ok(ContextInfo { timeout_secs, digest });
            }
            Event::Empty(e) if e.local_name().as_ref() == b"FormDigestTimeoutSeconds" => {
                return Err(SpError::parse(TIMEOUT_ELEMENT, "element is empty"));
            }
            Event::Eof => return Err(SpError::parse(TIMEOUT_ELEMENT, "element not found")),
            _ => {}
        }
    }
}

fn adjacent_digest(reader: &mut Reader<&[u8]>) -> Result<String> {
    loop {
        match next_event(reader)? {
            Event::Start(e) if e.local_name().as_ref() == b"FormDigestValue" => {
                let digest = element_text(reader, DIGEST_ELEMENT)?;
                if digest.is_empty() {
                    return Err(SpError::parse(DIGEST_ELEMENT, "element is empty"));
                }
                return Ok(digest);
            }
            Event::Empty(e) if e.local_name().as_ref() == b"FormDigestValue" => {
                return Err(SpError::parse(DIGEST_ELEMENT, "element is empty"));
            }
            Event::Start(e) | Event::Empty(e) => {
                return Err(SpError::parse(
                    DIGEST_ELEMENT,
                    format!(
                        "expected right after {TIMEOUT_ELEMENT}, found <{}>",
                        local_name(e.name().as_ref())
                    ),
                ));
            }
            Event::End(_) | Event::Eof => {
                return Err(SpError::parse(
                    DIGEST_ELEMENT,
                    format!("expected right after {TIMEOUT_ELEMENT}, found none"),
                ));
            }
            _ => {}
        }
    }
}

struct Frame {
    name: String,
    text: String,
    has_children: bool,
}

/// Collect the leaf values of every `properties` element of an OData feed.
///
/// Each map is keyed by local element name. Complex values are flattened,
/// so `BasePermissions/High` appears as `High`. Self-closing (null) leaves
/// map to `""`.
pub fn parse_properties(xml: &str) -> Result<Vec<HashMap<String, String>>> {
    let mut reader = reader(xml);
    let mut entries = Vec::new();
    let mut current: Option<HashMap<String, String>> = None;
    let mut stack: Vec<Frame> = Vec::new();

    loop {
        match next_event(&mut reader)? {
            Event::Start(e) => {
                let name = local_name(e.local_name().as_ref());
                if current.is_none() {
                    if name == "properties" {
                        current = Some(HashMap::new());
                    }
                    continue;
                }
                if let Some(parent) = stack.last_mut() {
                    parent.has_children = true;
                }
                stack.push(Frame { name, text: String::new(), has_children: false });
            }
            Event::Empty(e) => {
                if let Some(props) = current.as_mut() {
                    if let Some(parent) = stack.last_mut() {
                        parent.has_children = true;
                    }
                    props.insert(local_name(e.local_name().as_ref()), String::new());
                }
            }
            Event::Text(t) => {
                if let Some(frame) = stack.last_mut() {
                    let unescaped =
                        t.unescape().map_err(|err| SpError::parse(&frame.name, err.to_string()))?;
                    frame.text.push_str(&unescaped);
                }
            }
            Event::CData(c) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(_) => match stack.pop() {
                Some(frame) => {
                    if !frame.has_children {
                        if let Some(props) = current.as_mut() {
                            props.insert(frame.name, frame.text);
                        }
                    }
                }
                None => {
                    if let Some(props) = current.take() {
                        entries.push(props);
                    }
                }
            },
            Event::Eof => {
                if current.is_some() {
                    return Err(SpError::parse("m:properties", "document ended inside element"));
                }
                return Ok(entries);
            }
            _ => {}
        }
    }
}
