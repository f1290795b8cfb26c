//! Multistatus response parsing
//!
//! Parses the body of a depth-1 `PROPFIND` in two passes:
//!
//! 1. [`tokenize`] scans the document and emits a flat list of
//!    [`DavEvent`]s for the elements we care about (`multistatus`,
//!    `response`, `href`, `iscollection`, `collection`). Namespace prefixes
//!    are stripped; everything else is skipped.
//! 2. [`fold_entries`] folds those events into one [`DavEntry`] per
//!    `<response>`.
//!
//! [`parse_folder`] then drops the self-entry, matched by reference against
//! the requested folder wherever it appears, and sorts the children by name.
//! When no entry matches, the first one is taken as the self-entry.
//!
//! ```text
//! <d:multistatus xmlns:d="DAV:">
//!   <d:response>
//!     <d:href>/dav/tracks/</d:href>
//!     <d:propstat><d:prop>
//!       <d:resourcetype><d:collection/></d:resourcetype>
//!     </d:prop></d:propstat>
//!   </d:response>
//!   ...
//! </d:multistatus>
//! ```

use percent_encoding::percent_decode_str;
use tracing::debug;
use trackdav_core::domain::{RemoteElement, RemoteFolder};

use crate::WebDavError;

/// Elements the tokenizer reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DavTag {
    Multistatus,
    Response,
    Href,
    IsCollection,
    Collection,
}

impl DavTag {
    fn from_local_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "multistatus" => Some(Self::Multistatus),
            "response" => Some(Self::Response),
            "href" => Some(Self::Href),
            "iscollection" => Some(Self::IsCollection),
            "collection" => Some(Self::Collection),
            _ => None,
        }
    }

    fn captures_text(self) -> bool {
        matches!(self, Self::Href | Self::IsCollection)
    }
}

/// One event of the flattened document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DavEvent {
    Start(DavTag),
    End(DavTag),
    /// Entity-decoded character data found inside `href` or `iscollection`
    Text(String),
}

/// One `<response>` of a multistatus body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DavEntry {
    pub href: String,
    pub is_collection: bool,
}

impl DavEntry {
    /// Last non-empty, percent-decoded path segment of the reference
    pub fn name(&self) -> String {
        let path = self.href.split(['?', '#']).next().unwrap_or_default();
        let segment = path
            .split('/')
            .rev()
            .find(|s| !s.is_empty())
            .unwrap_or_default();
        percent_decode(segment)
    }

    /// Decoded path of the reference, without scheme, host or trailing `/`
    fn path(&self) -> String {
        let href = self.href.split(['?', '#']).next().unwrap_or_default();
        let path = match href.find("://") {
            Some(scheme_end) => {
                let rest = &href[scheme_end + 3..];
                rest.find('/').map_or("", |start| &rest[start..])
            }
            None => href,
        };
        percent_decode(path).trim_end_matches('/').to_string()
    }

    /// Whether this entry is the folder at `folder_path` (a URL path)
    pub fn refers_to(&self, folder_path: &str) -> bool {
        self.path() == percent_decode(folder_path).trim_end_matches('/')
    }
}

impl From<&DavEntry> for RemoteElement {
    fn from(entry: &DavEntry) -> Self {
        RemoteElement {
            name: entry.name(),
            is_folder: entry.is_collection,
        }
    }
}

// ============================================================================
// Pass 1: tokenize
// ============================================================================

/// Scans an XML document into a flat list of events of interest
///
/// Comments, processing instructions and declarations are skipped. CDATA
/// sections are reported verbatim as text.
pub fn tokenize(xml: &str) -> Result<Vec<DavEvent>, WebDavError> {
    let mut events = Vec::new();
    // Innermost open element that captures text, if any
    let mut capture: Option<DavTag> = None;
    let mut rest = xml;

    while !rest.is_empty() {
        let Some(lt) = rest.find('<') else {
            push_text(&mut events, capture, rest, true);
            break;
        };
        if lt > 0 {
            push_text(&mut events, capture, &rest[..lt], true);
        }
        rest = &rest[lt..];

        if let Some(after) = rest.strip_prefix("<!--") {
            let end = after
                .find("-->")
                .ok_or_else(|| malformed("unterminated comment"))?;
            rest = &after[end + 3..];
            continue;
        }
        if let Some(after) = rest.strip_prefix("<![CDATA[") {
            let end = after
                .find("]]>")
                .ok_or_else(|| malformed("unterminated CDATA section"))?;
            push_text(&mut events, capture, &after[..end], false);
            rest = &after[end + 3..];
            continue;
        }
        if let Some(after) = rest.strip_prefix("<?") {
            let end = after
                .find("?>")
                .ok_or_else(|| malformed("unterminated processing instruction"))?;
            rest = &after[end + 2..];
            continue;
        }
        if let Some(after) = rest.strip_prefix("<!") {
            let end = after
                .find('>')
                .ok_or_else(|| malformed("unterminated declaration"))?;
            rest = &after[end + 1..];
            continue;
        }

        let end = find_tag_end(rest).ok_or_else(|| malformed("unterminated tag"))?;
        let inner = &rest[1..end];
        rest = &rest[end + 1..];

        let closing = inner.starts_with('/');
        let self_closing = !closing && inner.ends_with('/');
        let name = inner
            .trim_start_matches('/')
            .trim_end_matches('/')
            .split(|c: char| c.is_ascii_whitespace())
            .next()
            .unwrap_or_default();
        if name.is_empty() {
            return Err(malformed("empty element name"));
        }
        let local = name.rsplit(':').next().unwrap_or(name);

        let Some(tag) = DavTag::from_local_name(local) else {
            continue;
        };

        if closing {
            events.push(DavEvent::End(tag));
            if capture == Some(tag) {
                capture = None;
            }
        } else {
            events.push(DavEvent::Start(tag));
            if self_closing {
                events.push(DavEvent::End(tag));
            } else if tag.captures_text() {
                capture = Some(tag);
            }
        }
    }

    Ok(events)
}

/// Index of the `>` closing the tag at the start of `s`, ignoring quoted attribute values
fn find_tag_end(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices().skip(1) {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '>') => return Some(i),
            _ => {}
        }
    }
    None
}

fn push_text(events: &mut Vec<DavEvent>, capture: Option<DavTag>, raw: &str, decode: bool) {
    if capture.is_none() || raw.is_empty() {
        return;
    }
    let text = if decode {
        decode_entities(raw)
    } else {
        raw.to_string()
    };
    events.push(DavEvent::Text(text));
}

fn malformed(what: &str) -> WebDavError {
    WebDavError::InvalidResponse(format!("malformed XML: {what}"))
}

/// Replaces the predefined XML entities and numeric character references
fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let Some(semi) = rest.find(';') else {
            break;
        };
        let entity = &rest[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decodes `%XX` escapes; invalid escapes are kept as-is
fn percent_decode(segment: &str) -> String {
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}

// ============================================================================
// Pass 2: fold
// ============================================================================

#[derive(Default)]
struct EntryBuilder {
    href: String,
    iscollection_text: String,
    collection_marker: bool,
}

/// Folds tokenizer events into one entry per `<response>`
///
/// Responses without an `href` are skipped. A document that never opens a
/// `multistatus` element, or whose `response` elements are unbalanced, is
/// rejected.
pub fn fold_entries(events: &[DavEvent]) -> Result<Vec<DavEntry>, WebDavError> {
    if !events.contains(&DavEvent::Start(DavTag::Multistatus)) {
        return Err(WebDavError::InvalidResponse(
            "not a multistatus document".into(),
        ));
    }

    let mut entries = Vec::new();
    let mut current: Option<EntryBuilder> = None;
    let mut target: Option<DavTag> = None;

    for event in events {
        match event {
            DavEvent::Start(DavTag::Response) => {
                if current.is_some() {
                    return Err(malformed("nested response element"));
                }
                current = Some(EntryBuilder::default());
            }
            DavEvent::End(DavTag::Response) => {
                let builder = current
                    .take()
                    .ok_or_else(|| malformed("response closed before it was opened"))?;
                let href = builder.href.trim().to_string();
                if href.is_empty() {
                    continue;
                }
                let is_collection = builder.collection_marker
                    || builder.iscollection_text.trim().eq_ignore_ascii_case("true");
                entries.push(DavEntry {
                    href,
                    is_collection,
                });
            }
            DavEvent::Start(tag @ (DavTag::Href | DavTag::IsCollection)) => {
                target = Some(*tag);
            }
            DavEvent::End(DavTag::Href | DavTag::IsCollection) => {
                target = None;
            }
            DavEvent::Start(DavTag::Collection) => {
                if let Some(builder) = current.as_mut() {
                    builder.collection_marker = true;
                }
            }
            DavEvent::Text(text) => {
                if let Some(builder) = current.as_mut() {
                    match target {
                        Some(DavTag::Href) => builder.href.push_str(text),
                        Some(DavTag::IsCollection) => builder.iscollection_text.push_str(text),
                        _ => {}
                    }
                }
            }
            DavEvent::Start(DavTag::Multistatus)
            | DavEvent::End(DavTag::Multistatus)
            | DavEvent::End(DavTag::Collection) => {}
        }
    }

    if current.is_some() {
        return Err(malformed("unterminated response element"));
    }

    Ok(entries)
}

/// Parses a multistatus body into the listing of `path`
///
/// `folder_href` is the URL path the listing was requested for; the entry
/// referring to it is dropped wherever it appears in the body.
pub fn parse_folder(path: &str, folder_href: &str, xml: &str) -> Result<RemoteFolder, WebDavError> {
    let events = tokenize(xml)?;
    let mut entries = fold_entries(&events)?;

    match entries.iter().position(|entry| entry.refers_to(folder_href)) {
        Some(index) => {
            entries.remove(index);
            let children = entries.iter().map(RemoteElement::from).collect();
            Ok(RemoteFolder::from_children(path, children))
        }
        None => {
            debug!(folder_href, "No self-entry matched, dropping the first response");
            let elements = entries.iter().map(RemoteElement::from).collect();
            Ok(RemoteFolder::from_listing(path, elements))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<d:multistatus xmlns:d="DAV:" xmlns:z="urn:schemas-microsoft-com:">
  <d:response>
    <d:href>/dav/tracks/</d:href>
    <d:propstat>
      <d:prop>
        <d:displayname>tracks</d:displayname>
        <z:iscollection>true</z:iscollection>
      </d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
  <d:response>
    <d:href>/dav/tracks/b.json</d:href>
    <d:propstat><d:prop><z:iscollection>false</z:iscollection></d:prop></d:propstat>
  </d:response>
  <d:response>
    <d:href>/dav/tracks/archive/</d:href>
    <d:propstat><d:prop><z:iscollection>true</z:iscollection></d:prop></d:propstat>
  </d:response>
  <d:response>
    <d:href>/dav/tracks/a.json</d:href>
    <d:propstat><d:prop><z:iscollection>false</z:iscollection></d:prop></d:propstat>
  </d:response>
</d:multistatus>"#;

    #[test]
    fn parse_self_plus_three_children() {
        let folder = parse_folder("/tracks/", "/dav/tracks/", LISTING).unwrap();
        assert_eq!(folder.path(), "/tracks/");
        assert_eq!(
            folder.elements(),
            &[
                RemoteElement::file("a.json"),
                RemoteElement::folder("archive"),
                RemoteElement::file("b.json"),
            ]
        );
    }

    #[test]
    fn self_entry_is_dropped_wherever_it_appears() {
        let xml = r#"<d:multistatus xmlns:d="DAV:">
            <d:response><d:href>/dav/tracks/a.json</d:href></d:response>
            <d:response><d:href>/dav/tracks/</d:href><d:propstat><d:prop><d:resourcetype><d:collection/></d:resourcetype></d:prop></d:propstat></d:response>
            <d:response><d:href>/dav/tracks/b.json</d:href></d:response>
        </d:multistatus>"#;
        let folder = parse_folder("/", "/dav/tracks/", xml).unwrap();
        assert_eq!(
            folder.elements(),
            &[RemoteElement::file("a.json"), RemoteElement::file("b.json")]
        );
    }

    #[test]
    fn self_entry_matches_absolute_and_escaped_references() {
        let xml = "<multistatus>\
                   <response><href>/my%20tracks/2026/x.json</href></response>\
                   <response><href>https://dav.example.com/my%20tracks/2026</href>\
                   <propstat><prop><iscollection>true</iscollection></prop></propstat></response>\
                   </multistatus>";
        let folder = parse_folder("2026/", "/my%20tracks/2026/", xml).unwrap();
        assert_eq!(folder.elements(), &[RemoteElement::file("x.json")]);
    }

    #[test]
    fn unmatched_self_entry_falls_back_to_first_response() {
        let xml = "<multistatus><response><href>/elsewhere/</href></response>\
                   <response><href>/elsewhere/a.json</href></response></multistatus>";
        let folder = parse_folder("/", "/dav/tracks/", xml).unwrap();
        assert_eq!(folder.elements(), &[RemoteElement::file("a.json")]);
    }

    #[test]
    fn tokenize_strips_prefixes_and_skips_other_elements() {
        let events = tokenize("<a:multistatus><a:response><a:href>x</a:href><a:status>ok</a:status></a:response></a:multistatus>").unwrap();
        assert_eq!(
            events,
            vec![
                DavEvent::Start(DavTag::Multistatus),
                DavEvent::Start(DavTag::Response),
                DavEvent::Start(DavTag::Href),
                DavEvent::Text("x".into()),
                DavEvent::End(DavTag::Href),
                DavEvent::End(DavTag::Response),
                DavEvent::End(DavTag::Multistatus),
            ]
        );
    }

    #[test]
    fn resourcetype_collection_marks_folder() {
        let xml = r#"<multistatus xmlns="DAV:">
            <response><href>/base/</href><propstat><prop><resourcetype><collection/></resourcetype></prop></propstat></response>
            <response><href>/base/sub/</href><propstat><prop><resourcetype><collection /></resourcetype></prop></propstat></response>
            <response><href>/base/f.txt</href><propstat><prop><resourcetype/></prop></propstat></response>
        </multistatus>"#;
        let folder = parse_folder("/", "/base/", xml).unwrap();
        assert_eq!(
            folder.elements(),
            &[RemoteElement::file("f.txt"), RemoteElement::folder("sub")]
        );
    }

    #[test]
    fn href_entities_and_percent_escapes_are_decoded() {
        let xml = "<multistatus><response><href>/x/</href></response>\
                   <response><href>/x/a%20b&amp;c.json</href></response></multistatus>";
        let folder = parse_folder("/x/", "/x/", xml).unwrap();
        assert_eq!(folder.elements()[0].name, "a b&c.json");
    }

    #[test]
    fn absolute_href_uses_last_segment() {
        let entry = DavEntry {
            href: "https://dav.example.com/base/day/2026-01-01.json".into(),
            is_collection: false,
        };
        assert_eq!(entry.name(), "2026-01-01.json");
    }

    #[test]
    fn comments_and_cdata_are_handled() {
        let xml = "<!-- listing --><multistatus><response><href><![CDATA[/r/]]></href></response>\
                   <response><href><![CDATA[/r/x&y]]></href></response></multistatus>";
        let folder = parse_folder("/r/", "/r/", xml).unwrap();
        assert_eq!(folder.elements()[0].name, "x&y");
    }

    #[test]
    fn quoted_gt_in_attribute_does_not_end_tag() {
        let xml = r#"<multistatus><response note="a>b"><href>/p/</href></response>
                     <response><href>/p/q</href></response></multistatus>"#;
        let folder = parse_folder("/p/", "/p/", xml).unwrap();
        assert_eq!(folder.len(), 1);
    }

    #[test]
    fn non_multistatus_document_is_rejected() {
        let err = parse_folder("/", "/", "<html><body>Login</body></html>").unwrap_err();
        assert!(matches!(err, WebDavError::InvalidResponse(_)));
    }

    #[test]
    fn unterminated_tag_is_rejected() {
        assert!(tokenize("<multistatus><response").is_err());
    }

    #[test]
    fn unbalanced_response_is_rejected() {
        assert!(parse_folder("/", "/", "<multistatus></response></multistatus>").is_err());
        assert!(parse_folder("/", "/", "<multistatus><response><href>/a</href></multistatus>").is_err());
    }

    #[test]
    fn response_without_href_is_skipped() {
        let events = tokenize("<multistatus><response></response><response><href>/a/</href></response></multistatus>").unwrap();
        let entries = fold_entries(&events).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].href, "/a/");
    }

    #[test]
    fn decode_entities_handles_numeric_references() {
        assert_eq!(decode_entities("a&#65;&#x42;c"), "aABc");
        assert_eq!(decode_entities("fish &chips"), "fish &chips");
        assert_eq!(decode_entities("&lt;&gt;&quot;&apos;"), "<>\"'");
    }

    #[test]
    fn percent_decode_keeps_invalid_escapes() {
        assert_eq!(percent_decode("a%2Fb"), "a/b");
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz"), "%zz");
        assert_eq!(percent_decode("caf%C3%A9"), "café");
    }
}
