use crate::rollcall::*;

use roxmltree::{Document, Node, ParsingOptions};

pub fn read_local(path: &str) -> MapResult<Vec<u8>> {
    info!("Reading local file {:?}", path);
    fs::read(path).context(OpeningFileSnafu { path })
}

/// Decodes the bytes of an XML document, dropping the byte-order mark if present.
pub fn decode_xml<'a>(bytes: &'a [u8], document: &str) -> MapResult<&'a str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    std::str::from_utf8(bytes).context(XmlEncodingSnafu { document })
}

/// Parses an XML document. The Clerk feeds declare a DTD, which is accepted but not loaded.
pub fn parse_xml<'a>(text: &'a str, document: &str) -> MapResult<Document<'a>> {
    let opts = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Document::parse_with_options(text, opts).context(ParsingXmlSnafu { document })
}

/// The trimmed text of the first child element with the given tag, if it is not empty.
pub fn child_text(node: Node, tag: &str) -> Option<String> {
    node.children()
        .find(|n| n.has_tag_name(tag))
        .and_then(|n| n.text())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Same as [child_text], looking at all the descendants.
pub fn descendant_text(node: Node, tag: &str) -> Option<String> {
    node.descendants()
        .find(|n| n.has_tag_name(tag))
        .and_then(|n| n.text())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// The trimmed value of an attribute, if it is not empty.
pub fn attribute(node: Node, name: &str) -> Option<String> {
    node.attribute(name)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_bom() {
        let bytes = b"\xEF\xBB\xBF<a/>";
        assert_eq!(decode_xml(bytes, "test").unwrap(), "<a/>");
    }

    #[test]
    fn rejects_invalid_utf8() {
        let bytes = b"<a>\xFF</a>";
        assert!(matches!(
            decode_xml(bytes, "test"),
            Err(MapError::XmlEncoding { .. })
        ));
    }

    #[test]
    fn accepts_doctype() {
        let text = r#"<!DOCTYPE rollcall-vote PUBLIC "-//US House//EN" "vote.dtd"><rollcall-vote><x> a </x><y/></rollcall-vote>"#;
        let doc = parse_xml(text, "test").unwrap();
        let root = doc.root_element();
        assert_eq!(child_text(root, "x"), Some("a".to_string()));
        assert_eq!(child_text(root, "y"), None);
        assert_eq!(child_text(root, "z"), None);
    }

    #[test]
    fn malformed_xml_is_an_error() {
        let res = parse_xml("<a><b></a>", "broken.xml");
        match res {
            Err(MapError::ParsingXml { document, .. }) => assert_eq!(document, "broken.xml"),
            x => panic!("unexpected {:?}", x.map(|_| ())),
        }
    }
}
