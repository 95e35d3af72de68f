//! BER-TLV decoding into a tree of tagged nodes
//!
//! EMV records, FCIs and GPO responses are BER-TLV encoded. A tag whose
//! first byte has bit 0x20 set is *constructed*: its value is itself a
//! sequence of TLV objects and is decoded into [`TlvNode::children`].

use std::fmt;

use crate::error::TlvError;
use crate::EmvTag;

/// A BER-TLV tag identifier (one or more bytes, big-endian)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(Vec<u8>);

impl Tag {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Parse a tag from its hex form, e.g. `"9F38"`
    pub fn from_hex(hex_tag: &str) -> Result<Self, hex::FromHexError> {
        hex::decode(hex_tag).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Bit 0x20 of the first tag byte marks a constructed data object
    pub fn is_constructed(&self) -> bool {
        self.0.first().is_some_and(|b| b & 0x20 != 0)
    }

    pub fn to_hex(&self) -> String {
        hex::encode_upper(&self.0)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for Tag {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl PartialEq<[u8]> for Tag {
    fn eq(&self, other: &[u8]) -> bool {
        self.0 == other
    }
}

impl PartialEq<&[u8]> for Tag {
    fn eq(&self, other: &&[u8]) -> bool {
        self.0 == *other
    }
}

impl From<EmvTag> for Tag {
    fn from(tag: EmvTag) -> Self {
        Self(tag.0.to_vec())
    }
}

/// One decoded data object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlvNode {
    pub tag: Tag,
    /// Declared value length
    pub length: usize,
    /// Raw value bytes (kept for constructed tags too)
    pub value: Vec<u8>,
    /// Child objects, populated only for constructed tags
    pub children: Vec<TlvNode>,
    /// Why decoding stopped inside a constructed value; `children` holds
    /// the objects decoded before that point
    pub child_error: Option<TlvError>,
}

impl TlvNode {
    pub fn is_constructed(&self) -> bool {
        self.tag.is_constructed()
    }

    /// Whether this node or any node below it failed to decode its children
    pub fn is_malformed(&self) -> bool {
        self.child_error.is_some() || self.children.iter().any(TlvNode::is_malformed)
    }

    /// Depth-first, pre-order search starting at this node
    pub fn find(&self, tag: &[u8]) -> Option<&TlvNode> {
        if self.tag == tag {
            return Some(self);
        }
        find_first(&self.children, tag)
    }

    /// Direct child by tag (non-recursive)
    pub fn child(&self, tag: &[u8]) -> Option<&TlvNode> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// Re-encode tag, minimal length and value
    pub fn encode(&self) -> Vec<u8> {
        let mut out = self.tag.as_bytes().to_vec();
        out.extend(encode_length(self.value.len()));
        out.extend_from_slice(&self.value);
        out
    }
}

/// Decode a buffer into its top-level TLV nodes.
///
/// Zero bytes where a tag would start are padding and are skipped. A
/// constructed node whose value does not decode cleanly keeps its raw
/// value, the children decoded before the fault and the fault itself in
/// [`TlvNode::child_error`]; only the enclosing structure being malformed
/// fails the whole call.
pub fn parse_tlv(data: &[u8]) -> Result<Vec<TlvNode>, TlvError> {
    match parse_nodes(data) {
        (nodes, None) => Ok(nodes),
        (_, Some(err)) => Err(err),
    }
}

/// Decode as many nodes as possible; the error, if any, is where decoding stopped
fn parse_nodes(data: &[u8]) -> (Vec<TlvNode>, Option<TlvError>) {
    let mut nodes = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        if data[pos] == 0x00 {
            pos += 1;
            continue;
        }

        match parse_node(data, pos) {
            Ok((node, next)) => {
                nodes.push(node);
                pos = next;
            }
            Err(err) => return (nodes, Some(err)),
        }
    }

    (nodes, None)
}

fn parse_node(data: &[u8], pos: usize) -> Result<(TlvNode, usize), TlvError> {
    let (tag, after_tag) = read_tag(data, pos)?;
    let (length, value_start) = read_length(data, after_tag)?;

    let value_end = value_start
        .checked_add(length)
        .filter(|&end| end <= data.len())
        .ok_or_else(|| TlvError::ValueOverrun {
            tag: tag.clone(),
            offset: value_start,
            length,
            available: data.len() - value_start,
        })?;

    let value = data[value_start..value_end].to_vec();
    let (children, child_error) = if tag.is_constructed() {
        parse_nodes(&value)
    } else {
        (Vec::new(), None)
    };

    let node = TlvNode {
        tag,
        length,
        value,
        children,
        child_error,
    };
    Ok((node, value_end))
}

/// Depth-first, pre-order search over a decoded tree; first match wins
pub fn find_first<'a>(nodes: &'a [TlvNode], tag: &[u8]) -> Option<&'a TlvNode> {
    nodes.iter().find_map(|node| node.find(tag))
}

/// Encode a value length in BER short or long form
pub fn encode_length(length: usize) -> Vec<u8> {
    if length < 0x80 {
        return vec![length as u8];
    }

    let bytes = length.to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count();
    let significant = &bytes[skip..];

    let mut out = Vec::with_capacity(significant.len() + 1);
    out.push(0x80 | significant.len() as u8);
    out.extend_from_slice(significant);
    out
}

/// Read a tag starting at `pos`; returns the tag and the offset after it
pub fn read_tag(data: &[u8], pos: usize) -> Result<(Tag, usize), TlvError> {
    let first = *data.get(pos).ok_or(TlvError::TruncatedTag { offset: pos })?;
    let mut end = pos + 1;

    if first & 0x1F == 0x1F {
        loop {
            let byte = *data.get(end).ok_or(TlvError::TruncatedTag { offset: pos })?;
            end += 1;
            if byte & 0x80 == 0 {
                break;
            }
        }
    }

    Ok((Tag::new(&data[pos..end]), end))
}

/// Read a length field starting at `pos`; returns the length and the offset after it
pub fn read_length(data: &[u8], pos: usize) -> Result<(usize, usize), TlvError> {
    let first = *data
        .get(pos)
        .ok_or(TlvError::TruncatedLength { offset: pos })?;

    if first & 0x80 == 0 {
        return Ok((first as usize, pos + 1));
    }

    // Indefinite form (0x80) is not used by EMV; cap at four length bytes
    let count = (first & 0x7F) as usize;
    if count == 0 || count > 4 {
        return Err(TlvError::UnsupportedLength {
            offset: pos,
            byte: first,
        });
    }

    let bytes = data
        .get(pos + 1..pos + 1 + count)
        .ok_or(TlvError::TruncatedLength { offset: pos })?;
    let length = bytes.iter().fold(0usize, |acc, &b| (acc << 8) | b as usize);

    Ok((length, pos + 1 + count))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(s: &str) -> Vec<u8> {
        hex::decode(s.replace(' ', "")).unwrap()
    }

    #[test]
    fn test_parse_primitive() {
        let nodes = parse_tlv(&bytes("5A 08 47 61 73 90 01 01 00 10")).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].tag.to_hex(), "5A");
        assert_eq!(nodes[0].length, 8);
        assert!(nodes[0].children.is_empty());
    }

    #[test]
    fn test_parse_directory_fci() {
        // 6F { 84 "1PAY.SYS.DDF01", A5 { 88 01, 5F2D "en" } }
        let fci = bytes("6F 1A 84 0E 31 50 41 59 2E 53 59 53 2E 44 44 46 30 31 A5 08 88 01 01 5F 2D 02 65 6E");
        let nodes = parse_tlv(&fci).unwrap();

        assert_eq!(nodes.len(), 1);
        let root = &nodes[0];
        assert!(root.is_constructed());
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].value, b"1PAY.SYS.DDF01");

        let a5 = &root.children[1];
        assert_eq!(a5.children[0].tag.to_hex(), "88");
        assert_eq!(a5.children[0].value, vec![0x01]);
        assert_eq!(a5.children[1].tag.to_hex(), "5F2D");
    }

    #[test]
    fn test_multi_byte_tag_continuation() {
        // Three-byte tag: DF 81 01
        let nodes = parse_tlv(&bytes("DF 81 01 01 FF")).unwrap();
        assert_eq!(nodes[0].tag.to_hex(), "DF8101");
        assert_eq!(nodes[0].value, vec![0xFF]);
    }

    #[test]
    fn test_long_form_length() {
        let mut data = vec![0x90, 0x81, 0x90];
        data.extend(std::iter::repeat(0xAB).take(0x90));
        let nodes = parse_tlv(&data).unwrap();
        assert_eq!(nodes[0].length, 0x90);
        assert_eq!(nodes[0].value.len(), 0x90);
    }

    #[test]
    fn test_trailing_padding_skipped() {
        let nodes = parse_tlv(&bytes("8F 01 05 00")).unwrap();
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn test_truncated_value_is_malformed() {
        let full = bytes("70 0A 5F 20 07 4A 2E 53 4D 49 54 48");
        for cut in 1..full.len() {
            let result = parse_tlv(&full[..cut]);
            assert!(result.is_err(), "cut at {cut} should fail");
        }
    }

    #[test]
    fn test_overrun_reports_offsets() {
        let err = parse_tlv(&bytes("5A 05 01 02")).unwrap_err();
        assert_eq!(
            err,
            TlvError::ValueOverrun {
                tag: Tag::new(vec![0x5A]),
                offset: 2,
                length: 5,
                available: 2,
            }
        );
    }

    #[test]
    fn test_indefinite_length_rejected() {
        let err = parse_tlv(&bytes("70 80 00 00")).unwrap_err();
        assert!(matches!(err, TlvError::UnsupportedLength { byte: 0x80, .. }));
    }

    #[test]
    fn test_malformed_child_keeps_parent() {
        // Outer 70 is sound, inner 5A claims more than the outer value holds
        let nodes = parse_tlv(&bytes("70 04 5A 08 12 34")).unwrap();
        assert_eq!(nodes[0].value, bytes("5A 08 12 34"));
        assert!(nodes[0].children.is_empty());
        assert!(matches!(
            nodes[0].child_error,
            Some(TlvError::ValueOverrun { length: 8, available: 2, .. })
        ));
        assert!(nodes[0].is_malformed());
    }

    #[test]
    fn test_malformed_child_keeps_earlier_siblings() {
        // 61 { 4F A0000000031010, 50 claims 9 bytes with 4 left }
        let nodes = parse_tlv(&bytes("70 11 61 0F 4F 07 A0 00 00 00 03 10 10 50 09 56 49 53 41")).unwrap();
        let entry = &nodes[0].children[0];

        assert_eq!(entry.children.len(), 1);
        assert_eq!(entry.children[0].tag.to_hex(), "4F");
        assert!(entry.child_error.is_some());
        assert!(nodes[0].child_error.is_none());
        assert!(nodes[0].is_malformed());
    }

    #[test]
    fn test_empty_template_is_not_malformed() {
        let nodes = parse_tlv(&bytes("A5 00")).unwrap();
        assert!(nodes[0].children.is_empty());
        assert!(!nodes[0].is_malformed());
    }

    #[test]
    fn test_reencoding_is_lossless() {
        let buffers = [
            bytes("6F 1A 84 0E 31 50 41 59 2E 53 59 53 2E 44 44 46 30 31 A5 08 88 01 01 5F 2D 02 65 6E"),
            bytes("77 0E 82 02 39 00 94 08 08 01 03 00 10 01 02 01"),
            bytes("9F 36 02 00 2A 9F 17 01 03"),
        ];

        for buffer in &buffers {
            let nodes = parse_tlv(buffer).unwrap();
            let encoded: Vec<u8> = nodes.iter().flat_map(TlvNode::encode).collect();
            assert_eq!(&encoded, buffer);
        }
    }

    #[test]
    fn test_find_first_is_preorder() {
        let nodes =
            parse_tlv(&bytes("70 0C 61 07 4F 02 A0 01 50 01 41 4F 01 BB")).unwrap();
        let found = find_first(&nodes, &[0x4F]).unwrap();
        assert_eq!(found.value, vec![0xA0, 0x01]);
        assert!(find_first(&nodes, &[0x9F, 0x38]).is_none());
    }

    #[test]
    fn test_encode_length_forms() {
        assert_eq!(encode_length(0x7F), vec![0x7F]);
        assert_eq!(encode_length(0x80), vec![0x81, 0x80]);
        assert_eq!(encode_length(0x0100), vec![0x82, 0x01, 0x00]);
    }
}
