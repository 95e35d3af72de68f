//! Dump all TLV tags found on card, including unknown ones

use emv_card::DecodedBuffer;
use emv_common::{get_tag_name, TlvNode};

/// Print one collected buffer with its decoded tree
pub fn dump_buffer(buffer: &DecodedBuffer<'_>) {
    println!("{} ({} bytes):", buffer.label, buffer.raw.len());

    match &buffer.nodes {
        Ok(nodes) => dump_all_tags(nodes, 1),
        Err(err) => {
            println!("  (Not valid TLV: {})", err);
            println!("  {}", hex::encode_upper(buffer.raw));
        }
    }
}

/// Display a decoded TLV tree, constructed tags indented under their parent
pub fn dump_all_tags(nodes: &[TlvNode], indent: usize) {
    let indent_str = " ".repeat(indent * 2);

    for node in nodes {
        let tag_name = get_tag_name(node.tag.as_bytes());
        print!("{}[{}] {}: ", indent_str, node.tag, tag_name);

        if node.is_constructed() && (!node.children.is_empty() || node.child_error.is_some()) {
            println!("({} bytes)", node.length);
            dump_all_tags(&node.children, indent + 1);
            if let Some(err) = &node.child_error {
                println!("{}  (Malformed: {})", indent_str, err);
            }
        } else if node.value.len() <= 32 {
            println!("{}", hex::encode_upper(&node.value));
        } else {
            println!(
                "{}... ({} bytes)",
                hex::encode_upper(&node.value[..32]),
                node.value.len()
            );
        }
    }
}
