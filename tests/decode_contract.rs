//! Purpose: Public decoding contract for dotted key/value reply bodies.
//! Exports: None (integration test module).
//! Role: Pin the decoder guarantees callers rely on, via the public API only.
//! Invariants: Decoding is total; merge order is input line order.

use domreg::api::{Node, ResultTree, decode};

fn leaf<'a>(tree: &'a ResultTree, path: &[&str]) -> Option<&'a str> {
    tree.at_path(path).and_then(Node::as_leaf)
}

#[test]
fn single_leaf_decodes_to_top_level_entry() {
    let tree = decode("a: 1");
    assert_eq!(tree.leaf("a"), Some("1"));
    assert_eq!(tree.len(), 1);
}

#[test]
fn dotted_key_decodes_to_nested_containers() {
    let tree = decode("a.b.c: x");
    assert_eq!(leaf(&tree, &["a", "b", "c"]), Some("x"));
}

#[test]
fn sibling_paths_share_their_container() {
    let forward = decode("a.b: 1\na.c: 2");
    let reverse = decode("a.c: 2\na.b: 1");
    assert_eq!(forward, reverse);
    assert_eq!(leaf(&forward, &["a", "b"]), Some("1"));
    assert_eq!(leaf(&forward, &["a", "c"]), Some("2"));
}

#[test]
fn duplicate_leaves_resolve_to_the_later_line() {
    let tree = decode("a: 1\na: 2");
    assert_eq!(tree.leaf("a"), Some("2"));
}

#[test]
fn structural_conflicts_resolve_to_the_later_line() {
    let tree = decode("a: 1\na.b: 2");
    assert_eq!(leaf(&tree, &["a", "b"]), Some("2"));

    let reversed = decode("a.b: 2\na: 1");
    assert_eq!(reversed.leaf("a"), Some("1"));
    assert!(reversed.subtree("a").is_none());
}

#[test]
fn unrecognized_lines_are_dropped_without_fault() {
    let tree = decode("a: 1\nnotavalidline\n\nkey:value-without-space\nb: 2");
    assert_eq!(tree.leaf("a"), Some("1"));
    assert_eq!(tree.leaf("b"), Some("2"));
    assert_eq!(tree.len(), 2);
}

#[test]
fn empty_body_decodes_to_empty_tree() {
    assert!(decode("").is_empty());
}

#[test]
fn decoding_identical_bodies_is_deterministic() {
    let body = "domain.ns.0: ns1\ndomain.ns.0: ns1\ndomain.name: example.com";
    assert_eq!(decode(body), decode("domain.ns.0: ns1\ndomain.name: example.com"));
}

#[test]
fn values_are_verbatim_after_the_first_separator() {
    let tree = decode("whois.raw: created: 2001-01-01; status: ok");
    assert_eq!(
        leaf(&tree, &["whois", "raw"]),
        Some("created: 2001-01-01; status: ok")
    );
}

#[test]
fn crlf_and_lf_bodies_decode_identically() {
    assert_eq!(
        decode("domain.name: example.com\r\ndomain.status: active\r\n"),
        decode("domain.name: example.com\ndomain.status: active\n"),
    );
}

#[test]
fn numbered_siblings_stay_string_keyed_containers() {
    let tree = decode("domain.ns.0: ns1.example.net\ndomain.ns.1: ns2.example.net");
    let ns = tree
        .subtree("domain")
        .and_then(|domain| domain.subtree("ns"))
        .expect("ns container");
    assert_eq!(ns.leaf("0"), Some("ns1.example.net"));
    assert_eq!(ns.leaf("1"), Some("ns2.example.net"));
    assert_eq!(ns.len(), 2);
}

#[test]
fn realistic_reply_body_decodes_fully() {
    let body = "\
domain.name: example.com
domain.status: active
domain.expires: 2027-03-01
domain.ns.0: ns1.example.net
domain.ns.1: ns2.example.net
domain.contact.owner.handle: C-12345
domain.contact.owner.email: owner@example.com
account.balance: 42.50
";
    let tree = decode(body);
    assert_eq!(leaf(&tree, &["domain", "status"]), Some("active"));
    assert_eq!(
        leaf(&tree, &["domain", "contact", "owner", "handle"]),
        Some("C-12345")
    );
    assert_eq!(leaf(&tree, &["account", "balance"]), Some("42.50"));
}
