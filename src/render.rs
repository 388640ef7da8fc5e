//! Purpose: Render a `ResultTree` as indented human-readable text.
//! Exports: `render_tree`.
//! Role: Small, pure formatter used by CLI emission paths.
//! Invariants: With color disabled the output contains no ANSI escapes.
//! Invariants: Rendering preserves leaf values byte for byte.

use domreg::api::{Node, ResultTree};

const INDENT: &str = "  ";

// Conservative 8/16-color palette for broad terminal compatibility.
const COLOR_KEY: &str = "36";
const COLOR_VALUE: &str = "32";

pub fn render_tree(tree: &ResultTree, use_color: bool) -> String {
    let mut out = String::new();
    write_tree(tree, 0, use_color, &mut out);
    out
}

fn write_tree(tree: &ResultTree, depth: usize, use_color: bool, out: &mut String) {
    for (key, node) in tree.iter() {
        for _ in 0..depth {
            out.push_str(INDENT);
        }
        push_colored(key, COLOR_KEY, use_color, out);
        match node {
            Node::Leaf(value) => {
                out.push_str(": ");
                push_colored(value, COLOR_VALUE, use_color, out);
                out.push('\n');
            }
            Node::Tree(children) => {
                out.push('\n');
                write_tree(children, depth + 1, use_color, out);
            }
        }
    }
}

fn push_colored(text: &str, color: &str, use_color: bool, out: &mut String) {
    if use_color {
        out.push_str("\u{1b}[");
        out.push_str(color);
        out.push('m');
        out.push_str(text);
        out.push_str("\u{1b}[0m");
    } else {
        out.push_str(text);
    }
}

#[cfg(test)]
mod tests {
    use super::render_tree;
    use domreg::api::decode;

    #[test]
    fn plain_rendering_nests_by_indent() {
        let tree = decode("domain.name: example.com\ndomain.ns.0: ns1.example.net");
        let text = render_tree(&tree, false);
        assert_eq!(
            text,
            "domain\n  name: example.com\n  ns\n    0: ns1.example.net\n"
        );
    }

    #[test]
    fn color_off_output_has_no_escapes() {
        let tree = decode("a: 1");
        assert!(!render_tree(&tree, false).contains('\u{1b}'));
        assert!(render_tree(&tree, true).contains('\u{1b}'));
    }

    #[test]
    fn values_render_verbatim() {
        let tree = decode("a.note: status: ok");
        assert!(render_tree(&tree, false).contains("note: status: ok"));
    }
}
