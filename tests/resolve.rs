use prosemirror::model::{Node, ResolveErr};
use prosemirror::schema_basic::helper::{blockquote, doc, em, p, strong, text};

fn sample() -> Node {
    doc((p("ab"), blockquote(p("cd"))))
}

#[test]
fn resolves_into_nested_paragraphs() {
    let d = sample();
    let rp = d.resolve(6).unwrap();
    assert_eq!(rp.depth(), 2);
    assert_eq!(rp.parent_offset(), 0);
    assert_eq!(rp.parent(), &p("cd"));
    assert_eq!(rp.node(1), &blockquote(p("cd")));
    assert_eq!(rp.index(0), 1);
    assert_eq!(rp.start(2), 6);
    assert_eq!(rp.end(2), 8);
    assert_eq!(rp.before(2), Some(5));
    assert_eq!(rp.after(2), Some(9));
    assert_eq!(rp.before(1), Some(4));
    assert_eq!(rp.after(1), Some(10));
    assert_eq!(rp.before(0), None);
    assert!(rp.node_before().is_none());
    assert_eq!(rp.node_after().unwrap().text(), Some("cd"));
}

#[test]
fn positions_compose_from_their_path() {
    let d = sample();
    for pos in 0..=d.content_size() {
        let rp = d.resolve(pos).unwrap();
        assert_eq!(rp.pos(), pos);
        assert_eq!(rp.start(rp.depth()) + rp.parent_offset(), pos);
        assert_eq!(rp.path().len(), rp.depth() + 1);
    }
}

#[test]
fn cuts_text_around_the_position() {
    let d = doc(p(vec![text("ab"), em("cd")]));
    let rp = d.resolve(4).unwrap();
    assert_eq!(rp.text_offset(), 1);
    assert_eq!(rp.node_before().unwrap().into_owned(), em("c"));
    assert_eq!(rp.node_after().unwrap().into_owned(), em("d"));
    assert_eq!(rp.marks(), em("x").marks().clone());

    let between = d.resolve(3).unwrap();
    assert_eq!(between.text_offset(), 0);
    assert_eq!(between.node_before().unwrap().into_owned(), text("ab"));
    assert!(between.marks().is_empty());
}

#[test]
fn rejects_positions_out_of_range() {
    let d = sample();
    assert_eq!(
        d.resolve(11).unwrap_err(),
        ResolveErr::RangeError { pos: 11 }
    );
}

#[test]
fn rejects_positions_inside_a_character() {
    let d = doc(p("a\u{1F60A}b"));
    assert_eq!(
        d.resolve(3).unwrap_err(),
        ResolveErr::InsideCharacter { pos: 3 }
    );
    assert!(d.slice(1..3, false).is_err());

    let rp = d.resolve(4).unwrap();
    assert_eq!(rp.text_offset(), 3);
    assert_eq!(rp.node_before().unwrap().into_owned(), text("a\u{1F60A}"));
    assert_eq!(rp.node_after().unwrap().into_owned(), text("b"));
    assert_eq!(d.slice(2..4, false).unwrap().size(), 2);
}

#[test]
fn compares_positions() {
    let d = doc((p("ab"), p(vec![strong("cd")])));
    let a = d.resolve(1).unwrap();
    let b = d.resolve(3).unwrap();
    let c = d.resolve(6).unwrap();
    assert!(a.same_parent(&b));
    assert!(!a.same_parent(&c));
    assert_eq!(a.same_depth(&b), 1);
    assert_eq!(a.same_depth(&c), 0);
    assert_eq!(a.shared_depth(3), 1);
    assert_eq!(a.shared_depth(6), 0);
    assert_eq!(c.pos_at_index(1, 0), Ok(4));
    assert!(c.pos_at_index(3, 0).is_err());
}

#[test]
fn finds_block_ranges() {
    let d = doc((p("ab"), blockquote((p("cd"), p("ef")))));
    let a = d.resolve(7).unwrap();
    let b = d.resolve(11).unwrap();
    let range = a.block_range(&b, |_| true).unwrap();
    assert_eq!(range.depth, 1);
    assert_eq!(range.parent(), &blockquote((p("cd"), p("ef"))));
    assert_eq!((range.start(), range.end()), (5, 13));
    assert_eq!((range.start_index(), range.end_index()), (0, 2));

    let outer = a.block_range(&b, |n| n.r#type().name() == "doc").unwrap();
    assert_eq!(outer.depth, 0);
    assert_eq!((outer.start_index(), outer.end_index()), (1, 2));

    let same = a.block_range(&a, |_| true).unwrap();
    assert_eq!(same.depth, 1);
    assert_eq!((same.start(), same.end()), (5, 9));
}
