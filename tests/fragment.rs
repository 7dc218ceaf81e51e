use prosemirror::model::{Fragment, IndexError, Node};
use prosemirror::schema_basic::helper::{blockquote, br, doc, em, hr, img, li, p, text, ul};

fn sizes_add_up(fragment: &Fragment) -> bool {
    fragment.size() == fragment.iter().map(Node::node_size).sum::<usize>()
}

#[test]
fn uses_text_runs_for_inline_content() {
    let inline = Fragment::from(vec![text("ab"), em("cd"), br(), text("e")]);
    assert!(inline.is_text_runs());
    assert_eq!(inline.size(), 6);
    assert!(sizes_add_up(&inline));

    let blocks = Fragment::from(vec![p("ab"), hr()]);
    assert!(!blocks.is_text_runs());
    assert!(sizes_add_up(&blocks));
}

#[test]
fn cuts_by_offset() {
    let inline = Fragment::from(vec![text("ab"), em("cd"), text("ef")]);
    assert_eq!(inline.cut(1..5), Fragment::from(vec![text("b"), em("cd"), text("e")]));
    assert_eq!(inline.cut(3..), Fragment::from(vec![em("d"), text("ef")]));
    assert_eq!(inline.cut(2..2), Fragment::new());

    let blocks = Fragment::from(vec![p("abc"), blockquote(p("de"))]);
    assert_eq!(
        blocks.cut(2..8),
        Fragment::from(vec![p("bc"), blockquote(p("d"))])
    );
}

#[test]
fn finds_indices() {
    let inline = Fragment::from(vec![text("ab"), em("cd")]);
    let index = inline.find_index(3, false).unwrap();
    assert_eq!((index.index, index.offset), (1, 2));
    let rounded = inline.find_index(3, true).unwrap();
    assert_eq!((rounded.index, rounded.offset), (2, 4));
    assert_eq!(
        inline.find_index(5, false).unwrap_err(),
        IndexError::Position { pos: 5, size: 4 }
    );
}

#[test]
fn accesses_children() {
    let blocks = Fragment::from(vec![p("a"), hr(), p("b")]);
    assert_eq!(blocks.child_count(), 3);
    assert_eq!(blocks.first_child(), Some(&p("a")));
    assert_eq!(blocks.last_child(), Some(&p("b")));
    assert_eq!(blocks.child(1), Ok(&hr()));
    assert_eq!(
        blocks.child(3).unwrap_err(),
        IndexError::Child { index: 3, count: 3 }
    );
    assert!(blocks.maybe_child(3).is_none());

    let forward: Vec<_> = blocks.iter().map(|n| n.to_string()).collect();
    let mut backward: Vec<_> = blocks.reverse_iter().map(|n| n.to_string()).collect();
    backward.reverse();
    assert_eq!(forward, backward);

    let mut offsets = vec![];
    blocks.for_each(|_, offset, index| offsets.push((offset, index)));
    assert_eq!(offsets, vec![(0, 0), (3, 1), (4, 2)]);
}

#[test]
fn appends_and_merges_text() {
    let left = Fragment::from(vec![text("ab")]);
    let right = Fragment::from(vec![text("cd"), em("e")]);
    let joined = left.append(right);
    assert_eq!(joined.child_count(), 2);
    assert_eq!(joined.first_child(), Some(&text("abcd")));
}

#[test]
fn appends_open_nodes() {
    let left = Fragment::from(vec![blockquote(p("ab"))]);
    let right = Fragment::from(vec![blockquote(p("cd"))]);
    assert_eq!(
        left.append_open(&right, 2, 2).unwrap(),
        Fragment::from(vec![blockquote(p("abcd"))])
    );
    assert_eq!(
        left.append_open(&right, 1, 1).unwrap(),
        Fragment::from(vec![blockquote(vec![p("ab"), p("cd")])])
    );
    assert_eq!(
        left.append_open(&right, 0, 0).unwrap(),
        Fragment::from(vec![blockquote(p("ab")), blockquote(p("cd"))])
    );
}

#[test]
fn closes_open_nodes_that_cannot_join() {
    let left = Fragment::from(vec![ul(li(p("a")))]);
    let right = Fragment::from(vec![blockquote(Fragment::new())]);
    assert_eq!(
        left.append_open(&right, 1, 1).unwrap(),
        Fragment::from(vec![ul(li(p("a"))), blockquote(p(""))])
    );
}

#[test]
fn replaces_children() {
    let blocks = Fragment::from(vec![p("a"), hr()]);
    let replaced = blocks.replace_child(1, p("b")).unwrap();
    assert_eq!(replaced.into_owned(), Fragment::from(vec![p("a"), p("b")]));
    assert!(blocks.replace_child(2, hr()).is_err());

    let inline = Fragment::from(vec![text("a"), img("x.png")]);
    assert_eq!(
        inline.replace_child(0, img("y.png")).unwrap_err(),
        IndexError::TextChild
    );
    assert_eq!(
        inline.replace_child(1, text("b")).unwrap_err(),
        IndexError::TextChild
    );
}

#[test]
fn walks_nodes_between_positions() {
    let d = doc(vec![p("ab"), blockquote(vec![p("cd"), p("ef")]), hr()]);
    let mut seen = vec![];
    d.nodes_between(5..8, |node, pos, _, _| {
        seen.push((node.r#type().name().to_owned(), pos));
        true
    });
    assert_eq!(
        seen,
        vec![
            ("blockquote".to_owned(), 4),
            ("paragraph".to_owned(), 5),
            ("text".to_owned(), 6),
        ]
    );

    let mut count = 0;
    d.descendants(|node, _, _, _| {
        count += 1;
        node.r#type().name() != "blockquote"
    });
    assert_eq!(count, 4);
}

#[test]
fn collects_text() {
    let d = doc(vec![p("one"), hr(), p("two")]);
    assert_eq!(d.text_between(0, d.content_size(), Some("\n"), Some("--")), "one--\ntwo");
    assert_eq!(d.text_between(2, 9, None, None), "netw");
    assert_eq!(d.text_content(), "onetwo");
}
