//! Exercises the process-wide history store singleton, serialized since it
//! is shared process-wide state.

use serial_test::serial;

use crsh::command::{CommandTree, Segment};
use crsh::history;

fn tree(name: &str) -> CommandTree {
    CommandTree::build(vec![Segment::new(vec![name.to_string()])], false).unwrap()
}

#[test]
#[serial]
fn append_and_render_through_the_singleton() {
    let before = history::global().lock().unwrap().len();
    history::global().lock().unwrap().append(tree("pwd"));
    let after = history::global().lock().unwrap().len();
    assert_eq!(after, before + 1);

    let rendered = history::global().lock().unwrap().render();
    assert!(rendered.contains("pwd"));
}
