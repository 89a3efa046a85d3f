//! Exercises the process-wide job table singleton. Serialized with
//! `serial_test` since every test in this file shares the same global state.

use std::process::{Command, Stdio};

use serial_test::serial;

use crsh::command::{CommandTree, Segment};
use crsh::job_table;

fn tree(name: &str) -> CommandTree {
    CommandTree::build(vec![Segment::new(vec![name.to_string()])], false).unwrap()
}

#[test]
#[serial]
fn register_and_list_a_background_job() {
    let mut child = Command::new("sleep")
        .arg("0.2")
        .stdout(Stdio::null())
        .spawn()
        .expect("spawn sleep");
    let pid = child.id() as i32;

    let number = {
        let mut table = job_table::global().lock().unwrap();
        table.register_background(tree("sleep"), pid)
    };
    assert_eq!(number, 1);

    let rendered = job_table::global().lock().unwrap().list();
    assert!(rendered.contains("sleep"));

    child.wait().expect("wait for sleep");
    let removed = job_table::global().lock().unwrap().remove_by_pid(pid);
    assert!(removed.is_some());
    assert!(job_table::global().lock().unwrap().is_empty());
}

#[test]
#[serial]
fn current_pid_round_trips_through_the_atomic() {
    job_table::set_current_pid(4242);
    assert_eq!(job_table::current_pid(), 4242);
    job_table::clear_current_pid();
    assert_eq!(job_table::current_pid(), 0);
}
