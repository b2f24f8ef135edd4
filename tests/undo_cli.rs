use predicates::str::contains;

mod support;

use support::TestBoard;

#[test]
fn undo_restores_the_last_move() {
    let board = TestBoard::with_layout();
    board.write_task("todo", "U-001", "work");

    board.cmd().args(["mv", "U-001", "done"]).assert().success();
    assert!(board.exists("tasks/done/U-001-work.md"));

    board
        .cmd()
        .arg("undo")
        .assert()
        .success()
        .stdout(contains("restored 1 file(s)"));

    assert!(board.exists("tasks/todo/U-001-work.md"));
    assert!(!board.exists("tasks/done/U-001-work.md"));
    assert!(board
        .read_rel("tasks/todo/U-001-work.md")
        .contains("Status: todo\n"));
}

#[test]
fn undo_reverses_a_whole_batch() {
    let board = TestBoard::with_layout();
    board.write_task("todo", "U-010", "one");
    board.write_task("todo", "U-011", "two");
    board.cmd().arg("snapshot").assert().success();

    let moves = board.write_file(
        "moves.json",
        r#"[{"id": "U-010", "to": "done"}, {"id": "U-011", "to": "review"}]"#,
    );
    board
        .cmd()
        .args(["save", "--moves"])
        .arg(&moves)
        .assert()
        .success();

    board
        .cmd()
        .arg("undo")
        .assert()
        .success()
        .stdout(contains("restored 2 file(s)"));

    assert!(board.exists("tasks/todo/U-010-one.md"));
    assert!(board.exists("tasks/todo/U-011-two.md"));
}

#[test]
fn undo_accepts_an_explicit_operation_id() {
    let board = TestBoard::with_layout();
    board.write_task("todo", "U-020", "first");
    board.write_task("todo", "U-021", "second");

    board.cmd().args(["mv", "U-020", "review"]).assert().success();
    board.cmd().args(["mv", "U-021", "done"]).assert().success();

    let output = board
        .cmd()
        .args(["op", "log", "--json"])
        .output()
        .expect("run sb op log");
    let value = support::stdout_json(&output);

    // Records are newest first; pick the older one
    let older = value["data"]["records"][1].clone();
    assert_eq!(older["command"], "sb mv U-020 review");
    let op_id = older["op_id"].as_str().unwrap();

    board
        .cmd()
        .args(["undo", "--op", op_id])
        .assert()
        .success();

    // Only the targeted operation was reversed
    assert!(board.exists("tasks/todo/U-020-first.md"));
    assert!(board.exists("tasks/done/U-021-second.md"));
}

#[test]
fn undo_with_no_history_fails() {
    let board = TestBoard::with_layout();

    board
        .cmd()
        .arg("undo")
        .assert()
        .failure()
        .code(4)
        .stderr(contains("no undoable operations found"));
}

#[test]
fn undo_rejects_a_malformed_operation_id() {
    let board = TestBoard::with_layout();

    board
        .cmd()
        .args(["undo", "--op", "not-a-uuid"])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("invalid operation id"));
}

#[test]
fn op_log_lists_newest_first() {
    let board = TestBoard::with_layout();
    board.write_task("todo", "U-030", "a");
    board.write_task("todo", "U-031", "b");

    board.cmd().args(["mv", "U-030", "done"]).assert().success();
    board.cmd().args(["mv", "U-031", "done"]).assert().success();

    let output = board
        .cmd()
        .args(["op", "log", "--json"])
        .output()
        .expect("run sb op log");
    let value = support::stdout_json(&output);

    assert_eq!(value["data"]["count"], 2);
    assert_eq!(value["data"]["records"][0]["command"], "sb mv U-031 done");
    assert_eq!(value["data"]["records"][1]["command"], "sb mv U-030 done");

    board
        .cmd()
        .args(["op", "log"])
        .assert()
        .success()
        .stdout(contains("outcome=success"))
        .stdout(contains("moves=[U-031->done]"));
}

#[test]
fn op_log_respects_the_limit() {
    let board = TestBoard::with_layout();
    for (id, slug) in [("U-040", "w"), ("U-041", "x"), ("U-042", "y")] {
        board.write_task("todo", id, slug);
        board.cmd().args(["mv", id, "done"]).assert().success();
    }

    let output = board
        .cmd()
        .args(["op", "log", "--limit", "2", "--json"])
        .output()
        .expect("run sb op log");
    let value = support::stdout_json(&output);
    assert_eq!(value["data"]["count"], 2);
    assert_eq!(value["data"]["records"][0]["command"], "sb mv U-042 done");
}
