mod common;

use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use common::{harness, wait, wait_idle};
use lark_script::paths::BaseDirs;
use lark_script::{ExecutionRequest, FailureKind, RunOutcome, completion_channel};

const BLOCKED: &str = r#"gate::enter(); while !gate::is_open() {} gate::exit(); print("A");"#;

#[test]
fn queued_requests_run_in_order() {
    let h = harness();
    let mut waits = Vec::new();
    for source in [BLOCKED, r#"print("B");"#, r#"print("C");"#] {
        let (tx, rx) = completion_channel();
        assert!(
            h.plugin
                .submit(ExecutionRequest::statement(source).with_completion(tx), true)
        );
        waits.push(rx);
    }
    assert!(h.plugin.consumer_busy());

    h.gate.open();
    for rx in waits {
        assert_eq!(wait(rx), RunOutcome::Completed);
    }
    assert_eq!(h.console.output(), "A\nB\nC\n");
}

#[test]
fn busy_worker_rejects_unqueued_request() {
    let h = harness();
    let (tx, rx) = completion_channel();
    assert!(
        h.plugin
            .submit(ExecutionRequest::statement(BLOCKED).with_completion(tx), false)
    );
    assert!(
        !h.plugin
            .submit(ExecutionRequest::statement(r#"print("B");"#), false)
    );

    h.gate.open();
    assert_eq!(wait(rx), RunOutcome::Completed);
    wait_idle(&h.plugin);
    assert!(!h.console.output().contains('B'));

    assert!(
        h.plugin
            .submit(ExecutionRequest::statement(r#"print("late");"#), false)
    );
    assert!(h.console.wait_for_output("late"));
}

#[test]
fn synchronous_run_waits_for_worker() {
    let h = harness();
    assert!(h.plugin.submit(ExecutionRequest::statement(BLOCKED), true));
    h.gate.wait_entered(1);

    let gate = Arc::clone(&h.gate);
    let opener = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        gate.open();
    });

    let outcome = h
        .plugin
        .run_synchronously(ExecutionRequest::statement(r#"print("S");"#));
    assert_eq!(outcome, Some(RunOutcome::Completed));
    assert_eq!(h.console.output(), "A\nS\n");
    opener.join().unwrap();
}

#[test]
fn state_persists_between_requests() {
    let h = harness();
    let run = |source: &str| {
        h.plugin
            .run_synchronously(ExecutionRequest::statement(source))
            .unwrap()
    };
    assert!(run("let x = 40;").is_completed());
    assert!(run("fn double(a) { a * 2 }").is_completed());
    assert!(run("print(double(x + 1));").is_completed());
    assert!(run("print(ARGV[1]);").is_completed());
    assert_eq!(h.console.output(), "82\n--test\n");
}

#[test]
fn script_error_is_reported_and_worker_survives() {
    let h = harness();
    let (tx, rx) = completion_channel();
    h.plugin.submit(
        ExecutionRequest::statement(r#"throw "boom";"#).with_completion(tx),
        true,
    );

    let RunOutcome::Faulted(diagnostic) = wait(rx) else {
        panic!("expected a fault");
    };
    assert_eq!(diagnostic.kind, FailureKind::Faulted);
    assert_eq!(diagnostic.error_type, "RuntimeError");

    let errors = h.console.errors();
    assert!(errors.starts_with("Traceback (most recent call last):"));
    assert!(errors.contains("boom"));
    assert_eq!(h.console.shown(), 1);

    let (tx, rx) = completion_channel();
    h.plugin.submit(
        ExecutionRequest::statement(r#"print("after");"#).with_completion(tx),
        true,
    );
    assert_eq!(wait(rx), RunOutcome::Completed);
    assert_eq!(h.console.output(), "after\n");
}

#[test]
fn error_reporting_follows_settings() {
    let h = harness();
    h.settings.update(|s| {
        s.add_extra_line_to_output = true;
        s.open_console_on_error = false;
    });

    let outcome = h
        .plugin
        .run_synchronously(ExecutionRequest::statement("undefined_fn();"))
        .unwrap();
    assert_eq!(outcome.diagnostic().unwrap().error_type, "FunctionNotFound");
    assert_eq!(h.console.output(), "\n");
    assert_eq!(h.console.shown(), 0);
}

#[test]
fn scripts_change_settings() {
    let h = harness();
    let outcome = h
        .plugin
        .run_synchronously(ExecutionRequest::statement(
            "lark::config::set_add_extra_line_to_output(true);",
        ))
        .unwrap();
    assert!(outcome.is_completed());
    assert!(h.plugin.settings().get().add_extra_line_to_output);
}

#[test]
fn missing_file_is_io_error() {
    let h = harness();
    let outcome = h
        .plugin
        .run_synchronously(ExecutionRequest::file("/nonexistent/script.rhai"))
        .unwrap();
    assert_eq!(outcome.diagnostic().unwrap().error_type, "IOError");
}

#[test]
fn startup_scripts_run_machine_then_user() {
    let machine = tempfile::tempdir().unwrap();
    let user = tempfile::tempdir().unwrap();
    fs::create_dir_all(machine.path().join("scripts")).unwrap();
    fs::create_dir_all(user.path().join("scripts")).unwrap();
    fs::create_dir_all(user.path().join("lib")).unwrap();

    fs::write(
        machine.path().join("scripts/startup.rhai"),
        r#"print("machine");"#,
    )
    .unwrap();
    fs::write(
        user.path().join("lib/helper.rhai"),
        r#"fn greet() { "from helper" }"#,
    )
    .unwrap();
    fs::write(
        user.path().join("scripts/startup.rhai"),
        r#"import "helper" as h; print(h::greet());"#,
    )
    .unwrap();

    let (builder, console, ..) = common::builder(BaseDirs::new(machine.path(), user.path()));
    let plugin = builder.build();
    plugin.run_startup_scripts();

    assert_eq!(console.output(), "machine\nfrom helper\n");
    assert!(console.errors().is_empty());
}

#[test]
fn failed_initialization_disables_scripting() {
    let (builder, console, ..) = common::builder(BaseDirs::new("/m", "/u"));
    let plugin = builder.bootstrap(r#"throw "runtime missing";"#).build();

    assert!(!plugin.submit(ExecutionRequest::statement("1;"), true));
    assert!(
        plugin
            .run_synchronously(ExecutionRequest::statement("1;"))
            .is_none()
    );
    assert!(!plugin.consumer_busy());

    let errors = console.errors();
    assert_eq!(errors.matches("Scripting is unavailable").count(), 1);
    assert!(errors.contains("runtime missing"));
}

#[test]
fn foreign_state_is_refused() {
    let h = harness();
    let other = harness();
    let foreign = other.plugin.initialize().unwrap();

    let outcome = h
        .plugin
        .run_synchronously(ExecutionRequest::statement("1;").with_owner(foreign))
        .unwrap();
    assert_eq!(outcome.diagnostic().unwrap().error_type, "EngineError");
}

#[test]
fn at_most_one_request_active() {
    let h = Arc::new(harness());
    h.gate.open();
    let script = "gate::enter(); let n = 0; while n < 200 { n += 1; } gate::exit();";

    let producers: Vec<_> = (0..4)
        .map(|_| {
            let h = Arc::clone(&h);
            thread::spawn(move || {
                let mut waits = Vec::new();
                for _ in 0..5 {
                    let (tx, rx) = completion_channel();
                    assert!(
                        h.plugin
                            .submit(ExecutionRequest::statement(script).with_completion(tx), true)
                    );
                    waits.push(rx);
                }
                for _ in 0..3 {
                    let outcome = h
                        .plugin
                        .run_synchronously(ExecutionRequest::statement(script));
                    assert_eq!(outcome, Some(RunOutcome::Completed));
                }
                waits
            })
        })
        .collect();

    for producer in producers {
        for rx in producer.join().unwrap() {
            assert_eq!(wait(rx), RunOutcome::Completed);
        }
    }
    assert_eq!(h.gate.entered(), 4 * 8);
    assert_eq!(h.gate.max_active(), 1);
}

#[test]
fn stop_command_tracks_the_queue() {
    let h = harness();
    let (tx, rx) = completion_channel();
    h.plugin.submit(
        ExecutionRequest::statement(r#"print("x");"#).with_completion(tx),
        true,
    );
    wait(rx);
    wait_idle(&h.plugin);

    // queue_complete runs just after busy clears
    let start = std::time::Instant::now();
    while h.menu.states().len() < 2 {
        assert!(start.elapsed() < common::TIMEOUT);
        thread::sleep(Duration::from_millis(2));
    }
    assert_eq!(h.menu.states(), vec![true, false]);
}

#[test]
fn run_script_respects_busy_worker() {
    let h = harness();
    assert!(h.plugin.run_script(ExecutionRequest::statement(BLOCKED), false));
    h.gate.wait_entered(1);

    let inline = || ExecutionRequest::statement(r#"print("S");"#).synchronous();
    assert!(!h.plugin.run_script(inline(), false));

    h.gate.open();
    wait_idle(&h.plugin);
    assert!(h.plugin.run_script(inline(), false));
    assert_eq!(h.console.output(), "A\nS\n");
}
