//! End-to-end behaviour through the library API.

use std::fs;
use std::path::Path;

use sigil::config::Settings;
use sigil::console::Console;
use sigil::script::value::Value;
use sigil::script::{Interpreter, Outcome};
use sigil::session::Session;
use tempfile::TempDir;

fn session_in(dir: &Path, undo_limit: usize) -> Session {
    let settings = Settings {
        home: dir.join("home"),
        undo_limit,
        external_fallback: false,
        ..Settings::default()
    };
    let mut session = Session::new(settings).unwrap();
    session.cwd = dir.to_path_buf();
    session
}

fn shell() -> (TempDir, Interpreter) {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session_in(dir.path(), 200);
    session.persist = false;
    (dir, Interpreter::new(session, Console::captured()))
}

fn lines(it: &Interpreter) -> Vec<String> {
    it.console().lines().to_vec()
}

// ── Control flow ──────────────────────────────────────────────────────────────

#[test]
fn loop_case_and_goto_together() {
    let (_dir, mut it) = shell();
    let src = "\
let seen = x
rpt 3
case seen
when x
say first
let seen = xx
when xx
say second
goto leave
endcase
endrpt
leave:
say out";
    assert_eq!(it.run_script(src), Outcome::Completed(0));
    assert_eq!(lines(&it), ["first", "second", "out"]);
}

#[test]
fn interpolation_in_arguments() {
    let (_dir, mut it) = shell();
    it.run_script("let name = Ada\nlet n = 3\nsay \"hi ${name}, n=$n\" 'name'");
    assert_eq!(lines(&it), ["hi Ada, n=3 Ada"]);
}

#[test]
fn alias_cycle_terminates() {
    let (_dir, mut it) = shell();
    let outcome = it.run_script("alia ping pong\nalia pong ping\nping\nsay alive");
    assert_eq!(outcome, Outcome::Completed(0));
    assert_eq!(lines(&it), ["alive"]);
    assert_eq!(it.console().errors().len(), 1);
}

#[test]
fn function_error_stops_function_only() {
    let (_dir, mut it) = shell();
    it.run_script("fn f say one ;; div 1 0 ;; say two\ncall f\nsay three");
    assert_eq!(lines(&it), ["one", "three"]);
    assert_eq!(it.console().errors(), ["div: division by zero"]);
}

#[test]
fn exit_from_nested_script() {
    let (dir, mut it) = shell();
    fs::write(dir.path().join("inner.sig"), "say inner\nexit 4\nsay never").unwrap();
    let outcome = it.run_script("run inner.sig\nsay never");
    assert_eq!(outcome, Outcome::Exit(4));
    assert_eq!(lines(&it), ["inner"]);
}

// ── Script files ──────────────────────────────────────────────────────────────

#[test]
fn script_file_sees_its_arguments_and_dir() {
    let (dir, mut it) = shell();
    let path = dir.path().join("main.sig");
    fs::write(&path, "arg count\narg 1\nrun sub.sig inner\narg 1\nsay ${script.dir}").unwrap();
    fs::write(dir.path().join("sub.sig"), "arg 1").unwrap();

    let outcome = it.run_file(&path, vec!["outer".into(), "two".into()]).unwrap();
    assert_eq!(outcome, Outcome::Completed(0));
    let canonical = fs::canonicalize(dir.path()).unwrap();
    assert_eq!(lines(&it), ["2", "outer", "inner", "outer", &canonical.display().to_string()]);
}

#[test]
fn missing_script_file_is_an_error() {
    let (dir, mut it) = shell();
    assert!(it.run_file(&dir.path().join("absent.sig"), Vec::new()).is_err());
}

// ── Journal ───────────────────────────────────────────────────────────────────

#[test]
fn undo_then_redo_restores_state() {
    let (dir, mut it) = shell();
    let f = dir.path().join("notes.txt");
    it.run_script("mk file notes.txt hello\ndlt notes.txt");
    assert!(!f.exists());

    it.run_script("undo");
    assert_eq!(fs::read_to_string(&f).unwrap(), "hello");
    it.run_script("redo");
    assert!(!f.exists());
    it.run_script("undo\nundo");
    assert!(!f.exists());
    it.run_script("redo");
    assert_eq!(fs::read_to_string(&f).unwrap(), "hello");
}

#[test]
fn oldest_actions_are_evicted() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session_in(dir.path(), 2);
    session.persist = false;
    let mut it = Interpreter::new(session, Console::captured());

    it.run_script("mk file a.txt\nmk file b.txt\nmk file c.txt\nundo\nundo\nundo");
    assert!(dir.path().join("a.txt").exists());
    assert!(!dir.path().join("b.txt").exists());
    assert!(!dir.path().join("c.txt").exists());
    assert_eq!(it.console().lines().last().map(String::as_str), Some("nothing to undo"));
    assert_eq!(it.session().vars.status(), 1);
}

// ── Profiles ──────────────────────────────────────────────────────────────────

#[test]
fn definitions_persist_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let mut first = Interpreter::new(session_in(dir.path(), 200), Console::captured());
    first.run_script("let colour = \"dark red\"\nlet -r pi = 3.14\nalia ll pwd\nfn hi say hi ;; say there");
    drop(first);

    let mut second = Interpreter::new(session_in(dir.path(), 200), Console::captured());
    assert_eq!(second.load_profile(), Outcome::Completed(0));
    let s = second.session();
    assert_eq!(s.vars.get("colour"), Some(&Value::Str("dark red".into())));
    assert_eq!(s.vars.get("pi"), Some(&Value::Float(3.14)));
    assert!(s.vars.is_readonly("pi"));
    assert_eq!(s.aliases.get("ll"), Some("pwd"));

    second.run_script("call hi");
    assert_eq!(lines(&second), ["hi", "there"]);
}

#[test]
fn no_persist_leaves_home_untouched() {
    let (dir, mut it) = shell();
    it.run_script("let a = 1\nalia x say");
    assert!(!dir.path().join("home").join(".sigilrc").exists());
}
