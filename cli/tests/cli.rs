#![cfg(unix)]

use std::{
    path::{Path, PathBuf},
    process::{Command, Output},
};

struct Workspace {
    dir: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = std::env::temp_dir().join(format!(
            "judgekit-cli-test-{:016x}",
            rand::random::<u64>()
        ));
        fsutil::mkdir_all(dir.join("tests")).unwrap();
        Self { dir }
    }

    fn add_test(&self, name: &str, input: &str, answer: Option<&str>) {
        fsutil::write(self.tests().join(name), input).unwrap();
        if let Some(answer) = answer {
            fsutil::write(self.tests().join(format!("{}.a", name)), answer).unwrap();
        }
    }

    fn tests(&self) -> PathBuf {
        self.dir.join("tests")
    }

    fn out(&self) -> PathBuf {
        self.dir.join("out")
    }

    fn run(&self, solution: &str, checker: &str, extra: &[&str]) -> Output {
        let mut cmd = judgekit();
        cmd.arg("run")
            .arg("--solution")
            .arg(solution)
            .arg("--checker")
            .arg(checker)
            .arg("--tests")
            .arg(self.tests())
            .arg("--out")
            .arg(self.out())
            .args(extra);
        cmd.output().unwrap()
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

fn judgekit() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_judgekit"));
    cmd.env("NO_COLOR", "1")
        .env("CLICOLOR", "0")
        .env_remove("RUST_LOG")
        .current_dir(std::env::temp_dir());
    cmd
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn have_coreutils() -> bool {
    ["/bin/cat", "/bin/true", "/bin/false"]
        .iter()
        .all(|p| Path::new(p).is_file())
}

#[test]
fn no_tests_should_pass() {
    let ws = Workspace::new();
    ws.add_test("README", "not a test", None);

    let out = ws.run("/bin/sh", "/bin/sh", &[]);
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(stdout(&out), "No tests found; passing by default.\n");
    assert!(ws.out().is_dir());
}

#[test]
fn accepted_answers_should_pass() {
    if !have_coreutils() {
        return;
    }
    let ws = Workspace::new();
    ws.add_test("001.t", "7\n", Some("7\n"));
    ws.add_test("002.t", "8\n", Some("8\n"));

    let out = ws.run("/bin/cat", "/bin/true", &["--timeout", "5"]);
    assert_eq!(out.status.code(), Some(0), "{}", stdout(&out));
    assert_eq!(
        stdout(&out),
        "Passed: 001.t\nPassed: 002.t\nAll tests passed.\n"
    );
    assert_eq!(
        fsutil::read_to_string(ws.out().join("001.t.out")).unwrap(),
        "7\n"
    );
    assert!(ws.out().join("002.t.stderr").is_file());
    assert!(ws.out().join("002.t.cmp.stderr").is_file());
}

#[test]
fn runtime_failure_should_exit_with_solution_status() {
    if !have_coreutils() {
        return;
    }
    let ws = Workspace::new();
    ws.add_test("001.t", "7\n", Some("7\n"));
    ws.add_test("002.t", "8\n", Some("8\n"));

    let out = ws.run("/bin/false", "/bin/true", &[]);
    assert_eq!(out.status.code(), Some(1));
    let transcript = stdout(&out);
    assert!(transcript.starts_with("::error::Runtime error on test 001.t (exit status 1)\n"));
    assert!(ws.out().join("001.t.stderr").is_file());
    assert!(!ws.out().join("001.t.cmp.stderr").exists());
    assert!(!ws.out().join("002.t.out").exists());
}

#[test]
fn rejected_answer_should_fail() {
    if !have_coreutils() {
        return;
    }
    let ws = Workspace::new();
    ws.add_test("001.t", "7\n", Some("7\n"));

    let out = ws.run("/bin/cat", "/bin/false", &["--terse"]);
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(stdout(&out), "::error::Test 001.t failed.\n");
}

#[test]
fn missing_answer_should_be_config_error() {
    if !have_coreutils() {
        return;
    }
    let ws = Workspace::new();
    ws.add_test("001.t", "7\n", None);

    let out = ws.run("/bin/cat", "/bin/true", &[]);
    assert_eq!(out.status.code(), Some(2));
    assert!(stdout(&out).starts_with("::error::Missing answer file for 001.t"));
}

#[test]
fn missing_solution_should_be_config_error() {
    let ws = Workspace::new();
    let missing = ws.dir.join("no-solution");

    let out = ws.run(&missing.to_string_lossy(), "/bin/sh", &[]);
    assert_eq!(out.status.code(), Some(2));
    assert!(stdout(&out).starts_with("::error::Solution binary not found at "));
}

#[test]
fn config_file_should_be_applied() {
    if !have_coreutils() {
        return;
    }
    let ws = Workspace::new();
    ws.add_test("a.in", "1\n", None);
    fsutil::write(ws.tests().join("a.in.ans"), "1\n").unwrap();
    let config = ws.dir.join("judgekit.toml");
    fsutil::write(
        &config,
        "[tests]\ninput_pattern = \"*.in\"\nanswer_suffix = \".ans\"\n\n[report]\nerror_prefix = \"E: \"\nexit_code = \"fixed\"\n",
    )
    .unwrap();

    let mut cmd = judgekit();
    cmd.arg("--config").arg(&config);
    let out = cmd
        .arg("run")
        .arg("--solution")
        .arg("/bin/false")
        .arg("--checker")
        .arg("/bin/true")
        .arg("--tests")
        .arg(ws.tests())
        .arg("--out")
        .arg(ws.out())
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(stdout(&out).starts_with("E: Runtime error on test a.in (exit status 1)"));
}

#[test]
fn invalid_config_file_should_exit_with_2() {
    let ws = Workspace::new();
    let config = ws.dir.join("broken.toml");
    fsutil::write(&config, "[report]\nverbosity = 3\n").unwrap();

    let out = judgekit()
        .arg("--config")
        .arg(&config)
        .arg("list")
        .arg("--tests")
        .arg(ws.tests())
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn list_should_print_testcases_as_json() {
    let ws = Workspace::new();
    ws.add_test("002.t", "", Some(""));
    ws.add_test("001.t", "", None);

    let out = judgekit()
        .arg("list")
        .arg("--tests")
        .arg(ws.tests())
        .arg("--json")
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(0));

    let json = stdout(&out);
    let first = json.find("\"001.t\"").unwrap();
    let second = json.find("\"002.t\"").unwrap();
    assert!(first < second, "{}", json);
    assert!(json.contains("\"answer_path\""));
}
