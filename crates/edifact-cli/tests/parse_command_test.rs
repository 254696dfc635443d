use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

fn cargo_bin() -> PathBuf {
    if let Ok(path) = env::var("CARGO_BIN_EXE_edifact") {
        return PathBuf::from(path);
    }

    let target_dir = env::var("CARGO_TARGET_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| repo_root().join("target"));
    let executable_name = format!("edifact{}", std::env::consts::EXE_SUFFIX);
    let fallback = target_dir.join("debug").join(executable_name);

    if fallback.exists() {
        return fallback;
    }

    panic!(
        "CARGO_BIN_EXE_edifact is not set and fallback binary was not found at {}",
        fallback.display()
    );
}

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

fn testdata_path(path: &str) -> String {
    repo_root().join(path).to_string_lossy().into_owned()
}

fn write_file(dir: &Path, name: &str, content: &[u8]) -> String {
    let path = dir.join(name);
    fs::write(&path, content).expect("temporary file should be writable");
    path.to_string_lossy().into_owned()
}

fn run_edifact(args: &[&str]) -> Output {
    Command::new(cargo_bin())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("run edifact")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "expected success; stdout: {}; stderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should contain valid JSON")
}

#[test]
fn parse_command_outputs_json_to_stdout() {
    let input = testdata_path("testdata/edi/desadv_d01b.edi");
    let output = run_edifact(&["parse", &input, "--pretty"]);

    let json = stdout_json(&output);
    let interchange = &json["edifactJson"];
    assert_eq!(interchange["sender"]["id"], "1234567891234");
    assert_eq!(interchange["receiver"]["id"], "4321987654321");
    assert_eq!(interchange["datetime"]["date"], "250725");
    assert_eq!(interchange["messages"][0]["messageType"]["messageType"], "DESADV");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Parse summary: interchanges=1, messages=1"), "{stderr}");
}

#[test]
fn multiple_inputs_produce_an_array_in_order() {
    let output = run_edifact(&[
        "parse",
        &testdata_path("testdata/edi/desadv_d01b.edi"),
        &testdata_path("testdata/edi/insdes_d01b_no_una.edi"),
    ]);

    let json = stdout_json(&output);
    let items = json.as_array().expect("output should be an array");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["edifactJson"]["controlRef"], "38190");
    assert_eq!(items[1]["edifactJson"]["controlRef"], "000000000001");
}

#[test]
fn control_count_failure_names_the_item() {
    let output = run_edifact(&[
        "parse",
        &testdata_path("testdata/edi/desadv_d01b.edi"),
        &testdata_path("testdata/edi/desadv_d01b_bad_count.edi"),
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: Failed to convert EDIFACT to JSON"), "{stderr}");
    assert!(stderr.contains("(item 1)"), "{stderr}");
    assert!(stderr.contains("3819000001"), "{stderr}");
    assert!(output.stdout.is_empty());
}

#[test]
fn custom_delimiters_without_una() {
    let dir = TempDir::new().unwrap();
    let input = write_file(
        dir.path(),
        "custom.edi",
        b"UNB=UNOC*3=SENDER=RECEIVER=250725*1503=7~UNH=1=DESADV*D*01B*UN~UNT=2=1~UNZ=1=7~",
    );

    let output = run_edifact(&["parse", &input, "--no-una", "--delimiters", "*=,# ~"]);
    let json = stdout_json(&output);
    assert_eq!(json["edifactJson"]["sender"]["id"], "SENDER");
    assert_eq!(json["edifactJson"]["separators"]["element"], "=");
    assert_eq!(json["edifactJson"]["separators"]["segment"], "~");
}

#[test]
fn five_delimiters_are_a_configuration_error() {
    let output = run_edifact(&[
        "parse",
        &testdata_path("testdata/edi/insdes_d01b_no_una.edi"),
        "--no-una",
        "--delimiters",
        "*=,#~",
    ]);

    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("exactly 6"), "{stderr}");
}

#[test]
fn invalid_config_returns_fatal_exit_code() {
    let dir = TempDir::new().unwrap();
    let config = write_file(dir.path(), "bad.yaml", b"color: neon");

    let output = run_edifact(&[
        "--config",
        &config,
        "parse",
        &testdata_path("testdata/edi/desadv_d01b.edi"),
    ]);

    assert_eq!(output.status.code(), Some(3));
    assert!(
        String::from_utf8_lossy(&output.stderr).contains("ERROR:"),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn config_file_supplies_spec_dir_and_flags_override() {
    let dir = TempDir::new().unwrap();
    let config = write_file(
        dir.path(),
        "edifact.yaml",
        format!(
            "spec_dir: {}\npretty: false\n",
            testdata_path("testdata/specs")
        )
        .as_bytes(),
    );

    let output = run_edifact(&[
        "--config",
        &config,
        "parse",
        &testdata_path("testdata/edi/desadv_d01b_full.edi"),
        "--pretty",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let json = stdout_json(&output);
    assert!(stdout.contains("\n  "), "expected pretty output");

    let annotation = &json["edifactJson"]["messages"][0]["annotation"];
    assert_eq!(annotation["specification"], "DESADV:D:01B");
    assert_eq!(annotation["issues"], serde_json::json!([]));
}

#[test]
fn stdin_binary_input_is_decoded() {
    let text = fs::read(testdata_path("testdata/edi/desadv_d01b.edi")).unwrap();
    let mut child = Command::new(cargo_bin())
        .args(["parse", "-", "--input-type", "binary", "--quiet"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn edifact");
    child.stdin.take().unwrap().write_all(&text).unwrap();
    let output = child.wait_with_output().unwrap();

    let json = stdout_json(&output);
    assert_eq!(json["edifactJson"]["controlRef"], "38190");
    assert!(output.stderr.is_empty(), "quiet run should not log");
}

#[test]
fn normalize_writes_one_segment_per_line() {
    let dir = TempDir::new().unwrap();
    let input = write_file(
        dir.path(),
        "compact.edi",
        b"UNB+UNOC:3+S+R+250725:1503+1'UNH+1+DESADV:D:01B:UN'BGM+351+D1+9'UNT+3+1'UNZ+1+1'",
    );
    let target = dir.path().join("normalized.edi");

    let output = run_edifact(&["normalize", &input, "--output", target.to_str().unwrap()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let normalized = fs::read_to_string(target).unwrap();
    assert_eq!(
        normalized.lines().collect::<Vec<_>>(),
        vec![
            "UNB+UNOC:3+S+R+250725:1503+1'",
            "UNH+1+DESADV:D:01B:UN'",
            "BGM+351+D1+9'",
            "UNT+3+1'",
            "UNZ+1+1'",
        ]
    );
}
