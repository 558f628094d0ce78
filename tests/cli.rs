use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn docqa_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("docqa");
    path
}

fn setup_test_env(extra_config: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    fs::create_dir_all(root.join("config")).unwrap();
    let files_dir = root.join("files");
    fs::create_dir_all(&files_dir).unwrap();
    fs::write(
        files_dir.join("pets.txt"),
        "The cat sat on the mat. The dog ran in the park.",
    )
    .unwrap();
    fs::write(
        files_dir.join("rust.md"),
        "Rust is a systems language. Rust gives memory safety without garbage collection. \
         Many teams adopt Rust for safety. The weather was nice.",
    )
    .unwrap();
    fs::write(files_dir.join("empty.txt"), "   \n").unwrap();

    let config_content = format!(
        r#"[chunking]
chunk_size = 500
overlap = 100

[retrieval]
top_k = 5

[embedding]
provider = "hash"
dims = 256

[logging]
level = "warn"
{}
"#,
        extra_config
    );

    let config_path = root.join("config").join("docqa.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_docqa(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = docqa_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run docqa binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn file(tmp: &TempDir, name: &str) -> String {
    tmp.path().join("files").join(name).display().to_string()
}

#[test]
fn test_ask_prints_answer() {
    let (tmp, config_path) = setup_test_env("");
    let doc = file(&tmp, "pets.txt");

    let (stdout, stderr, success) = run_docqa(
        &config_path,
        &["ask", "Where did the cat sit?", "--document", &doc],
    );
    assert!(success, "ask failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("The cat sat on the mat."), "got: {}", stdout);
}

#[test]
fn test_ask_json_output() {
    let (tmp, config_path) = setup_test_env("");
    let doc = file(&tmp, "pets.txt");

    let (stdout, _, success) = run_docqa(
        &config_path,
        &["ask", "Where did the dog run?", "--document", &doc, "--json"],
    );
    assert!(success);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["reply"]["status"], "answer");
    assert_eq!(json["message"], "The dog ran in the park.");
    assert!(json["reply"]["context"].as_array().unwrap().len() == 1);
}

#[test]
fn test_ask_unanswerable() {
    let (tmp, config_path) = setup_test_env("");
    let doc = file(&tmp, "pets.txt");

    let (stdout, _, success) = run_docqa(
        &config_path,
        &["ask", "What is the capital of France?", "--document", &doc],
    );
    assert!(success);
    assert!(stdout.contains("I couldn't find an answer based on the document."));
}

#[test]
fn test_ask_empty_document() {
    let (tmp, config_path) = setup_test_env("");
    let doc = file(&tmp, "empty.txt");

    let (stdout, _, success) =
        run_docqa(&config_path, &["ask", "Anything?", "--document", &doc]);
    assert!(success);
    assert!(stdout.contains("Document is empty or too short."));
}

#[test]
fn test_ask_zero_top_k_is_reported() {
    let (tmp, config_path) = setup_test_env("");
    let doc = file(&tmp, "pets.txt");

    let (stdout, _, success) = run_docqa(
        &config_path,
        &["ask", "Where is the cat?", "--document", &doc, "--top-k", "0"],
    );
    assert!(success);
    assert!(stdout.starts_with("Invalid configuration:"), "got: {}", stdout);
}

#[test]
fn test_ask_missing_document_fails() {
    let (tmp, config_path) = setup_test_env("");
    let doc = file(&tmp, "missing.txt");

    let (_, stderr, success) = run_docqa(&config_path, &["ask", "q?", "--document", &doc]);
    assert!(!success);
    assert!(stderr.contains("missing.txt"), "got: {}", stderr);
}

#[test]
fn test_invalid_config_fails() {
    let (tmp, _) = setup_test_env("");
    let bad = tmp.path().join("config").join("bad.toml");
    fs::write(&bad, "[chunking]\nchunk_size = 10\noverlap = 20\n").unwrap();
    let doc = file(&tmp, "pets.txt");

    let (_, stderr, success) = run_docqa(&bad, &["ask", "q?", "--document", &doc]);
    assert!(!success);
    assert!(stderr.contains("chunking"), "got: {}", stderr);
}

#[test]
fn test_blocked_terms_from_file() {
    let tmp_words = TempDir::new().unwrap();
    let words = tmp_words.path().join("bad_words.txt");
    fs::write(&words, "cat\n").unwrap();
    let (tmp, config_path) = setup_test_env(&format!(
        "\n[sanitizer]\nblocked_terms_path = \"{}\"\n",
        words.display()
    ));
    let doc = file(&tmp, "pets.txt");

    let (stdout, _, success) = run_docqa(
        &config_path,
        &["ask", "Where did the cat sit?", "--document", &doc, "--json"],
    );
    assert!(success);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    // "cat" is censored, so only "sit" is left to match and nothing does
    assert_eq!(json["reply"]["status"], "no_answer");
}

#[test]
fn test_summarize() {
    let (tmp, config_path) = setup_test_env("");
    let doc = file(&tmp, "rust.md");

    let (stdout, _, success) = run_docqa(
        &config_path,
        &["summarize", "--document", &doc, "--sentences", "2"],
    );
    assert!(success);
    assert_eq!(
        stdout.trim(),
        "Rust gives memory safety without garbage collection. Many teams adopt Rust for safety."
    );
}

#[test]
fn test_keywords() {
    let (tmp, config_path) = setup_test_env("");
    let doc = file(&tmp, "rust.md");

    let (stdout, _, success) = run_docqa(
        &config_path,
        &["keywords", "--document", &doc, "--top", "2", "--json"],
    );
    assert!(success);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let terms: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|k| k["term"].as_str().unwrap())
        .collect();
    assert_eq!(terms, vec!["rust", "safety"]);
}

#[test]
fn test_chat_over_stdin() {
    use std::io::Write;
    use std::process::Stdio;

    let (tmp, config_path) = setup_test_env("");
    let doc = file(&tmp, "pets.txt");

    let mut child = Command::new(docqa_binary())
        .arg("--config")
        .arg(&config_path)
        .args(["chat", "--document", &doc])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"Where did the cat sit?\nWhere did the dog run?\n:history\n:quit\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("The cat sat on the mat."));
    assert!(stdout.contains("The dog ran in the park."));
    assert!(stdout.contains("2. Where did the dog run?"));
}

#[test]
fn test_example_config_is_valid() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("config")
        .join("docqa.example.toml");
    let cfg = docqa::config::load_config(&path).unwrap();
    assert_eq!(cfg.chunking.chunk_size, 500);
    assert_eq!(cfg.answer.provider, "lexical");
}
