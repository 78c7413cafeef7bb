pub mod mock_relay;

use prompt_enhancer::document::MemoryDocument;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Isolated config dir for running the binary
#[allow(dead_code)]
pub struct TestContext {
    pub temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestContext {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        fs::create_dir_all(temp_dir.path().join("config")).expect("Failed to create config dir");
        TestContext { temp_dir }
    }

    pub fn config_dir(&self) -> PathBuf {
        self.temp_dir.path().join("config/prompt-enhancer")
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut command = Command::new(env!("CARGO_BIN_EXE_prompt-enhancer"));
        command
            .args(args)
            .env("XDG_CONFIG_HOME", self.temp_dir.path().join("config"))
            .env("HOME", self.temp_dir.path())
            .env_remove("RUST_LOG");
        command
    }

    /// Run the binary with the given arguments
    pub fn run(&self, args: &[&str]) -> Output {
        self.command(args)
            .output()
            .expect("Failed to run prompt-enhancer")
    }

    /// Same as `run`, without blocking the test runtime
    pub async fn run_async(&self, args: &[&str]) -> Output {
        tokio::process::Command::from(self.command(args))
            .output()
            .await
            .expect("Failed to run prompt-enhancer")
    }

    /// Write the runtime config file
    pub fn write_config(&self, json: &str) {
        fs::create_dir_all(self.config_dir()).expect("Failed to create config dir");
        fs::write(self.config_dir().join("config.json"), json).expect("Failed to write config");
    }
}

/// Page with `parts` as text nodes and `needle` selected
#[allow(dead_code)]
pub fn page_with_selection(parts: &[&str], needle: &str) -> MemoryDocument {
    let mut doc = MemoryDocument::with_text(parts);
    assert!(doc.select_text(needle), "{:?} not found on page", needle);
    doc
}

#[allow(dead_code)]
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[allow(dead_code)]
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
