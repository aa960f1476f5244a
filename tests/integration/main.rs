//! Integration tests for Rendr

mod engine;

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn rendr(temp: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("rendr");
        cmd.current_dir(temp.path())
            .env_remove("RENDR_CONFIG")
            .arg("--no-local")
            .arg("--config")
            .arg(temp.path().join("config.toml"));
        cmd
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("rendr")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("server-side rendering"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("rendr")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("rendr"));
    }

    #[test]
    fn status_runs() {
        // Tools may be missing on the test machine, but status must not panic
        let temp = TempDir::new().unwrap();
        rendr(&temp)
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("Rendr Status"));
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        rendr(&temp)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();
        rendr(&temp)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[engine]"))
            .stdout(predicate::str::contains("frontend_dir = \"frontend\""));
    }

    #[test]
    fn config_show_reflects_frontend_dir_flag() {
        let temp = TempDir::new().unwrap();
        rendr(&temp)
            .args(["--frontend-dir", "web", "config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("frontend_dir = \"web\""));
    }

    #[test]
    fn config_init_writes_file() {
        let temp = TempDir::new().unwrap();
        rendr(&temp).args(["config", "init"]).assert().success();

        let written = std::fs::read_to_string(temp.path().join("config.toml")).unwrap();
        assert!(written.contains("[builder]"));
    }

    #[test]
    fn invalid_config_is_reported() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("config.toml"), "[engine\n").unwrap();
        rendr(&temp)
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn render_missing_frontend_dir() {
        let temp = TempDir::new().unwrap();
        rendr(&temp)
            .args(["--frontend-dir", "missing", "render", "Home.tsx"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Frontend directory not found"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn render_rejects_invalid_props() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("frontend")).unwrap();
        rendr(&temp)
            .args(["render", "Home.tsx", "--props", "{name:"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid --props JSON"));
    }

    #[test]
    fn render_help() {
        cargo_bin_cmd!("rendr")
            .args(["render", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--location"));
    }
}
