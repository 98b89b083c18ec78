//! Integration tests for the run binary

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;

    fn run() -> Command {
        cargo_bin_cmd!("run")
    }

    #[test]
    fn help_displays() {
        run()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("cache and run scripts"));
    }

    #[test]
    fn version_displays() {
        run()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("run"));
    }

    #[test]
    fn package_readme_exists() {
        let readme = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("README.md");
        let content = std::fs::read_to_string(readme).unwrap();
        assert!(content.contains("run "));
    }

    #[test]
    fn unknown_flag_is_usage_error() {
        run()
            .arg("--no-such-flag")
            .assert()
            .failure()
            .code(2);
    }
}

mod script_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const HELLO: &str = "#!/bin/sh\necho \"hello $1\"\n";

    /// A config whose scopes read from a local scripts directory
    struct Fixture {
        temp: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            fs::create_dir_all(temp.path().join("scripts")).unwrap();

            let config = format!(
                "[general]\ndata_dir = \"{data}\"\n\n[sources]\ndefault = \"file://{scripts}/{{script}}\"\nlocal = \"file://{scripts}/{{script}}\"\n",
                data = temp.path().join("data").display(),
                scripts = temp.path().join("scripts").display(),
            );
            fs::write(temp.path().join("config.toml"), config).unwrap();

            let fixture = Self { temp };
            fixture.script("hello", HELLO);
            fixture
        }

        fn script(&self, name: &str, content: &str) {
            fs::write(self.temp.path().join("scripts").join(name), content).unwrap();
        }

        fn remove_script(&self, name: &str) {
            fs::remove_file(self.temp.path().join("scripts").join(name)).unwrap();
        }

        fn data_dir(&self) -> PathBuf {
            self.temp.path().join("data")
        }

        fn cached_files(&self) -> usize {
            count_files(&self.data_dir())
        }

        fn cmd(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("run");
            cmd.env("RUN_CONFIG", self.temp.path().join("config.toml"))
                .env_remove("RUST_LOG");
            cmd
        }
    }

    fn count_files(dir: &Path) -> usize {
        let Ok(entries) = fs::read_dir(dir) else {
            return 0;
        };
        entries
            .map(|e| e.unwrap().path())
            .map(|p| if p.is_dir() { count_files(&p) } else { 1 })
            .sum()
    }

    #[test]
    fn no_script_prints_help() {
        Fixture::new()
            .cmd()
            .assert()
            .success()
            .stdout(predicate::str::contains("Usage"));
    }

    #[test]
    fn runs_script_with_args() {
        Fixture::new()
            .cmd()
            .args(["local:hello", "world"])
            .assert()
            .success()
            .stdout("hello world\n");
    }

    #[test]
    fn bare_name_uses_default_scope() {
        Fixture::new()
            .cmd()
            .args(["hello", "there"])
            .assert()
            .success()
            .stdout("hello there\n");
    }

    #[test]
    fn flags_after_script_reach_the_script() {
        Fixture::new()
            .cmd()
            .args(["local:hello", "--view"])
            .assert()
            .success()
            .stdout("hello --view\n");
    }

    #[test]
    fn forwards_exit_code() {
        let fixture = Fixture::new();
        fixture.script("fail", "#!/bin/sh\nexit 3\n");

        fixture.cmd().arg("local:fail").assert().code(3);
    }

    #[test]
    fn second_run_uses_cache() {
        let fixture = Fixture::new();
        fixture.cmd().arg("local:hello").assert().success();
        assert_eq!(fixture.cached_files(), 2);

        fixture.remove_script("hello");
        fixture
            .cmd()
            .args(["local:hello", "again"])
            .assert()
            .success()
            .stdout("hello again\n");
    }

    #[test]
    fn update_refetches() {
        let fixture = Fixture::new();
        fixture.cmd().arg("local:hello").assert().success();

        fixture.script("hello", "#!/bin/sh\necho updated\n");
        fixture
            .cmd()
            .arg("local:hello")
            .assert()
            .success()
            .stdout("hello \n");

        fixture
            .cmd()
            .args(["-u", "local:hello"])
            .assert()
            .success()
            .stdout("updated\n");
    }

    #[test]
    fn view_prints_without_running() {
        let fixture = Fixture::new();
        fixture.script("marker", "#!/bin/sh\ntouch \"$0.ran\"\n");

        fixture
            .cmd()
            .args(["-v", "local:marker"])
            .assert()
            .success()
            .stdout("#!/bin/sh\ntouch \"$0.ran\"\n");

        let ran = fs::read_dir(fixture.data_dir().join("local"))
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.is_dir())
            .any(|dir| dir.join("marker.ran").exists());
        assert!(!ran);
    }

    #[test]
    fn interpreter_runs_plain_file() {
        let fixture = Fixture::new();
        fixture.script("plain", "echo \"plain $#\"\n");

        fixture
            .cmd()
            .args(["-i", "sh", "local:plain", "a", "b"])
            .assert()
            .success()
            .stdout("plain 2\n");
    }

    #[test]
    fn invalid_reference_is_usage_error() {
        let fixture = Fixture::new();
        fixture
            .cmd()
            .arg("local:../escape")
            .assert()
            .code(64)
            .stderr(predicate::str::contains("Invalid script reference"));
        assert_eq!(fixture.cached_files(), 0);
    }

    #[test]
    fn unknown_scope_is_usage_error() {
        Fixture::new()
            .cmd()
            .arg("nope:hello")
            .assert()
            .code(64)
            .stderr(predicate::str::contains("Unknown scope 'nope'"));
    }

    #[test]
    fn fetch_failure_leaves_no_script() {
        let fixture = Fixture::new();
        fixture
            .cmd()
            .arg("local:missing")
            .assert()
            .code(69)
            .stderr(predicate::str::contains("Failed to fetch"));

        // Only the lock file may remain
        assert!(fixture.cached_files() <= 1);
        fixture.script("missing", "#!/bin/sh\necho found\n");
        fixture
            .cmd()
            .arg("local:missing")
            .assert()
            .success()
            .stdout("found\n");
    }

    #[test]
    fn invalid_config_is_config_error() {
        let fixture = Fixture::new();
        fs::write(fixture.temp.path().join("config.toml"), "[general\n").unwrap();

        fixture
            .cmd()
            .arg("local:hello")
            .assert()
            .code(78)
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn clean_without_yes_keeps_cache() {
        let fixture = Fixture::new();
        fixture.cmd().arg("local:hello").assert().success();

        fixture
            .cmd()
            .arg("--clean")
            .assert()
            .success()
            .stdout(predicate::str::contains("Aborted"));
        assert_eq!(fixture.cached_files(), 2);
    }

    #[test]
    fn clean_with_yes_empties_cache() {
        let fixture = Fixture::new();
        fixture.cmd().arg("local:hello").assert().success();

        fixture
            .cmd()
            .args(["--clean", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Cache cleared"));
        assert_eq!(fixture.cached_files(), 0);
        assert!(fixture.data_dir().exists());
    }

    #[test]
    fn init_writes_config_once() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("conf").join("config.toml");
        let init = || {
            let mut cmd = cargo_bin_cmd!("run");
            cmd.env("RUN_CONFIG", &config_path)
                .env("XDG_DATA_HOME", temp.path().join("xdg"))
                .arg("--init");
            cmd
        };

        init()
            .assert()
            .success()
            .stdout(predicate::str::contains("Created config"));
        assert!(config_path.exists());
        assert!(temp.path().join("xdg").join("runscripts").is_dir());

        init()
            .assert()
            .code(64)
            .stderr(predicate::str::contains("already exists"));

        init().arg("--force").assert().success();
    }
}
