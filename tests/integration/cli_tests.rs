//! CLI integration tests
//!
//! Tests for the sqlport command-line interface.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn sqlport() -> Command {
    let mut cmd = Command::cargo_bin("sqlport").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

mod convert_command {
    use super::*;

    #[test]
    fn render_and_translate_to_file() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("query.sql");
        let output = temp.path().join("out.sql");
        fs::write(
            &input,
            "{DEFAULT @schema = cdm}\nSELECT ISNULL(a, 0) FROM @schema.person;",
        )
        .unwrap();

        sqlport()
            .current_dir(temp.path())
            .arg("convert")
            .arg(&input)
            .arg(&output)
            .args(["--render", "schema", "main", "--translate", "postgresql"])
            .assert()
            .success();

        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "SELECT COALESCE(a, 0) FROM main.person;"
        );
    }

    #[test]
    fn stdin_to_stdout() {
        let temp = TempDir::new().unwrap();
        sqlport()
            .current_dir(temp.path())
            .args(["convert", "-", "-", "--translate", "postgresql"])
            .write_stdin("SELECT TOP 10 * FROM person;")
            .assert()
            .success()
            .stdout("SELECT * FROM person LIMIT 10;");
    }

    #[test]
    fn session_id_flag() {
        let temp = TempDir::new().unwrap();
        sqlport()
            .current_dir(temp.path())
            .args(["convert", "-", "-", "--translate", "oracle", "--session-id", "abcd1234"])
            .args(["--temp-schema", "scratch"])
            .write_stdin("SELECT * FROM #t;")
            .assert()
            .success()
            .stdout("SELECT * FROM scratch.abcd1234t;");
    }

    #[test]
    fn unknown_dialect_fails() {
        let temp = TempDir::new().unwrap();
        sqlport()
            .current_dir(temp.path())
            .args(["convert", "-", "-", "--translate", "klingon"])
            .write_stdin("SELECT 1;")
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Don't know how to translate"));
    }

    #[test]
    fn bad_condition_fails() {
        let temp = TempDir::new().unwrap();
        sqlport()
            .current_dir(temp.path())
            .args(["convert", "-", "-", "--render", "a", "1"])
            .write_stdin("{maybe}?{x}")
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Error parsing boolean condition"));
    }

    #[test]
    fn missing_input_fails() {
        let temp = TempDir::new().unwrap();
        sqlport()
            .current_dir(temp.path())
            .args(["convert", "nope.sql", "-"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Error:"));
    }
}

mod config_file {
    use super::*;

    #[test]
    fn config_supplies_translation_options() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("custom.toml");
        fs::write(&config, "[translate]\nsession_id = \"abcd1234\"\n").unwrap();

        sqlport()
            .current_dir(temp.path())
            .arg("--config")
            .arg(&config)
            .args(["convert", "-", "-", "--translate", "oracle"])
            .write_stdin("SELECT * FROM #t;")
            .assert()
            .success()
            .stdout("SELECT * FROM abcd1234t;");
    }

    #[test]
    fn local_config_is_discovered() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("rules.csv"), "dialect,pattern,replacement\nshout,select,SELECT\n").unwrap();
        fs::write(temp.path().join("sqlport.toml"), "[translate]\nrules = \"rules.csv\"\n").unwrap();

        sqlport()
            .current_dir(temp.path())
            .arg("dialects")
            .assert()
            .success()
            .stdout("shout\nsql server\n");
    }

    #[test]
    fn invalid_config_fails() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("sqlport.toml"), "[translate]\nunknown = 1\n").unwrap();

        sqlport()
            .current_dir(temp.path())
            .arg("dialects")
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Config error"));
    }
}

mod split_command {
    use super::*;

    #[test]
    fn prints_each_statement() {
        let temp = TempDir::new().unwrap();
        let file_path = temp.path().join("script.sql");
        fs::write(&file_path, "SELECT 1;\nBEGIN SELECT 2; END;\nSELECT 3").unwrap();

        sqlport()
            .arg("split")
            .arg(&file_path)
            .assert()
            .success()
            .stdout("SELECT 1\n--\nBEGIN SELECT 2; END;\n--\nSELECT 3\n--\n");
    }

    #[test]
    fn directory_of_scripts() {
        let temp = TempDir::new().unwrap();
        let subdir = temp.path().join("nested");
        fs::create_dir(&subdir).unwrap();
        fs::write(temp.path().join("a.sql"), "SELECT 1;").unwrap();
        fs::write(subdir.join("b.sql"), "SELECT 2;").unwrap();
        fs::write(temp.path().join("notes.txt"), "SELECT 3;").unwrap();

        sqlport()
            .arg("split")
            .arg(temp.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("SELECT 1"))
            .stdout(predicate::str::contains("SELECT 2"))
            .stdout(predicate::str::contains("SELECT 3").not());
    }
}

mod check_command {
    use super::*;

    #[test]
    fn warnings_exit_with_one() {
        let temp = TempDir::new().unwrap();
        let file_path = temp.path().join("query.sql");
        fs::write(&file_path, "SELECT @a FROM t;").unwrap();

        sqlport()
            .current_dir(temp.path())
            .arg("check")
            .arg(&file_path)
            .args(["--param", "a", "--param", "b"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("Parameter 'b' not found in SQL"));
    }

    #[test]
    fn long_names_are_reported() {
        let temp = TempDir::new().unwrap();
        let file_path = temp.path().join("query.sql");
        fs::write(&file_path, "CREATE TABLE #abcdefghijk (id INT);").unwrap();

        sqlport()
            .current_dir(temp.path())
            .arg("check")
            .arg(&file_path)
            .args(["--translate", "oracle", "--max-identifier-length", "10"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("Temp table name '#abcdefghijk' is too long"))
            .stdout(predicate::str::contains("prevent oracle from crashing"));
    }

    #[test]
    fn clean_file_succeeds() {
        let temp = TempDir::new().unwrap();
        let file_path = temp.path().join("query.sql");
        fs::write(&file_path, "SELECT @a FROM t;").unwrap();

        sqlport()
            .current_dir(temp.path())
            .arg("check")
            .arg(&file_path)
            .args(["--param", "a"])
            .assert()
            .success()
            .stdout("");
    }

    #[test]
    fn nothing_to_check_fails() {
        let temp = TempDir::new().unwrap();
        sqlport()
            .current_dir(temp.path())
            .arg("check")
            .arg(temp.path().join("*.sql"))
            .assert()
            .code(2);
    }
}

mod dialects_command {
    use super::*;

    #[test]
    fn lists_embedded_dialects() {
        let temp = TempDir::new().unwrap();
        sqlport()
            .current_dir(temp.path())
            .arg("dialects")
            .assert()
            .success()
            .stdout(predicate::str::contains("postgresql\n"))
            .stdout(predicate::str::contains("sql server\n"));
    }
}

mod help {
    use super::*;

    #[test]
    fn help_lists_commands() {
        sqlport()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("convert"))
            .stdout(predicate::str::contains("split"))
            .stdout(predicate::str::contains("check"))
            .stdout(predicate::str::contains("dialects"));
    }

    #[test]
    fn convert_help_maps_flat_flags() {
        sqlport()
            .args(["convert", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("-oracle_temp_schema is --temp-schema"))
            .stdout(predicate::str::contains("-session_id is --session-id"));
    }
}
