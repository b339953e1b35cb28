use assert_cmd::Command;
use assert_fs::{prelude::FileWriteStr, NamedTempFile};
use predicates::prelude::predicate;

fn check_model(model: &str) -> Result<assert_cmd::assert::Assert, Box<dyn std::error::Error>> {
    let file = NamedTempFile::new("model.txt")?;
    file.write_str(model)?;
    let mut cmd = Command::cargo_bin("xplatree")?;
    cmd.arg("check").arg("-m").arg(file.path());
    let result = cmd.assert();
    file.close()?;
    Ok(result)
}

#[test]
fn test_check_decision_tree() -> Result<(), Box<dyn std::error::Error>> {
    check_model("p dt 2\nt\nn 1 1 > 0.5 2 3\nn 2 2 > 0.5 4 5\nl 3 0\nl 4 1\nl 5 0\n")?
        .success()
        .stdout(predicate::str::contains(
            "the model is a decision tree with 2 feature(s), 1 tree(s), 5 node(s) and 2 decision test(s)",
        ));
    Ok(())
}

#[test]
fn test_check_boosted_trees() -> Result<(), Box<dyn std::error::Error>> {
    check_model("p bt 1 0.5\nt\nn 1 1 > 0.5 2 3\nl 2 1\nl 3 -1\nt\nl 1 0.25\n")?
        .success()
        .stdout(predicate::str::contains("regression boosted trees"));
    Ok(())
}

#[test]
fn test_check_unreachable_node() -> Result<(), Box<dyn std::error::Error>> {
    check_model("p dt 1\nt\nn 1 1 > 0.5 2 3\nl 2 1\nl 3 0\nl 4 1\n")?
        .success()
        .stdout(predicate::str::contains("at line 6"));
    Ok(())
}

#[test]
fn test_check_invalid_model() -> Result<(), Box<dyn std::error::Error>> {
    check_model("p dt 1\nt\nn 1 1 > 0.5 2 3\nl 2 1\n")?.failure();
    Ok(())
}

#[test]
fn test_check_missing_file() {
    let mut cmd = Command::cargo_bin("xplatree").unwrap();
    cmd.arg("check").arg("-m").arg("/does/not/exist.txt");
    cmd.assert().failure();
}
