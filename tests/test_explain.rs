use assert_cmd::Command;
use assert_fs::{prelude::FileWriteStr, NamedTempFile};
use predicates::prelude::{predicate, PredicateBooleanExt};

const DEPTH_2_TREE: &str = r#"p dt 2
t
n 1 1 > 0.5 2 3
n 2 2 > 0.5 4 5
l 3 0
l 4 1
l 5 0
"#;

// x1 ? (x2 or x3) : (x2 and x3)
const MAJORITY_TREE: &str = r#"p dt 3
fi 0.5 0.3 0.2
t
n 1 1 > 0.5 2 3
n 2 2 > 0.5 4 5
n 3 3 > 0.5 6 7
l 4 1
n 5 3 > 0.5 8 9
n 6 2 > 0.5 10 11
l 7 0
l 8 1
l 9 0
l 10 1
l 11 0
"#;

const FOREST: &str = r#"p bt 3 0.125
t
n 1 1 > 0.5 2 3
l 2 1.0
l 3 -1.0
t
n 1 2 > 0.5 2 3
n 2 1 > 0.5 4 5
l 3 -0.5
l 4 0.5
l 5 0.25
t
n 1 3 > 0.5 2 3
l 2 0.0
l 3 0.0
"#;

fn explain(
    model: &str,
    instances: &str,
    args: &[&str],
) -> Result<assert_cmd::assert::Assert, Box<dyn std::error::Error>> {
    let model_file = NamedTempFile::new("model.txt")?;
    model_file.write_str(model)?;
    let instances_file = NamedTempFile::new("instances.txt")?;
    instances_file.write_str(instances)?;
    let mut cmd = Command::cargo_bin("xplatree")?;
    cmd.arg("explain")
        .arg("-m")
        .arg(model_file.path())
        .arg("-i")
        .arg(instances_file.path())
        .arg("--logging-level")
        .arg("off")
        .args(args);
    let result = cmd.assert();
    model_file.close()?;
    instances_file.close()?;
    Ok(result)
}

#[test]
fn test_direct_reason() -> Result<(), Box<dyn std::error::Error>> {
    explain(DEPTH_2_TREE, "1 1\n", &["-k", "direct"])?
        .success()
        .stdout(predicate::str::starts_with("c direct 1 "))
        .stdout(predicate::str::contains("\nr 1 2\n"))
        .stdout(predicate::str::contains("c 1: f1 > 0.5\n"))
        .stdout(predicate::str::contains("c 2: f2 > 0.5\n"));
    Ok(())
}

#[test]
fn test_one_line_per_instance() -> Result<(), Box<dyn std::error::Error>> {
    explain(DEPTH_2_TREE, "1 1\n0 1\n", &["-k", "sufficient"])?
        .success()
        .stdout(predicate::str::contains("r 1 2\n"))
        .stdout(predicate::str::contains("r -1\n"));
    Ok(())
}

#[test]
fn test_all_sufficient_reasons() -> Result<(), Box<dyn std::error::Error>> {
    explain(MAJORITY_TREE, "1,1,1\n", &["-k", "sufficient", "-n", "all"])?
        .success()
        .stdout(predicate::str::starts_with("c sufficient 3 "))
        .stdout(predicate::str::contains("r 1 2\n"))
        .stdout(predicate::str::contains("r 1 3\n"))
        .stdout(predicate::str::contains("r 2 3\n"));
    Ok(())
}

#[test]
fn test_excluded_features() -> Result<(), Box<dyn std::error::Error>> {
    explain(
        MAJORITY_TREE,
        "1,1,1\n",
        &["-k", "sufficient", "-n", "all", "--exclude", "3"],
    )?
    .success()
    .stdout(predicate::str::starts_with("c sufficient 1 "))
    .stdout(predicate::str::contains("r 1 2\n"));
    Ok(())
}

#[test]
fn test_excluded_necessary_feature() -> Result<(), Box<dyn std::error::Error>> {
    explain(DEPTH_2_TREE, "1 1\n", &["-k", "minimal", "--exclude", "1"])?
        .success()
        .stdout(predicate::eq("c minimal 0 0.000s\n"));
    Ok(())
}

#[test]
fn test_null_time_limit() -> Result<(), Box<dyn std::error::Error>> {
    explain(
        MAJORITY_TREE,
        "1,1,1\n",
        &["-k", "sufficient", "--time-limit", "0"],
    )?
    .success()
    .stdout(predicate::eq("c sufficient 0 TIMEOUT\n"));
    Ok(())
}

#[test]
fn test_count() -> Result<(), Box<dyn std::error::Error>> {
    explain(MAJORITY_TREE, "1,1,1\n", &["-k", "count"])?
        .success()
        .stdout(predicate::str::contains("s 3\n"))
        .stdout(predicate::str::contains("v ").not());
    Ok(())
}

#[test]
fn test_count_per_literal() -> Result<(), Box<dyn std::error::Error>> {
    explain(MAJORITY_TREE, "1,1,1\n", &["-k", "count-per-literal"])?
        .success()
        .stdout(predicate::str::contains("s 3\n"))
        .stdout(predicate::str::contains("v 1 2\nv 2 2\nv 3 2\n"));
    Ok(())
}

#[test]
fn test_preferred_reason_with_weights() -> Result<(), Box<dyn std::error::Error>> {
    explain(
        MAJORITY_TREE,
        "1,1,1\n",
        &["-k", "preferred", "--method", "weights", "--weights", "1,10,1"],
    )?
    .success()
    .stdout(predicate::str::contains("r 1 3\n"));
    Ok(())
}

#[test]
fn test_preferred_reason_missing_weights() -> Result<(), Box<dyn std::error::Error>> {
    explain(
        MAJORITY_TREE,
        "1,1,1\n",
        &["-k", "preferred", "--method", "weights"],
    )?
    .failure();
    Ok(())
}

#[test]
fn test_tree_specific_reason() -> Result<(), Box<dyn std::error::Error>> {
    explain(
        FOREST,
        "1 1 1\n",
        &["-k", "tree-specific", "--iterations", "5", "--seed", "42"],
    )?
    .success()
    .stdout(predicate::str::starts_with("c tree-specific 1 "))
    .stdout(predicate::str::contains("\nr "));
    Ok(())
}

#[test]
fn test_sufficient_reason_of_forest() -> Result<(), Box<dyn std::error::Error>> {
    explain(FOREST, "1 1 1\n", &["-k", "sufficient"])?.failure();
    Ok(())
}

#[test]
fn test_range_of_decision_tree() -> Result<(), Box<dyn std::error::Error>> {
    explain(DEPTH_2_TREE, "1 1\n", &["-k", "direct", "--range", "0,1"])?.failure();
    Ok(())
}

#[test]
fn test_unknown_kind() -> Result<(), Box<dyn std::error::Error>> {
    explain(DEPTH_2_TREE, "1 1\n", &["-k", "foo"])?.failure();
    Ok(())
}

#[test]
fn test_wrong_instance_size() -> Result<(), Box<dyn std::error::Error>> {
    explain(DEPTH_2_TREE, "1 1 1\n", &["-k", "direct"])?.failure();
    Ok(())
}
