use assert_cmd::{cargo, prelude::*};
use predicates::prelude::*;
use serde_json::Value;
use std::process::Command;
use tempfile::TempDir;

fn setup_temp_home() -> TempDir {
    TempDir::new().expect("failed to create temp home")
}

/// Command with an isolated HOME and database
fn plata(home: &TempDir) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("plata"));
    cmd.env("HOME", home.path());
    cmd.arg("--db").arg(home.path().join("test.db"));
    cmd
}

fn run_ok(home: &TempDir, args: &[&str]) -> String {
    let output = plata(home)
        .args(args)
        .output()
        .expect("failed to run plata");
    assert!(
        output.status.success(),
        "command failed: {:?}\nstdout: {}\nstderr: {}",
        args,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("stdout not utf8")
}

/// `entity add` / `account add` print "... created: <id>"
fn created_id(stdout: &str) -> String {
    stdout
        .lines()
        .find(|l| l.contains("created:"))
        .and_then(|l| l.rsplit(' ').next())
        .expect("no created id in output")
        .trim()
        .to_string()
}

#[test]
fn summary_on_empty_database_is_all_zeros() {
    let home = setup_temp_home();

    plata(&home)
        .args(["summary", "2024-05"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-05"))
        .stdout(predicate::str::contains("$ 0"));
}

#[test]
fn malformed_period_id_is_rejected() {
    let home = setup_temp_home();

    plata(&home).args(["summary", "2024-13"]).assert().failure();
    plata(&home)
        .args(["period", "add", "202405"])
        .assert()
        .failure();
}

#[test]
fn incomes_and_usd_expenses_flow_into_the_summary() {
    let home = setup_temp_home();

    run_ok(&home, &["period", "add", "2024-05", "--rate", "4000"]);
    run_ok(
        &home,
        &[
            "income", "add", "2024-05", "Salario", "5000000", "--salary",
        ],
    );
    run_ok(
        &home,
        &["expense", "add", "2024-05", "Mercado", "100", "--currency", "USD"],
    );

    let stdout = run_ok(&home, &["summary", "2024-05"]);
    assert!(stdout.contains("$ 5.000.000"), "salary missing: {stdout}");
    assert!(stdout.contains("$ 400.000"), "converted expense missing: {stdout}");
    assert!(stdout.contains("$ 4.600.000"), "balance missing: {stdout}");
    assert!(!stdout.contains("rate unset"));
}

#[test]
fn summary_warns_when_the_period_rate_is_unset() {
    let home = setup_temp_home();

    run_ok(&home, &["period", "add", "2024-05"]);
    run_ok(
        &home,
        &[
            "income",
            "add",
            "2024-05",
            "Consultoria",
            "1000",
            "--currency",
            "USD",
        ],
    );

    let stdout = run_ok(&home, &["summary", "2024-05"]);
    assert!(stdout.contains("rate unset"), "missing warning: {stdout}");

    // Setting the rate completes the conversion
    run_ok(&home, &["period", "set-rate", "2024-05", "4100"]);
    let stdout = run_ok(&home, &["summary", "2024-05"]);
    assert!(!stdout.contains("rate unset"));
    assert!(stdout.contains("$ 4.100.000"), "converted income missing: {stdout}");
}

#[test]
fn snapshots_classify_into_liquid_and_capital() {
    let home = setup_temp_home();

    run_ok(&home, &["period", "add", "2024-05", "--rate", "4000"]);
    let entity_id = created_id(&run_ok(
        &home,
        &["entity", "add", "Bancolombia", "--type", "bank"],
    ));
    let savings_id = created_id(&run_ok(
        &home,
        &[
            "account", "add", "Ahorros", "--entity", &entity_id, "--category", "cash",
        ],
    ));
    let cdt_id = created_id(&run_ok(
        &home,
        &[
            "account",
            "add",
            "CDT",
            "--entity",
            &entity_id,
            "--category",
            "invest_medium",
        ],
    ));

    run_ok(
        &home,
        &["snapshot", "set", "2024-05", &savings_id, "2000000"],
    );
    run_ok(&home, &["snapshot", "set", "2024-05", &cdt_id, "10000000"]);

    let stdout = run_ok(&home, &["summary", "2024-05"]);
    assert!(stdout.contains("$ 2.000.000"), "liquid missing: {stdout}");
    assert!(stdout.contains("$ 12.000.000"), "capital missing: {stdout}");
}

#[test]
fn projected_incomes_show_up_in_the_series() {
    let home = setup_temp_home();

    run_ok(&home, &["period", "add", "2024-05", "--rate", "4000"]);
    let entity_id = created_id(&run_ok(
        &home,
        &["entity", "add", "Bancolombia", "--type", "bank"],
    ));
    let cdt_id = created_id(&run_ok(
        &home,
        &[
            "account",
            "add",
            "CDT",
            "--entity",
            &entity_id,
            "--category",
            "invest_medium",
        ],
    ));
    run_ok(&home, &["snapshot", "set", "2024-05", &cdt_id, "1000000"]);
    run_ok(
        &home,
        &[
            "projected",
            "add",
            "2024-05",
            &cdt_id,
            "Intereses CDT",
            "--kind",
            "fixed_ea",
            "--rate-ea",
            "12",
            "--recurring",
        ],
    );

    let listed = run_ok(&home, &["projected", "list", "2024-05"]);
    assert!(listed.contains("Intereses CDT"), "entry missing: {listed}");
    assert!(listed.contains("12% EA"), "figure missing: {listed}");

    // 12% EA on the 1,000,000 snapshot -> ~9,489 in the series column
    let stdout = run_ok(&home, &["series", "2024-05", "--months", "1"]);
    assert!(stdout.contains("Projected"), "column missing: {stdout}");
    assert!(stdout.contains("$ 9.489"), "projected total missing: {stdout}");
}

#[test]
fn projected_income_requires_the_kinds_figure() {
    let home = setup_temp_home();

    run_ok(&home, &["period", "add", "2024-05"]);
    plata(&home)
        .args(["projected", "add", "2024-05", "acct-1", "Salario"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("amount"));
}

#[test]
fn copy_incomes_seeds_the_next_month() {
    let home = setup_temp_home();

    run_ok(&home, &["period", "add", "2024-04"]);
    run_ok(&home, &["period", "add", "2024-05"]);
    run_ok(
        &home,
        &[
            "income", "add", "2024-04", "Salario", "5000000", "--salary",
        ],
    );
    run_ok(
        &home,
        &["income", "add", "2024-04", "Arriendo", "1500000"],
    );

    let stdout = run_ok(&home, &["period", "copy-incomes", "2024-05"]);
    assert!(stdout.contains("Copied 2"), "unexpected output: {stdout}");

    let listed = run_ok(&home, &["income", "list", "2024-05"]);
    assert!(listed.contains("Salario"));
    assert!(listed.contains("Arriendo"));
}

#[test]
fn copy_incomes_requires_the_target_period() {
    let home = setup_temp_home();

    plata(&home)
        .args(["period", "copy-incomes", "2024-05"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn series_json_covers_the_requested_window() {
    let home = setup_temp_home();

    run_ok(&home, &["period", "add", "2024-05", "--rate", "4000"]);
    run_ok(
        &home,
        &[
            "income", "add", "2024-05", "Salario", "5000000", "--salary",
        ],
    );

    let stdout = run_ok(&home, &["series", "2024-05", "--months", "3", "--json"]);
    let points: Value = serde_json::from_str(&stdout).expect("series output not json");
    let points = points.as_array().expect("series json not an array");
    assert_eq!(points.len(), 3);
    assert_eq!(points[0]["period_id"], "2024-03");
    assert_eq!(points[2]["period_id"], "2024-05");
    // Decimals serialize as strings
    assert_eq!(points[2]["summary"]["income_salary"], "5000000");
}

#[test]
fn export_then_import_into_a_second_database() {
    let home = setup_temp_home();

    run_ok(&home, &["period", "add", "2024-05", "--rate", "4000"]);
    run_ok(
        &home,
        &[
            "income", "add", "2024-05", "Salario", "5000000", "--salary",
        ],
    );
    let file = home.path().join("2024-05.json");
    run_ok(&home, &["period", "export", "2024-05", file.to_str().unwrap()]);

    let second_db = home.path().join("second.db");
    let mut cmd = Command::new(cargo::cargo_bin!("plata"));
    cmd.env("HOME", home.path());
    cmd.args(["--db", second_db.to_str().unwrap()]);
    cmd.args(["period", "import", file.to_str().unwrap()]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Imported 1"));

    let mut check = Command::new(cargo::cargo_bin!("plata"));
    check.env("HOME", home.path());
    check.args(["--db", second_db.to_str().unwrap()]);
    check.args(["income", "list", "2024-05"]);
    check
        .assert()
        .success()
        .stdout(predicate::str::contains("Salario"));
}

#[test]
fn import_refuses_an_existing_period() {
    let home = setup_temp_home();

    run_ok(&home, &["period", "add", "2024-05"]);
    let file = home.path().join("2024-05.json");
    run_ok(&home, &["period", "export", "2024-05", file.to_str().unwrap()]);

    plata(&home)
        .args(["period", "import", file.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}
