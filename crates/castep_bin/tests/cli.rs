use std::path::Path;

use assert_cmd::Command;
use insta::assert_snapshot;

const TESTFILES: &str = "../castep/testfiles";

fn castep() -> Command {
    Command::cargo_bin("castep").unwrap()
}

fn stdout(cmd: &mut Command) -> String {
    let output = cmd.assert().success().get_output().clone();
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn phonon_supercell() {
    let path = Path::new(TESTFILES).join("supercell.phonon");
    let out = stdout(castep().arg(&path).args(["-s", "2", "1", "1"]));
    assert!(out.starts_with("q=3 {1/2 0 0}\n3 atom sets\n"), "{out}");
    assert!(out.contains("atom set 2: 200.00 cm-1 q=3 {1/2 0 0}"));
    assert!(out.contains("supercell 2 1 1"));
    assert!(out.trim_end().ends_with(
        "note: q-pt=    3    0.500000  0.000000  0.000000      0.333333"
    ));
}

#[test]
fn cell_output() {
    let path = Path::new(TESTFILES).join("nacl.cell");
    let out = stdout(castep().arg(&path));
    assert_snapshot!(out.trim_end(), @r"
    1 atom sets

    atom set 1: -
    a     5.640000     0.000000     0.000000
    b     0.000000     5.640000     0.000000
    c     0.000000     0.000000     5.640000
    Na       0.0000000000    0.0000000000    0.0000000000
    Cl:b     2.8200000000    2.8200000000    2.8200000000
    ");
}

#[test]
fn json() -> anyhow::Result<()> {
    let path = Path::new(TESTFILES).join("si.castep");
    let out = stdout(castep().arg(&path).args(["--json", "-m", "2"]));
    let v: serde_json::Value = serde_json::from_str(&out)?;
    assert_eq!(v["sets"].as_array().map(Vec::len), Some(1));
    assert_eq!(v["sets"][0]["energy"], -337.5);
    assert_eq!(v["sets"][0]["atoms"][1]["partial_charge"], 0.02);
    assert_eq!(v["trajectory"], false);
    Ok(())
}

#[test]
fn config_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let toml = dir.path().join("castep.toml");
    std::fs::write(&toml, "filter = \"q=2\"\nvibration = 4\n")?;
    let path = Path::new(TESTFILES).join("supercell.phonon");
    let out = stdout(castep().arg(&path).arg("-c").arg(&toml));
    assert!(out.contains("1 atom sets"), "{out}");
    assert!(out.contains("atom set 1: 130.25 cm-1 q=2 {1/4 0 0}"));
    Ok(())
}

#[test]
fn bad_filter() {
    let path = Path::new(TESTFILES).join("supercell.phonon");
    let assert = castep().arg(&path).args(["-f", "q={1 2}"]).assert().failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(stderr.contains("needs three components"), "{stderr}");
}

#[test]
fn empty_supercell() {
    let path = Path::new(TESTFILES).join("supercell.phonon");
    let assert = castep().arg(&path).args(["-s", "0", "1", "1"]).assert().failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(stderr.contains("supercell 0 1 1"), "{stderr}");
}

#[test]
fn transition_state() {
    let path = Path::new(TESTFILES).join("si.ts");
    let out = stdout(castep().arg(&path).args(["-f", "tstype=pro"]));
    assert!(out.starts_with("1 atom sets\n"), "{out}");
    assert!(out.contains("atom set 1: PRO Energy = -12.5 eV"));
}

#[test]
fn missing_file() {
    castep().arg("nonexistent.phonon").assert().failure();
}
