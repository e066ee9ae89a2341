use std::io::Write;

use approx::assert_abs_diff_eq;
use insta::assert_snapshot;
use test_case::test_case;
use xtal::{Supercell, Vec3};

use crate::{Config, Filter, ParseError};

#[test_case("q=all", ";Q=ALL;")]
#[test_case("q=(1/4  1/4 0),charge=hirshfeld", ";Q={1/4 1/4 0};CHARGE=HIRSHFELD;")]
#[test_case("q={1/2,0,0}; novib", ";Q={1/2,0,0}; NOVIB;")]
#[test_case("q-pt=1.2", ";Q=1.2;")]
fn normalize(input: &str, want: &str) {
    assert_eq!(Filter::new(input).unwrap().as_str(), want);
}

#[test]
fn keys() {
    let f: Filter = "q=(1/4 1/4 0), charge=hirshfeld".parse().unwrap();
    assert_eq!(f.charge, "HIRS");
    assert!(!f.all_q);
    assert!(!f.novib);
    assert!(f.has_key("Q="));
    assert_eq!(f.get("CHARGE="), Some("HIRSHFELD"));
    let q = f.desired_q.unwrap();
    assert_eq!(q.label, "{1/4 1/4 0}");
    assert_abs_diff_eq!(q.vector, Vec3::new(0.25, 0.25, 0.0));
}

#[test]
fn comma_separated_q() {
    let f = Filter::new("q={-1/3, 0.5, 1}").unwrap();
    let q = f.desired_q.unwrap();
    assert_eq!(q.label, "{-1/3, 0.5, 1}");
    assert_abs_diff_eq!(q.vector, Vec3::new(-1.0 / 3.0, 0.5, 1.0));
}

#[test]
fn all_q_ignores_vector() {
    let f = Filter::new("q=all {0 0 0}").unwrap();
    assert!(f.all_q);
    assert!(f.desired_q.is_none());
}

#[test]
fn defaults() {
    let f = Filter::new("").unwrap();
    assert!(f.is_empty());
    assert_eq!(f.charge, "MULL");
    assert!(!f.has_key("Q="));
    let f = Filter::new("novib").unwrap();
    assert!(f.novib);
    assert_eq!(f.charge, "MULL");
}

#[test_case("q={1/4 1/4}"; "two components")]
#[test_case("q={a 0 0}"; "not a number")]
#[test_case("q={0 0 0"; "unterminated")]
fn bad_filters(input: &str) {
    assert!(matches!(Filter::new(input), Err(ParseError::Config(_))));
}

#[test]
fn vibration_predicate() {
    let c = Config::new();
    assert!(c.include_vibration(1));
    assert!(c.include_vibration(99));
    let c = Config::new().vibration(3);
    assert!(!c.include_vibration(1));
    assert!(c.include_vibration(3));
    let c = Config::new().filter("NOVIB".parse().unwrap());
    assert!(!c.include_vibration(1));
    let c = Config::new().model(2);
    assert!(!c.include_model(1));
    assert!(c.include_model(2));
}

#[test]
fn load() {
    let got = Config::load("testfiles/test.toml").unwrap();
    let want = Config {
        filter: Filter::new("q=(1/2 0 0), charge=hirshfeld").unwrap(),
        vibration: Some(2),
        supercell: Some(Supercell::new(2, 1, 1)),
        trajectory: true,
        model: Some(1),
    };
    assert_eq!(got, want);
}

#[test]
fn load_rejects_unknown_fields() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    writeln!(f, "filter = \"q=1\"\nsupercel = [2, 2, 2]").unwrap();
    let err = Config::load(f.path()).unwrap_err();
    assert!(matches!(err, ParseError::Config(_)));
}

#[test_case("supercell = [0, 1, 1]"; "zero a")]
#[test_case("supercell = [2, 2, 0]"; "zero c")]
fn load_rejects_empty_supercell(toml: &str) {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    writeln!(f, "{toml}").unwrap();
    let err = Config::load(f.path()).unwrap_err();
    assert!(matches!(err, ParseError::Config(_)));
    assert!(err.to_string().contains("supercell"));
}

#[test]
fn validate_builder_supercell() {
    assert!(Config::new().supercell(1, 1, 1).validate().is_ok());
    assert!(Config::new().validate().is_ok());
    let err = Config::new().supercell(0, 1, 1).validate().unwrap_err();
    assert!(matches!(err, ParseError::Config(_)));
}

#[test]
fn vibration_zero_means_all() {
    let c = Config::new().vibration(0);
    assert_eq!(c.vibration, None);
    assert!(c.include_vibration(1));
    assert!(c.include_vibration(7));

    let mut f = tempfile::NamedTempFile::new().unwrap();
    writeln!(f, "vibration = 0").unwrap();
    let c = Config::load(f.path()).unwrap();
    assert_eq!(c, Config::new());

    // set directly, bypassing the builder
    let c = Config {
        vibration: Some(0),
        ..Config::new()
    };
    assert_eq!(c.single_vibration(), None);
    assert!(c.include_vibration(2));
}

#[test]
fn symmetry_and_ts_keys() {
    let f = Filter::new("tstype=ts, nosym").unwrap();
    assert_eq!(f.tstype.as_deref(), Some("TS"));
    assert!(f.nosym);
    let f = Filter::new("q=all").unwrap();
    assert_eq!(f.tstype, None);
    assert!(!f.nosym);
}

#[test]
fn load_missing_file() {
    let err = Config::load("testfiles/nope.toml").unwrap_err();
    assert!(matches!(err, ParseError::Io(std::io::ErrorKind::NotFound, _)));
}

#[test]
fn empty_toml() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    writeln!(f).unwrap();
    assert_eq!(Config::load(f.path()).unwrap(), Config::new());
}

#[test]
fn display() {
    let c = Config::new()
        .filter("q=all, charge=hirshfeld".parse().unwrap())
        .supercell(2, 2, 1)
        .trajectory(true);
    assert_snapshot!(c.to_string().trim(), @r"
    Configuration Options:
    filter = ;Q=ALL;CHARGE=HIRSHFELD;
    charge = HIRS
    vibration = all
    supercell = 2 2 1
    trajectory = true
    model = all
    ");
}
