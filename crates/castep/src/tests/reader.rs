use crate::{Config, ParseError, read_str};

#[test]
fn transition_state_without_frames() {
    let asc = read_str(
        "# comment\n\nLST/QST transition state search\n",
        Config::new(),
    )
    .unwrap();
    assert!(asc.is_empty());
    assert!(!asc.trajectory);
}

#[test]
fn zero_supercell_is_rejected_before_reading() {
    let err = read_str("not castep at all\n", Config::new().supercell(1, 0, 1))
        .unwrap_err();
    assert!(matches!(err, ParseError::Config(_)));
}

#[test]
fn empty() {
    for input in ["", "\n\n# only comments\n! here\n", "not castep at all\n"] {
        let asc = read_str(input, Config::new()).unwrap();
        assert!(asc.is_empty());
        assert!(asc.notes.is_empty());
    }
}

#[test]
fn phonon_header_without_data() {
    let asc = read_str(" BEGIN header\n END header\n", Config::new()).unwrap();
    assert!(asc.is_empty());
}

#[test]
fn missing_file() {
    let err = crate::read_file("testfiles/missing.phonon", Config::new())
        .unwrap_err();
    assert!(matches!(err, ParseError::Io(std::io::ErrorKind::NotFound, _)));
    assert!(err.to_string().contains("missing.phonon"));
}
