use sigpolval::*;
use tempfile::tempdir;

#[test]
fn settings_round_trip() {
    let dir = tempdir().unwrap();
    let fname = dir.path().join("settings.json");
    let fname = fname.to_str().unwrap().to_string();

    let mut cs = ConstraintSettings::new();
    cs.set_initial_explicit_policy_indicator(true);
    cs.set_validation_time(1_700_000_000);
    cs.set_revocation_skip_policies(vec![WILDCARD.to_string()]);
    cs.set_revocation_freshness(86_400);
    cs.set_recognized_sign_pol_extensions(vec!["1.2.3.4".to_string()]);
    write_settings(&fname, &cs).unwrap();

    let read = read_settings(&Some(fname)).unwrap();
    assert_eq!(cs, read);
    assert!(read.get_initial_explicit_policy_indicator());
    assert_eq!(Some(86_400), read.get_revocation_freshness());
}

#[test]
fn missing_or_absent_file_yields_defaults() {
    assert_eq!(ConstraintSettings::new(), read_settings(&None).unwrap());

    let dir = tempdir().unwrap();
    let fname = dir.path().join("nonexistent.json");
    let read = read_settings(&Some(fname.to_str().unwrap().to_string())).unwrap();
    assert!(read.0.is_empty());
}

#[test]
fn malformed_file_is_a_parse_error() {
    let dir = tempdir().unwrap();
    let fname = dir.path().join("bad.json");
    std::fs::write(&fname, b"{\"psValidationTime\": ").unwrap();
    assert_eq!(
        Err(Error::ParseError),
        read_settings(&Some(fname.to_str().unwrap().to_string()))
    );
}
