use pairwise_ir::parse::parse_parameters;
use pairwise_ir::validate::validate_parameter_set;

#[test]
fn test_parse_display_settings_fixture() {
    let json = include_str!("fixtures/display_settings.json");
    let set = parse_parameters(json).unwrap();
    assert_eq!(
        set.names(),
        vec!["Display Mode", "Language", "Fonts", "Color", "Screen Size"]
    );
    assert_eq!(set.get("Language").unwrap().values.len(), 4);
    assert!(validate_parameter_set(&set).is_ok());
}

#[test]
fn test_round_trip_keeps_order() {
    let json = include_str!("fixtures/display_settings.json");
    let set = parse_parameters(json).unwrap();
    let encoded = serde_json::to_string(&set).unwrap();
    let again = parse_parameters(&encoded).unwrap();
    assert_eq!(set, again);
}

#[test]
fn test_single_parameter_is_rejected_by_validation() {
    let set = parse_parameters(r#"{"Only": ["a", "b"]}"#).unwrap();
    let errors = validate_parameter_set(&set).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().contains("at least 2 parameters"));
}
