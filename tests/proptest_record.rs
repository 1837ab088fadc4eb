use proptest::prelude::*;

use dhcp2tinydns::Record;

/// Markers of every variant that takes positional fields.
const FIELD_MARKERS: &[&str] = &["%", ".", "&", "=", "+", "-", "@", "'", "^", "C", "Z", ":"];

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    #[test]
    fn parse_never_panics_on_arbitrary_lines(line: String) {
        let _ = Record::parse(&line);
    }

    #[test]
    fn parse_serialize_is_idempotent(
        marker in prop::sample::select(FIELD_MARKERS),
        values in prop::collection::vec("[a-z0-9.-]{0,12}", 0..8)
    ) {
        let line = format!("{marker}{}", values.join(":"));
        let record = Record::parse(&line).unwrap();
        let serialized = record.to_line();
        let reparsed = Record::parse(&serialized).unwrap();
        prop_assert_eq!(&reparsed, &record);
        prop_assert_eq!(reparsed.to_line(), serialized);
    }

    #[test]
    fn serialization_never_grows_trailing_separators(
        marker in prop::sample::select(FIELD_MARKERS),
        values in prop::collection::vec("[a-z0-9.-]{0,12}", 0..8)
    ) {
        let line = format!("{marker}{}", values.join(":"));
        let serialized = Record::parse(&line).unwrap().to_line();
        let stripped = serialized.trim_end_matches('\n');
        // The marker always survives; the fields behind it never keep
        // trailing separators.
        prop_assert!(stripped.starts_with(marker));
        prop_assert!(!stripped[marker.len()..].ends_with(':'));
    }

    #[test]
    fn comments_round_trip_verbatim(text in "[ -~]{0,40}") {
        let line = format!("#{text}");
        let record = Record::parse(&line).unwrap();
        prop_assert_eq!(record.to_line(), format!("{}\n", line.trim()));
    }
}
