/// Tests for the DoD 5220.22-M pass table
///
/// Tests verify:
/// - 3-pass sequence (0x00, 0xFF, random)
/// - Pass labels
/// - Method wiring through `Algorithm`

#[cfg(test)]
mod dod_algorithm_tests {
    use crate::algorithms::dod::DoDWipe;
    use crate::algorithms::{Algorithm, PassFill};
    use crate::WipeMethod;

    #[test]
    fn test_dod_constants() {
        assert_eq!(DoDWipe::PASS_COUNT, 3, "DoD 5220.22-M requires exactly 3 passes");
        assert_eq!(DoDWipe::PASS_1_PATTERN, 0x00, "Pass 1 must be all zeros");
        assert_eq!(DoDWipe::PASS_2_PATTERN, 0xFF, "Pass 2 must be all ones");
    }

    #[test]
    fn test_dod_pass_sequence() {
        let fills: Vec<PassFill> = DoDWipe::passes().iter().map(|p| p.fill).collect();

        assert_eq!(
            fills,
            vec![
                PassFill::Pattern(0x00),
                PassFill::Pattern(0xFF),
                PassFill::Random
            ]
        );
    }

    #[test]
    fn test_dod_labels() {
        let labels: Vec<String> = DoDWipe::passes().into_iter().map(|p| p.label).collect();

        assert_eq!(
            labels,
            vec![
                "DoD Pass 1/3 (0x00)",
                "DoD Pass 2/3 (0xFF)",
                "DoD Pass 3/3 (Random)",
            ]
        );
    }

    #[test]
    fn test_dod_algorithm_matches_method() {
        let algorithm = Algorithm::for_method(WipeMethod::DoD522022M);

        assert_eq!(algorithm.method(), WipeMethod::DoD522022M);
        assert_eq!(algorithm.pass_count(), WipeMethod::DoD522022M.pass_count());
        assert_eq!(algorithm.passes(), DoDWipe::passes().as_slice());
    }
}
