use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        CaptioncastError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        CaptioncastError::invalid_duration("nan")
            .to_string()
            .contains("invalid duration:")
    );
    assert!(
        CaptioncastError::encoder_configuration("no libx264")
            .to_string()
            .contains("encoder configuration failed:")
    );
    assert!(
        CaptioncastError::mux_finalize("x")
            .to_string()
            .contains("mux finalize failed:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = CaptioncastError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
    assert!(!err.is_cancelled());
    assert!(CaptioncastError::Cancelled.is_cancelled());
}
