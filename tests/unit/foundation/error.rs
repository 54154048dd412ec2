use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        TexviewError::bounds("x")
            .to_string()
            .contains("bounds error:")
    );
    assert!(
        TexviewError::configuration("x")
            .to_string()
            .contains("configuration error:")
    );
    assert!(
        TexviewError::lookup("x")
            .to_string()
            .contains("lookup error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = TexviewError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
