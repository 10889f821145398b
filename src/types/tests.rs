use super::Monetary;
use anyhow::Result;
use std::str::FromStr;

#[test]
fn test_monetary_successfully_parses_valid_strings() -> Result<()> {
    let test_cases = vec![
        ("1.0", "1.00"),
        ("0.01", "0.01"),
        ("-1.5", "-1.50"),
        ("  1.0  ", "1.00"),
        ("-0.01", "-0.01"),
        ("100", "100.00"),
        ("20000", "20000.00"),
        ("1.50000", "1.50"),
    ];

    for (input_string, expected_output) in test_cases {
        assert_eq!(Monetary::from_str(input_string)?.to_string(), expected_output);
    }

    Ok(())
}

#[test]
fn test_monetary_fails_to_parse_invalid_strings() {
    assert!(Monetary::from_str("1.001").is_err());
    assert!(Monetary::from_str("abc").is_err());
    assert!(Monetary::from_str("1.2.3").is_err());
    assert!(Monetary::from_str("").is_err());
    assert!(Monetary::from_str("   ").is_err());
}

#[test]
fn test_monetary_equality_ignores_input_scale() -> Result<()> {
    assert_eq!(Monetary::from_str("50000")?, Monetary::from(50_000));
    assert_eq!(Monetary::from_str("7.5")?, Monetary::from_str("7.50")?);

    Ok(())
}

#[test]
fn test_monetary_supports_checked_arithmetic() -> Result<()> {
    let value = Monetary::from_str("1.5")?
        .checked_add(Monetary::from_str("2.5")?)
        .ok_or_else(|| anyhow::anyhow!("unexpected overflow"))?;

    assert_eq!(value.to_string(), "4.00");

    let value = value.checked_sub(Monetary::from(5)).ok_or_else(|| anyhow::anyhow!("unexpected overflow"))?;

    assert_eq!(value.to_string(), "-1.00");
    assert!(value.is_negative());
    assert_eq!(value.clamp_non_negative(), Monetary::ZERO);
    assert_eq!(value.abs(), Monetary::from(1));

    Ok(())
}

#[test]
fn test_monetary_checked_sum_adds_signed_values() -> Result<()> {
    let values = vec![Monetary::from(1000), -Monetary::from(200), Monetary::from_str("0.25")?];

    assert_eq!(Monetary::checked_sum(values), Some(Monetary::from_str("800.25")?));
    assert_eq!(Monetary::checked_sum(Vec::new()), Some(Monetary::ZERO));

    Ok(())
}

#[test]
fn test_monetary_detects_overflow() -> Result<()> {
    let max = Monetary::from_decimal(rust_decimal::Decimal::MAX)?;

    assert!(max.checked_add(max).is_none());
    assert!(Monetary::checked_sum(vec![max, max]).is_none());

    Ok(())
}
