use std::str::FromStr;

/// Parse a wire enum value from a flag. Case and hyphens are forgiven:
/// `add-beneficiary` reads as `ADD_BENEFICIARY`.
pub fn parse_enum<T>(raw: &str, field: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let normalized = raw.trim().replace('-', "_").to_ascii_uppercase();
    normalized
        .parse::<T>()
        .map_err(|error| anyhow::anyhow!("invalid {field} '{raw}': {error}"))
}
