use std::path::Path;

use tokio::fs;

use crate::error::{Error, Result};

/// Parses a byte count such as `1048576`, `512KiB`, `10M` or `1.5GB`.
///
/// Decimal suffixes (`k`, `m`, `g`) scale by powers of 1000, binary ones
/// (`ki`, `mi`, `gi`) by powers of 1024.
pub fn parse_byte_size(input: &str) -> Result<u64> {
    let normalized = input.trim();
    if normalized.is_empty() {
        return Err(Error::invalid("size cannot be empty"));
    }

    let mut number_part = String::new();
    let mut suffix_part = String::new();
    for ch in normalized.chars() {
        if suffix_part.is_empty() && (ch.is_ascii_digit() || ch == '.') {
            number_part.push(ch);
        } else {
            suffix_part.push(ch);
        }
    }

    let value: f64 = number_part
        .parse()
        .map_err(|_| Error::invalid(format!("invalid numeric value in size: {normalized}")))?;

    let multiplier = match suffix_part.trim().to_ascii_lowercase().as_str() {
        "" | "b" => 1.0,
        "k" | "kb" => 1_000.0,
        "ki" | "kib" => 1024.0,
        "m" | "mb" => 1_000_000.0,
        "mi" | "mib" => 1_048_576.0,
        "g" | "gb" => 1_000_000_000.0,
        "gi" | "gib" => 1_073_741_824.0,
        other => return Err(Error::invalid(format!("unsupported size suffix: {other}"))),
    };

    let bytes = (value * multiplier).round();
    if !bytes.is_finite() || bytes >= u64::MAX as f64 {
        return Err(Error::invalid(format!("size is too large: {normalized}")));
    }
    Ok(bytes as u64)
}

pub fn format_bytes(value: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut val = value as f64;
    let mut unit = 0usize;
    while val >= 1024.0 && unit < UNITS.len() - 1 {
        val /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", value, UNITS[unit])
    } else {
        format!("{val:.2} {}", UNITS[unit])
    }
}

pub async fn ensure_dir(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() || path.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_suffixed_sizes() {
        assert_eq!(parse_byte_size("1048576").unwrap(), 1_048_576);
        assert_eq!(parse_byte_size("512KiB").unwrap(), 524_288);
        assert_eq!(parse_byte_size("1MiB").unwrap(), 1_048_576);
        assert_eq!(parse_byte_size("10M").unwrap(), 10_000_000);
        assert_eq!(parse_byte_size(" 1.5 GB ").unwrap(), 1_500_000_000);
        assert_eq!(parse_byte_size("0").unwrap(), 0);
    }

    #[test]
    fn rejects_garbage_sizes() {
        assert!(matches!(parse_byte_size(""), Err(Error::InvalidInput(_))));
        assert!(matches!(parse_byte_size("MiB"), Err(Error::InvalidInput(_))));
        assert!(matches!(parse_byte_size("12XB"), Err(Error::InvalidInput(_))));
        assert!(matches!(parse_byte_size("1.2.3"), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn rejects_sizes_beyond_u64() {
        let err = parse_byte_size("99999999999999999999999").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(ref m) if m.contains("too large")));
        assert!(parse_byte_size("20000000000GiB").is_err());
        assert_eq!(parse_byte_size("1000000GiB").unwrap(), 1_073_741_824_000_000);
    }

    #[test]
    fn formats_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1_048_576), "1.00 MiB");
        assert_eq!(format_bytes(10 * 1024 * 1024 + 512 * 1024), "10.50 MiB");
    }

    #[tokio::test]
    async fn ensure_dir_creates_nested_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("a").join("b");
        ensure_dir(&target).await.unwrap();
        assert!(target.is_dir());
        ensure_dir(&target).await.unwrap();
    }
}
