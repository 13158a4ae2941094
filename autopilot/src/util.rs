use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::Path;

// Seeds are written as hex (0xDEAD_BEEF) or decimal; underscores are
// separators, matching how seeds appear in reports and file names.
pub fn parse_seed(seed: &str) -> Result<u32> {
    let cleaned: String = seed.trim().chars().filter(|c| *c != '_').collect();
    if cleaned.is_empty() {
        return Err(anyhow!("empty seed"));
    }
    if let Some(hex) = cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
    {
        u32::from_str_radix(hex, 16).with_context(|| format!("invalid hex seed: {seed}"))
    } else {
        cleaned
            .parse::<u32>()
            .with_context(|| format!("invalid decimal seed: {seed}"))
    }
}

pub fn seed_to_hex(seed: u32) -> String {
    format!("0x{seed:08x}")
}

pub fn parse_seed_csv(input: &str) -> Result<Vec<u32>> {
    let mut seeds = Vec::new();
    for token in input.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        seeds.push(parse_seed(token)?);
    }
    if seeds.is_empty() {
        return Err(anyhow!("no seeds parsed from --seeds"));
    }
    Ok(seeds)
}

pub fn parse_seed_file(path: &Path) -> Result<Vec<u32>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed reading seed file {}", path.display()))?;
    let mut seeds = Vec::new();
    for line in data.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        seeds.push(parse_seed(trimmed)?);
    }
    if seeds.is_empty() {
        return Err(anyhow!("seed file {} had no seeds", path.display()));
    }
    Ok(seeds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_decimal_and_underscored_seeds() {
        assert_eq!(parse_seed("0xDEAD_BEEF").unwrap(), 0xDEAD_BEEF);
        assert_eq!(parse_seed("0x00000010").unwrap(), 16);
        assert_eq!(parse_seed("1_000_000").unwrap(), 1_000_000);
        assert_eq!(parse_seed(" 42 ").unwrap(), 42);
        assert!(parse_seed("").is_err());
        assert!(parse_seed("0xZZ").is_err());
    }

    #[test]
    fn seed_csv_skips_blank_tokens() {
        let seeds = parse_seed_csv("0x10,,32, 0x40 ").unwrap();
        assert_eq!(seeds, vec![16, 32, 64]);
        assert!(parse_seed_csv(" , ,").is_err());
    }
}
