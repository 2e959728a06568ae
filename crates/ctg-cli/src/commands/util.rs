use anyhow::{anyhow, Result};

/// `auto` (all CPUs, reported as 0) or a positive thread count.
pub fn parse_threads(spec: &str) -> Result<usize> {
    if spec.eq_ignore_ascii_case("auto") {
        return Ok(0);
    }
    match spec.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(anyhow!(
            "invalid thread count '{spec}'; use 'auto' or a positive number"
        )),
    }
}

/// Split a comma-separated list, dropping blanks.
pub fn parse_list(spec: Option<&str>) -> Vec<String> {
    spec.unwrap_or("")
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Negative thresholds clamp to zero; NaN and infinities are rejected.
pub fn check_threshold(value: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(anyhow!("threshold must be a finite number"));
    }
    Ok(value.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threads_accept_auto_and_numbers() {
        assert_eq!(parse_threads("auto").unwrap(), 0);
        assert_eq!(parse_threads("AUTO").unwrap(), 0);
        assert_eq!(parse_threads("4").unwrap(), 4);
        assert!(parse_threads("0").is_err());
        assert!(parse_threads("many").is_err());
    }

    #[test]
    fn lists_drop_blanks() {
        assert_eq!(parse_list(Some("Base, Future,,")), vec!["Base", "Future"]);
        assert!(parse_list(None).is_empty());
    }

    #[test]
    fn thresholds_clamp() {
        assert_eq!(check_threshold(-3.0).unwrap(), 0.0);
        assert_eq!(check_threshold(85.0).unwrap(), 85.0);
        assert!(check_threshold(f64::NAN).is_err());
    }
}
