//! Parsing functions for comma-separated option values.

fn parse_component(value: &str, name: &str) -> Result<f64, String> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("Invalid {} value: {}", name, value))
}

/// Parse white balance multipliers in format "R,G,B"
///
/// # Arguments
/// * `wb_str` - A string in format "R,G,B" with non-negative multipliers
///
/// # Returns
/// An array of [R, G, B] multipliers
pub fn parse_white_balance(wb_str: &str) -> Result<[f64; 3], String> {
    let parts: Vec<&str> = wb_str.split(',').collect();
    if parts.len() != 3 {
        return Err(format!(
            "White balance must be in format R,G,B (e.g., 1.0,0.95,1.1), got: {}",
            wb_str
        ));
    }

    let r = parse_component(parts[0], "red")?;
    let g = parse_component(parts[1], "green")?;
    let b = parse_component(parts[2], "blue")?;

    for (val, name) in [(r, "Red"), (g, "Green"), (b, "Blue")] {
        if !val.is_finite() || val < 0.0 {
            return Err(format!("{} multiplier {} must be >= 0", name, val));
        }
    }

    Ok([r, g, b])
}

/// Parse sigmoidal contrast in format "STRENGTH" or "STRENGTH,MIDPOINT"
///
/// The midpoint is `None` when omitted, leaving the configured value alone.
pub fn parse_sigmoidal(sigmoidal_str: &str) -> Result<(f64, Option<f64>), String> {
    let parts: Vec<&str> = sigmoidal_str.split(',').collect();
    match parts.as_slice() {
        [strength] => Ok((parse_component(strength, "strength")?, None)),
        [strength, midpoint] => {
            let midpoint = parse_component(midpoint, "midpoint")?;
            if !(0.0..=1.0).contains(&midpoint) {
                return Err(format!("Midpoint {} must be in range [0.0, 1.0]", midpoint));
            }
            Ok((parse_component(strength, "strength")?, Some(midpoint)))
        }
        _ => Err(format!(
            "Sigmoidal contrast must be in format STRENGTH[,MIDPOINT], got: {}",
            sigmoidal_str
        )),
    }
}
