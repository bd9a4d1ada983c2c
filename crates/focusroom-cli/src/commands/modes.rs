use focusroom_core::{for_methodology, Config, Methodology};

/// Print every methodology descriptor, with presets resolved against the
/// user's config.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let descriptors: Vec<_> = Methodology::ALL
        .into_iter()
        .map(|m| for_methodology(m, Some(&config)))
        .collect();
    println!("{}", serde_json::to_string_pretty(&descriptors)?);
    Ok(())
}
