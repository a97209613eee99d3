use pocatalog::CatalogConfig;
use std::fs;
use std::path::Path;

/// Load catalog settings from a TOML file, or the defaults when no file is given.
///
/// Keys mirror [`CatalogConfig`]'s fields; missing keys keep their defaults.
pub fn load_config(path: Option<&str>) -> Result<CatalogConfig, String> {
    let Some(path) = path else {
        return Ok(CatalogConfig::default());
    };
    let text = fs::read_to_string(Path::new(path))
        .map_err(|e| format!("Cannot read config file {}: {}", path, e))?;
    let config = parse_config(&text).map_err(|e| format!("Invalid config file {}: {}", path, e))?;
    config
        .check()
        .map_err(|e| format!("Invalid config file {}: {}", path, e))?;
    Ok(config)
}

pub fn parse_config(text: &str) -> Result<CatalogConfig, toml::de::Error> {
    toml::from_str(text)
}
