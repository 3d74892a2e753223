use std::path::Path;

use gamigrate::{MigrateError, SitesFile};

/// Read and parse a TOML sites file.
pub fn load(path: &Path) -> Result<SitesFile, MigrateError> {
    let text = std::fs::read_to_string(path).map_err(|e| MigrateError::Io {
        path: path.display().to_string(),
        msg: e.to_string(),
    })?;
    parse(&text).map_err(|e| match e {
        MigrateError::Config(msg) => MigrateError::Config(format!("{}: {msg}", path.display())),
        other => other,
    })
}

pub fn parse(text: &str) -> Result<SitesFile, MigrateError> {
    let file: SitesFile = toml::from_str(text).map_err(|e| MigrateError::Config(e.to_string()))?;
    for (name, site) in &file.sites {
        if site.property.trim().is_empty() {
            return Err(MigrateError::Config(format!("site {name:?} has an empty property")));
        }
        if site.website_id.is_nil() {
            return Err(MigrateError::Config(format!("site {name:?} has a nil website_id")));
        }
    }
    Ok(file)
}
