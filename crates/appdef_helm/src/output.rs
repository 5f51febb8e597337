//! Reading and writing chart files.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde_yaml::{Mapping, Value};

use crate::error::{HelmError, HelmResult};

/// Read an existing chart file as a mapping. A missing file reads as empty.
pub(crate) fn read_existing(dir: &Path, file: &'static str) -> HelmResult<Mapping> {
    let data = match fs::read_to_string(dir.join(file)) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Mapping::new()),
        Err(e) => return Err(e.into()),
    };
    let value: Value = serde_yaml::from_str(&data)
        .map_err(|source| HelmError::ParseExisting { file, source })?;
    match value {
        Value::Null => Ok(Mapping::new()),
        Value::Mapping(mapping) => Ok(mapping),
        _ => Err(HelmError::NotAMapping { file }),
    }
}

/// Write a chart file readable by everyone and writable by its owner.
pub(crate) fn write_file(path: &Path, contents: &str) -> HelmResult<()> {
    fs::write(path, contents)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o644))?;
    }
    Ok(())
}
