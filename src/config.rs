use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::encoding::LayoutKind;
use crate::error::AsmError;
use crate::image::RomGeometry;

/// Settings for one assembler run. Every field has a default, so a JSON file
/// only needs to name what it changes:
///
/// ```json
/// { "layout": "narrow", "geometry": { "step_bits": 5 } }
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsmConfig {
    /// Emit trace diagnostics from the start of the run.
    pub trace: bool,
    pub layout: LayoutKind,
    pub geometry: RomGeometry,
}

impl AsmConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn load(path: &Path) -> Result<Self, AsmError> {
        let text = std::fs::read_to_string(path).map_err(|source| AsmError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg = Self::from_json(&text).map_err(|source| AsmError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        cfg.geometry.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = AsmConfig::from_json(r#"{ "layout": "narrow", "geometry": { "step_bits": 5 } }"#).unwrap();
        assert_eq!(cfg.layout, LayoutKind::Narrow);
        assert_eq!(cfg.geometry.step_bits, 5);
        assert_eq!(cfg.geometry.cmd_bits, 8);
        assert!(!cfg.trace);
        assert_eq!(AsmConfig::from_json("{}").unwrap(), AsmConfig::default());
    }

    #[test]
    fn unknown_layout_is_an_error() {
        assert!(AsmConfig::from_json(r#"{ "layout": "wide" }"#).is_err());
    }
}
