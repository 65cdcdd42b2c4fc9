//! Runtime configuration.
//!
//! Every section is optional in the TOML file. Missing keys fall back to the
//! defaults below, which reproduce the stock demo.
//!
//! ```toml
//! [label]
//! text = "Hello"
//! color = 0x3366ff
//!
//! [ornaments]
//! count = 250
//! seed = 42
//!
//! [spin]
//! mode = "guarded"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::director::{FlyInParams, SpinParams};
use crate::error::{Error, Result};
use crate::rig::CameraParams;
use crate::scene::{LabelParams, ScatterParams};
use crate::viewport::ViewportParams;

/// Initial window settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    /// Logical width.
    pub width: u32,
    /// Logical height.
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "MetallicA".to_owned(),
            width: 1280,
            height: 720,
        }
    }
}

/// Asset file locations, relative to the working directory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetPaths {
    pub font: PathBuf,
    pub matcap: PathBuf,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            font: PathBuf::from("fonts/metold.json"),
            matcap: PathBuf::from("textures/matcaps/3.png"),
        }
    }
}

/// Everything the demo can be tuned with.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub window: WindowConfig,
    pub assets: AssetPaths,
    pub label: LabelParams,
    pub ornaments: ScatterParams,
    pub camera: CameraParams,
    pub fly_in: FlyInParams,
    pub spin: SpinParams,
    pub viewport: ViewportParams,
}

impl DemoConfig {
    /// Reads a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
