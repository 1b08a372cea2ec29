use serde::{Deserialize, Serialize};
use std::path::Path;

/// `config.toml` in the working directory. A missing file yields defaults;
/// a malformed one is a startup error.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub video: VideoConfig,
    pub gamepad: GamepadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Window scale factor, clamped to [0, 4].
    pub scale: u32,
    /// Reserve 160 px to the right of the game area for a status readout.
    pub is_show_debug: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GamepadConfig {
    pub is_enabled: bool,
    /// Host gamepad button IDs in Joypad bit order:
    /// A, B, Select, Start, Right, Left, Up, Down.
    pub bind: [u32; 8],
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            scale: 2,
            is_show_debug: false,
        }
    }
}

impl Default for GamepadConfig {
    fn default() -> Self {
        Self {
            is_enabled: false,
            bind: [0; 8],
        }
    }
}

pub fn load(path: &Path) -> Config {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(_) => return Config::default(),
    };

    match toml::from_str::<Config>(&text) {
        Ok(cfg) => cfg,
        Err(e) => panic!("malformed config {}: {e}", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file() {
        let cfg = load(Path::new("does-not-exist.toml"));
        assert_eq!(cfg.video.scale, 2);
        assert!(!cfg.gamepad.is_enabled);
    }

    #[test]
    fn parses_partial_config() {
        let cfg: Config = toml::from_str(
            "[video]\nscale = 3\n\n[gamepad]\nis_enabled = true\nbind = [0,1,2,3,4,5,6,7]\n",
        )
        .unwrap();
        assert_eq!(cfg.video.scale, 3);
        assert!(!cfg.video.is_show_debug);
        assert!(cfg.gamepad.is_enabled);
        assert_eq!(cfg.gamepad.bind[7], 7);
    }
}
