use std::path::PathBuf;

use serde::Deserialize;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    osc: OscConfig,
    #[serde(default)]
    filters: FiltersConfig,
    #[serde(default)]
    avatar: AvatarConfig,
}

#[derive(Deserialize, Default)]
struct OscConfig {
    send_address: Option<String>,
    send_port: Option<u16>,
    receive_address: Option<String>,
    receive_port: Option<u16>,
}

#[derive(Deserialize, Default)]
struct FiltersConfig {
    excluded_prefixes: Option<Vec<String>>,
}

#[derive(Deserialize, Default)]
struct AvatarConfig {
    descriptor_dir: Option<String>,
}

pub struct Config {
    file: ConfigFile,
}

impl Config {
    pub fn load() -> Self {
        let mut base: ConfigFile =
            toml::from_str(DEFAULT_CONFIG).expect("Failed to parse embedded config.toml");

        if let Some(path) = user_config_path() {
            if path.exists() {
                if let Ok(contents) = std::fs::read_to_string(&path) {
                    match toml::from_str::<ConfigFile>(&contents) {
                        Ok(user) => merge(&mut base, user),
                        Err(e) => log::warn!("ignoring invalid user config: {}", e),
                    }
                }
            }
        }

        Config { file: base }
    }

    /// Destination VRChat listens on for parameter writes.
    pub fn send_endpoint(&self) -> (String, u16) {
        (
            self.file
                .osc
                .send_address
                .clone()
                .unwrap_or_else(|| "127.0.0.1".to_string()),
            self.file.osc.send_port.unwrap_or(9000),
        )
    }

    /// Local endpoint we receive parameter reports on.
    pub fn receive_endpoint(&self) -> (String, u16) {
        (
            self.file
                .osc
                .receive_address
                .clone()
                .unwrap_or_else(|| "127.0.0.1".to_string()),
            self.file.osc.receive_port.unwrap_or(9001),
        )
    }

    pub fn excluded_prefixes(&self) -> Vec<String> {
        self.file
            .filters
            .excluded_prefixes
            .clone()
            .unwrap_or_default()
    }

    pub fn descriptor_dir(&self) -> Option<PathBuf> {
        self.file.avatar.descriptor_dir.as_deref().map(PathBuf::from)
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("oscremote").join("config.toml"))
}

fn merge(base: &mut ConfigFile, user: ConfigFile) {
    if user.osc.send_address.is_some() {
        base.osc.send_address = user.osc.send_address;
    }
    if user.osc.send_port.is_some() {
        base.osc.send_port = user.osc.send_port;
    }
    if user.osc.receive_address.is_some() {
        base.osc.receive_address = user.osc.receive_address;
    }
    if user.osc.receive_port.is_some() {
        base.osc.receive_port = user.osc.receive_port;
    }
    if user.filters.excluded_prefixes.is_some() {
        base.filters.excluded_prefixes = user.filters.excluded_prefixes;
    }
    if user.avatar.descriptor_dir.is_some() {
        base.avatar.descriptor_dir = user.avatar.descriptor_dir;
    }
}
