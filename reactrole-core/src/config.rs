use log::LevelFilter;
use serde::{Deserialize, Serialize};

use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub token: String,
    pub loglevel: LevelFilter,
    pub storage: Storage,
    /// Seconds between two expiry sweeps.
    pub sweep_interval: u64,
}

impl Config {
    pub fn load<P>(path: P) -> Self
    where
        P: AsRef<Path>,
    {
        let mut file = File::open(path).unwrap();
        let mut buf = Vec::new();
        file.read_to_end(&mut buf).unwrap();

        toml::from_slice(&buf).unwrap()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: String::new(),
            loglevel: LevelFilter::Info,
            storage: Storage::default(),
            sweep_interval: 60,
        }
    }
}

/// Storage configuration section. Not all fields are required for all
/// driver types; the `mem` driver ignores everything but `driver`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Storage {
    pub driver: String,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Storage {
    pub fn connect_string(&self) -> String {
        format!(
            "{}://{}:{}@{}:{}/{}?ssl-mode=DISABLED",
            self.driver, self.user, self.password, self.host, self.port, self.database
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, Storage};

    #[test]
    fn test_storage_connect_string() {
        let storage = Storage {
            driver: String::from("mysql"),
            host: String::from("127.0.0.1"),
            port: 3306,
            user: String::from("reactrole"),
            password: String::from("pw"),
            database: String::from("db"),
        };

        assert_eq!(
            storage.connect_string(),
            "mysql://reactrole:pw@127.0.0.1:3306/db?ssl-mode=DISABLED"
        )
    }

    #[test]
    fn test_config_from_toml() {
        let config: Config = toml::from_str(
            r#"
            token = "abc"
            loglevel = "DEBUG"
            sweep_interval = 30

            [storage]
            driver = "mem"
            host = ""
            port = 0
            user = ""
            password = ""
            database = ""
            "#,
        )
        .unwrap();

        assert_eq!(config.token, "abc");
        assert_eq!(config.loglevel, log::LevelFilter::Debug);
        assert_eq!(config.sweep_interval, 30);
        assert_eq!(config.storage.driver, "mem");
    }
}
