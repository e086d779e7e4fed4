mod mem;
mod mysql;

pub use mem::MemStore;
pub use mysql::MysqlStore;

use crate::config::Storage;

use reactrole::store::{StoreError, TemporaryRoleStore};

use std::sync::Arc;

/// Connects the store backend selected by the configuration.
pub async fn connect(config: &Storage) -> Result<Arc<dyn TemporaryRoleStore>, StoreError> {
    match config.driver.as_str() {
        "mem" => Ok(Arc::new(MemStore::new())),
        "mysql" => {
            let store = MysqlStore::connect(&config.connect_string()).await?;
            store.create().await?;

            Ok(Arc::new(store))
        }
        driver => Err(StoreError::new(format!(
            "unknown storage driver: {}",
            driver
        ))),
    }
}
