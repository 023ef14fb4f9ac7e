use crate::core::{CriterionKind, MiningCriterion};
use crate::error::{LedgerError, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::env;
use std::sync::RwLock;

pub static GLOBAL_CONFIG: Lazy<Config> = Lazy::new(Config::new);

const MINING_TYPE_KEY: &str = "MINING_TYPE";
const MINING_DIFFICULTY_KEY: &str = "MINING_DIFFICULTY";
const PENDING_TRANSACTIONS_KEY: &str = "PENDING_TRANSACTIONS";
const CHAIN_LOCATION_KEY: &str = "CHAIN_LOCATION";

static DEFAULT_MINING_TYPE: &str = "leading_zeros";
static DEFAULT_MINING_DIFFICULTY: &str = "3";
static DEFAULT_PENDING_TRANSACTIONS: &str = "1";
static DEFAULT_CHAIN_LOCATION: &str = "BLOCKCHAIN.json";

pub struct Config {
    inner: RwLock<HashMap<String, String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Config {
        let mut map = HashMap::new();
        for (key, default) in [
            (MINING_TYPE_KEY, DEFAULT_MINING_TYPE),
            (MINING_DIFFICULTY_KEY, DEFAULT_MINING_DIFFICULTY),
            (PENDING_TRANSACTIONS_KEY, DEFAULT_PENDING_TRANSACTIONS),
            (CHAIN_LOCATION_KEY, DEFAULT_CHAIN_LOCATION),
        ] {
            let value = env::var(key).unwrap_or_else(|_| default.to_string());
            map.insert(String::from(key), value);
        }

        Config {
            inner: RwLock::new(map),
        }
    }

    fn get(&self, key: &str) -> String {
        let inner = self
            .inner
            .read()
            .expect("Failed to acquire read lock on config - this should never happen");
        inner
            .get(key)
            .expect("All config keys are seeded with defaults")
            .clone()
    }

    pub fn get_mining_type(&self) -> String {
        self.get(MINING_TYPE_KEY)
    }

    pub fn get_mining_difficulty(&self) -> Result<usize> {
        let raw = self.get(MINING_DIFFICULTY_KEY);
        raw.parse().map_err(|_| {
            LedgerError::Config(format!("invalid mining difficulty: {raw}"))
        })
    }

    pub fn get_pending_transactions_limit(&self) -> Result<usize> {
        let raw = self.get(PENDING_TRANSACTIONS_KEY);
        match raw.parse() {
            Ok(limit) if limit > 0 => Ok(limit),
            _ => Err(LedgerError::Config(format!(
                "invalid pending transactions limit: {raw}"
            ))),
        }
    }

    pub fn get_chain_location(&self) -> String {
        self.get(CHAIN_LOCATION_KEY)
    }

    pub fn set_chain_location(&self, location: String) {
        let mut inner = self
            .inner
            .write()
            .expect("Failed to acquire write lock on config - this should never happen");
        inner.insert(String::from(CHAIN_LOCATION_KEY), location);
    }

    /// Assemble the configured mining criterion. An unrecognized criterion
    /// type is a fatal configuration error.
    pub fn criterion(&self) -> Result<MiningCriterion> {
        let kind: CriterionKind = self.get_mining_type().parse()?;
        Ok(MiningCriterion::new(kind, self.get_mining_difficulty()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert_eq!(config.get_mining_type(), "leading_zeros");
        assert_eq!(config.get_mining_difficulty().unwrap(), 3);
        assert_eq!(config.get_pending_transactions_limit().unwrap(), 1);
        assert_eq!(config.get_chain_location(), "BLOCKCHAIN.json");
    }

    #[test]
    fn test_criterion_from_defaults() {
        let criterion = Config::new().criterion().unwrap();
        assert_eq!(criterion, MiningCriterion::leading_zeros(3));
    }

    #[test]
    fn test_set_chain_location() {
        let config = Config::new();
        config.set_chain_location("/tmp/chain.json".to_string());
        assert_eq!(config.get_chain_location(), "/tmp/chain.json");
    }
}
