//! LMDB implementation of StateStore.

use heed::types::Str;
use heed::{Database, Env};

use governdao_store::{StateStore, StoreError};

use crate::{LmdbEnvironment, LmdbError};

const STATE_DB: &str = "governdao_state";

pub struct LmdbStateStore {
    env: Env,
    db: Database<Str, Str>,
}

impl LmdbStateStore {
    /// Open (creating if needed) the state database inside `environment`.
    pub fn open(environment: &LmdbEnvironment) -> Result<Self, LmdbError> {
        let env = environment.env().clone();
        let mut wtxn = env.write_txn()?;
        let db: Database<Str, Str> = env.create_database(&mut wtxn, Some(STATE_DB))?;
        wtxn.commit()?;
        Ok(Self { env, db })
    }
}

impl StateStore for LmdbStateStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let value = self.db.get(&rtxn, key).map_err(LmdbError::from)?;
        Ok(value.map(str::to_owned))
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.db.put(&mut wtxn, key, value).map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
