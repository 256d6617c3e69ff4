//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `balances` - Fungible balances (key: address || currency tag)
//! - `states` - Staking records (key: address)
//! - `meta` - Committed height and genesis parameters

use crate::{Config, Error, Result};
use dpos_core::{Address, Currency, Params, World, WorldState};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, DB};
use rust_decimal::Decimal;

/// Column family names
const CF_BALANCES: &str = "balances";
const CF_STATES: &str = "states";
const CF_META: &str = "meta";

const META_HEIGHT: &[u8] = b"height";
const META_PARAMS: &[u8] = b"params";

/// Upper bound for every key in `balances` and `states`
const KEY_RANGE_END: [u8; Address::LENGTH + 2] = [0xff; Address::LENGTH + 2];

/// Storage wrapper for RocksDB
pub struct Storage {
    db: DB,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("path", &self.db.path())
            .finish()
    }
}

impl Storage {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;
        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);
        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_BALANCES, Self::cf_options_lz4()),
            ColumnFamilyDescriptor::new(CF_STATES, Self::cf_options_lz4()),
            ColumnFamilyDescriptor::new(CF_META, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;
        tracing::info!(path = ?path, "Opened RocksDB");

        Ok(Self { db })
    }

    fn cf_options_lz4() -> Options {
        let mut opts = Options::default();
        // Snapshots are read back on every restart
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    /// Replace the persisted snapshot with `world` at `height`
    ///
    /// The previous snapshot is range-deleted and the new one written in the
    /// same batch, so readers see either block, never a mix.
    pub fn commit(&self, world: &World, height: i64) -> Result<()> {
        let cf_balances = self.cf_handle(CF_BALANCES)?;
        let cf_states = self.cf_handle(CF_STATES)?;
        let cf_meta = self.cf_handle(CF_META)?;

        let mut batch = WriteBatch::default();
        batch.delete_range_cf(cf_balances, Vec::<u8>::new(), KEY_RANGE_END.to_vec());
        batch.delete_range_cf(cf_states, Vec::<u8>::new(), KEY_RANGE_END.to_vec());

        let mut balances = 0usize;
        for ((address, currency), quantity) in world.balances() {
            batch.put_cf(
                cf_balances,
                balance_key(address, *currency),
                bincode::serialize(quantity)?,
            );
            balances += 1;
        }

        let mut states = 0usize;
        for (address, bytes) in world.states() {
            batch.put_cf(cf_states, address.as_bytes(), bytes);
            states += 1;
        }

        batch.put_cf(cf_meta, META_HEIGHT, height.to_be_bytes());
        batch.put_cf(cf_meta, META_PARAMS, bincode::serialize(world.params())?);

        self.db.write(batch)?;

        tracing::debug!(height, balances, states, "Snapshot committed");
        Ok(())
    }

    /// Committed height, if any block was committed
    pub fn height(&self) -> Result<Option<i64>> {
        let cf_meta = self.cf_handle(CF_META)?;
        match self.db.get_cf(cf_meta, META_HEIGHT)? {
            Some(bytes) => {
                let bytes: [u8; 8] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| Error::Corrupted("height is not 8 bytes".to_string()))?;
                Ok(Some(i64::from_be_bytes(bytes)))
            }
            None => Ok(None),
        }
    }

    /// Restore the committed snapshot and its height
    pub fn load(&self) -> Result<Option<(World, i64)>> {
        let Some(height) = self.height()? else {
            return Ok(None);
        };

        let cf_meta = self.cf_handle(CF_META)?;
        let params: Params = match self.db.get_cf(cf_meta, META_PARAMS)? {
            Some(bytes) => bincode::deserialize(&bytes)?,
            None => return Err(Error::Corrupted("missing genesis parameters".to_string())),
        };

        let mut balances = Vec::new();
        for item in self.db.iterator_cf(self.cf_handle(CF_BALANCES)?, IteratorMode::Start) {
            let (key, value) = item?;
            let quantity: Decimal = bincode::deserialize(&value)?;
            balances.push((decode_balance_key(&key)?, quantity));
        }

        let mut states = Vec::new();
        for item in self.db.iterator_cf(self.cf_handle(CF_STATES)?, IteratorMode::Start) {
            let (key, value) = item?;
            states.push((decode_address(&key)?, value.into_vec()));
        }

        tracing::info!(height, balances = balances.len(), states = states.len(), "Snapshot loaded");
        Ok(Some((World::from_parts(params, balances, states), height)))
    }
}

fn currency_tag(currency: Currency) -> u8 {
    match currency {
        Currency::GovernanceToken => 0,
        Currency::ConsensusToken => 1,
        Currency::Share => 2,
    }
}

fn currency_from_tag(tag: u8) -> Result<Currency> {
    match tag {
        0 => Ok(Currency::GovernanceToken),
        1 => Ok(Currency::ConsensusToken),
        2 => Ok(Currency::Share),
        other => Err(Error::Corrupted(format!("unknown currency tag {}", other))),
    }
}

fn balance_key(address: &Address, currency: Currency) -> Vec<u8> {
    let mut key = Vec::with_capacity(Address::LENGTH + 1);
    key.extend_from_slice(address.as_bytes());
    key.push(currency_tag(currency));
    key
}

fn decode_address(bytes: &[u8]) -> Result<Address> {
    let bytes: [u8; Address::LENGTH] = bytes
        .try_into()
        .map_err(|_| Error::Corrupted(format!("address key of {} bytes", bytes.len())))?;
    Ok(Address::new(bytes))
}

fn decode_balance_key(key: &[u8]) -> Result<(Address, Currency)> {
    match key.split_last() {
        Some((tag, address)) => Ok((decode_address(address)?, currency_from_tag(*tag)?)),
        None => Err(Error::Corrupted("empty balance key".to_string())),
    }
}
