//! Local price override store.
//!
//! A single durable slot holds a JSON object `{ teacher_id: price }`.
//! It is the second tier of price resolution and the write-through
//! cache for manual price edits on teachers without a stored price.
//!
//! CONTRACT: get / set / get_all never return errors. Slot failures and
//! malformed contents are logged and read as an empty map; `set` skips
//! the write when the slot cannot be read. The raw `load_map()` keeps
//! the Result for callers that want to see them.

use crate::{
    error::{ReportError, ReportResult},
    store::SourceStore,
    types::{is_valid_price, EntityId, Price, DEFAULT_PRICE},
};
use std::cell::RefCell;
use std::collections::BTreeMap;

pub type OverrideMap = BTreeMap<EntityId, Price>;

/// The durable slot behind the override store. One namespace, one blob.
pub trait OverrideSlot {
    /// `Ok(None)` when nothing has been written yet.
    fn read(&self) -> ReportResult<Option<String>>;

    fn write(&self, contents: &str) -> ReportResult<()>;
}

/// Slot kept in memory only. Used in tests and as a scratch store.
#[derive(Debug, Default)]
pub struct MemorySlot {
    contents: RefCell<Option<String>>,
}

impl MemorySlot {
    pub fn new() -> Self { Self::default() }

    /// Seed the slot with raw contents, valid or not.
    pub fn with_contents(contents: &str) -> Self {
        Self { contents: RefCell::new(Some(contents.to_string())) }
    }
}

impl OverrideSlot for MemorySlot {
    fn read(&self) -> ReportResult<Option<String>> {
        Ok(self.contents.borrow().clone())
    }

    fn write(&self, contents: &str) -> ReportResult<()> {
        *self.contents.borrow_mut() = Some(contents.to_string());
        Ok(())
    }
}

/// Slot persisted in the `local_slot` table of a SQLite store.
pub struct SqliteSlot {
    store:     SourceStore,
    namespace: String,
}

impl SqliteSlot {
    pub fn new(store: SourceStore, namespace: &str) -> Self {
        Self { store, namespace: namespace.to_string() }
    }
}

impl OverrideSlot for SqliteSlot {
    fn read(&self) -> ReportResult<Option<String>> {
        self.store.read_slot(&self.namespace)
    }

    fn write(&self, contents: &str) -> ReportResult<()> {
        self.store.write_slot(&self.namespace, contents)
    }
}

pub struct OverrideStore {
    slot:          Box<dyn OverrideSlot>,
    default_price: Price,
}

impl OverrideStore {
    pub fn new(slot: Box<dyn OverrideSlot>, default_price: Price) -> Self {
        Self { slot, default_price }
    }

    /// Fresh in-memory store with the standard default price.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemorySlot::new()), DEFAULT_PRICE)
    }

    /// Store backed by the `local_slot` table of `store`.
    pub fn sqlite(store: SourceStore, namespace: &str, default_price: Price) -> Self {
        Self::new(Box::new(SqliteSlot::new(store, namespace)), default_price)
    }

    pub fn default_price(&self) -> Price {
        self.default_price
    }

    /// Read and parse the slot.
    pub fn load_map(&self) -> ReportResult<OverrideMap> {
        match self.slot.read()? {
            Some(raw) => parse_map(&raw),
            None => Ok(OverrideMap::new()),
        }
    }

    /// The stored override for `entity_id`, if any.
    pub fn lookup(&self, entity_id: &str) -> Option<Price> {
        if entity_id.is_empty() {
            return None;
        }
        self.get_all().get(entity_id).copied()
    }

    /// The stored override, or the default price when there is none.
    pub fn get(&self, entity_id: &str) -> Price {
        self.lookup(entity_id).unwrap_or(self.default_price)
    }

    /// Merge `{entity_id: value}` into the slot. Returns whether a
    /// write happened: blank ids and invalid prices are ignored, and
    /// nothing is written when the slot cannot be read.
    pub fn set(&self, entity_id: &str, value: Price) -> bool {
        if entity_id.is_empty() || !is_valid_price(value) {
            log::debug!("overrides: ignoring set({entity_id:?}, {value})");
            return false;
        }
        let raw = match self.slot.read() {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("overrides: slot unreadable, set({entity_id:?}) skipped: {e}");
                return false;
            }
        };
        let mut map = match raw.as_deref().map(parse_map) {
            None => OverrideMap::new(),
            Some(Ok(map)) => map,
            Some(Err(e)) => {
                log::warn!("overrides: replacing corrupt slot contents: {e}");
                OverrideMap::new()
            }
        };
        map.insert(entity_id.to_string(), value);
        self.write_map(&map)
    }

    /// Copy of the whole map; empty on any failure.
    pub fn get_all(&self) -> OverrideMap {
        match self.load_map() {
            Ok(map) => map,
            Err(e) => {
                log::warn!("overrides: unreadable slot treated as empty: {e}");
                OverrideMap::new()
            }
        }
    }

    fn write_map(&self, map: &OverrideMap) -> bool {
        let result = serde_json::to_string(map)
            .map_err(ReportError::from)
            .and_then(|json| self.slot.write(&json));
        match result {
            Ok(()) => true,
            Err(e) => {
                log::warn!("overrides: write failed: {e}");
                false
            }
        }
    }
}

/// Non-object JSON yields an empty map; entries that are not finite
/// non-negative numbers are dropped.
fn parse_map(raw: &str) -> ReportResult<OverrideMap> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    let map = match value {
        serde_json::Value::Object(obj) => obj
            .into_iter()
            .filter_map(|(k, v)| v.as_f64().filter(|p| is_valid_price(*p)).map(|p| (k, p)))
            .collect(),
        other => {
            log::warn!("overrides: slot holds {} instead of an object, ignoring", json_kind(&other));
            OverrideMap::new()
        }
    };
    Ok(map)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null      => "null",
        serde_json::Value::Bool(_)   => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_)  => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
