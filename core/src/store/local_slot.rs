//! Store methods for device-local durable slots.

use super::SourceStore;
use crate::error::ReportResult;
use rusqlite::{params, OptionalExtension};

impl SourceStore {
    /// Raw contents of a slot. `None` if never written.
    pub fn read_slot(&self, namespace: &str) -> ReportResult<Option<String>> {
        let contents = self
            .conn
            .query_row(
                "SELECT contents FROM local_slot WHERE namespace = ?1",
                params![namespace],
                |row| row.get(0),
            )
            .optional()?;
        Ok(contents)
    }

    /// Replace the whole slot. Last write wins.
    pub fn write_slot(&self, namespace: &str, contents: &str) -> ReportResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO local_slot (namespace, contents) VALUES (?1, ?2)",
            params![namespace, contents],
        )?;
        Ok(())
    }
}
