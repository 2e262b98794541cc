//! Per-sandbox storage regions.
//!
//! Every sandbox owns one redb table named `sandboxes/<id>`. The table holds
//! a single payload slot under the key `data`. Creating or dropping the table
//! is what creates or destroys the sandbox; no other table is touched, so
//! writers of different sandboxes never share rows.

use crate::error::{MetadataError, Result};
use redb::{
    ReadTransaction, ReadableTable, Table, TableDefinition, TableError, TableHandle,
    WriteTransaction,
};

/// Namespace prefix shared by all sandbox regions.
pub(crate) const SANDBOX_KEY_PREFIX: &str = "sandboxes/";

/// Payload slot inside a sandbox region.
pub(crate) const SANDBOX_DATA_KEY: &[u8] = b"data";

type RegionDefinition<'a> = TableDefinition<'a, &'static [u8], &'static [u8]>;

/// A sandbox region opened for writing.
pub(crate) type Region<'txn> = Table<'txn, &'static [u8], &'static [u8]>;

/// Region (table) name for a sandbox ID.
pub(crate) fn sandbox_key(sandbox_id: &str) -> String {
    format!("{}{}", SANDBOX_KEY_PREFIX, sandbox_id)
}

fn region(name: &str) -> RegionDefinition<'_> {
    TableDefinition::new(name)
}

/// Read the raw payload of a sandbox.
///
/// Fails with [`MetadataError::NotFound`] when the region does not exist and
/// returns `Ok(None)` when the region exists but its payload slot is empty.
pub(crate) fn read_payload(txn: &ReadTransaction, sandbox_id: &str) -> Result<Option<Vec<u8>>> {
    let name = sandbox_key(sandbox_id);
    let table = match txn.open_table(region(&name)) {
        Ok(table) => table,
        Err(TableError::TableDoesNotExist(_)) => {
            return Err(MetadataError::NotFound(sandbox_id.to_string()))
        }
        Err(e) => return Err(e.into()),
    };

    let payload = table.get(SANDBOX_DATA_KEY)?.map(|v| v.value().to_vec());
    Ok(payload)
}

/// Open the region of a sandbox, creating it if missing.
pub(crate) fn ensure_region<'txn>(
    txn: &'txn WriteTransaction,
    sandbox_id: &str,
) -> Result<Region<'txn>> {
    let name = sandbox_key(sandbox_id);
    Ok(txn.open_table(region(&name))?)
}

/// Current payload of an open region.
pub(crate) fn get_payload(table: &Region<'_>) -> Result<Option<Vec<u8>>> {
    Ok(table.get(SANDBOX_DATA_KEY)?.map(|v| v.value().to_vec()))
}

/// Overwrite the payload slot of an open region.
pub(crate) fn put_payload(table: &mut Region<'_>, data: &[u8]) -> Result<()> {
    table.insert(SANDBOX_DATA_KEY, data)?;
    Ok(())
}

/// Drop the whole region of a sandbox. Returns whether it existed.
///
/// The region must not be open in `txn`.
pub(crate) fn delete_region(txn: &WriteTransaction, sandbox_id: &str) -> Result<bool> {
    let name = sandbox_key(sandbox_id);
    Ok(txn.delete_table(region(&name))?)
}

/// IDs of every sandbox region visible to `txn`, in key order.
pub(crate) fn list_region_ids(txn: &ReadTransaction) -> Result<Vec<String>> {
    let mut ids: Vec<String> = txn
        .list_tables()?
        .filter_map(|handle| {
            handle
                .name()
                .strip_prefix(SANDBOX_KEY_PREFIX)
                .map(str::to_string)
        })
        .collect();
    // key order == byte order of the IDs
    ids.sort_unstable();
    Ok(ids)
}
