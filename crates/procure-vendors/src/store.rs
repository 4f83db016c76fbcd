use rusqlite::{params, Connection, Row};

use crate::error::VendorError;
use procure_types::Vendor;

fn map_row_to_vendor(row: &Row<'_>) -> rusqlite::Result<Vendor> {
    Ok(Vendor {
        id: row.get(0)?,
        name: row.get(1)?,
        address: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        phone: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        email: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
    })
}

/// Returns every vendor in identity order.
pub fn list_vendors(conn: &Connection) -> Result<Vec<Vendor>, VendorError> {
    let mut stmt = conn.prepare("SELECT id, name, address, phone, email FROM vendors ORDER BY id")?;
    let rows = stmt.query_map([], map_row_to_vendor)?;
    let mut vendors = Vec::new();
    for row in rows {
        vendors.push(row?);
    }
    Ok(vendors)
}

/// Inserts a vendor and returns it with its new identity.
///
/// The `id` carried by `vendor` is ignored.
pub fn create_vendor(conn: &Connection, vendor: &Vendor) -> Result<Vendor, VendorError> {
    let id: i64 = conn.query_row(
        "INSERT INTO vendors (name, address, phone, email) VALUES (?1, ?2, ?3, ?4) RETURNING id",
        params![vendor.name, vendor.address, vendor.phone, vendor.email],
        |row| row.get(0),
    )?;

    tracing::info!(vendor_id = id, "vendor created");

    Ok(Vendor {
        id,
        ..vendor.clone()
    })
}

/// Overwrites all fields of vendor `id` with those of `vendor`.
///
/// Returns `vendor` paired with `id` whether or not a row matched.
pub fn update_vendor(conn: &Connection, id: i64, vendor: &Vendor) -> Result<Vendor, VendorError> {
    let changed = conn.execute(
        "UPDATE vendors SET name = ?1, address = ?2, phone = ?3, email = ?4 WHERE id = ?5",
        params![vendor.name, vendor.address, vendor.phone, vendor.email, id],
    )?;

    tracing::info!(vendor_id = id, changed, "vendor updated");

    Ok(Vendor {
        id,
        ..vendor.clone()
    })
}

/// Deletes vendor `id`, returning the number of rows removed (0 or 1).
pub fn delete_vendor(conn: &Connection, id: i64) -> Result<usize, VendorError> {
    let removed = conn.execute("DELETE FROM vendors WHERE id = ?1", [id])?;
    tracing::info!(vendor_id = id, removed, "vendor deleted");
    Ok(removed)
}
