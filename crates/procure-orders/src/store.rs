use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::OrderError;
use procure_types::{PurchaseOrder, STATUS_ARCHIVED, STATUS_OPEN};

fn map_row_to_order(row: &Row<'_>) -> rusqlite::Result<PurchaseOrder> {
    Ok(PurchaseOrder {
        id: row.get(0)?,
        po: row.get(1)?,
        amount: row.get(2)?,
        vendor: row.get(3)?,
        status: Some(row.get(4)?),
    })
}

/// Returns every order, most recently created first.
pub fn list_orders(conn: &Connection) -> Result<Vec<PurchaseOrder>, OrderError> {
    let mut stmt = conn.prepare(
        "SELECT id, po, amount, vendor, status FROM purchase_orders ORDER BY id DESC",
    )?;
    let rows = stmt.query_map([], map_row_to_order)?;
    let mut orders = Vec::new();
    for row in rows {
        orders.push(row?);
    }
    Ok(orders)
}

/// Inserts an order and returns it with its identity and resolved status.
///
/// # Errors
///
/// Fails with a constraint violation when `po` is already taken.
pub fn create_order(conn: &Connection, order: &PurchaseOrder) -> Result<PurchaseOrder, OrderError> {
    let (id, status): (i64, String) = conn.query_row(
        "INSERT INTO purchase_orders (po, amount, vendor, status)
         VALUES (?1, ?2, ?3, COALESCE(?4, ?5))
         RETURNING id, status",
        params![order.po, order.amount, order.vendor, order.status, STATUS_OPEN],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    tracing::info!(order_id = id, po = order.po, %status, "purchase order created");

    Ok(PurchaseOrder {
        id,
        status: Some(status),
        ..order.clone()
    })
}

/// Overwrites `po`, `amount` and `vendor` of order `id`, and its status only
/// when `order.status` is set.
///
/// The returned order carries the status now stored. When no row matched it
/// carries the payload's status instead.
pub fn revise_order(
    conn: &Connection,
    id: i64,
    order: &PurchaseOrder,
) -> Result<PurchaseOrder, OrderError> {
    let stored_status: Option<String> = conn
        .query_row(
            "UPDATE purchase_orders
             SET po = ?1, amount = ?2, vendor = ?3, status = COALESCE(?4, status)
             WHERE id = ?5
             RETURNING status",
            params![order.po, order.amount, order.vendor, order.status, id],
            |row| row.get(0),
        )
        .optional()?;

    tracing::info!(
        order_id = id,
        matched = stored_status.is_some(),
        "purchase order revised"
    );

    Ok(PurchaseOrder {
        id,
        status: stored_status.or_else(|| order.status.clone()),
        ..order.clone()
    })
}

/// Sets the status of order `id` to [`STATUS_ARCHIVED`].
///
/// Returns the number of rows matched; archiving an archived order matches
/// it again and changes nothing.
pub fn archive_order(conn: &Connection, id: i64) -> Result<usize, OrderError> {
    let matched = conn.execute(
        "UPDATE purchase_orders SET status = ?1 WHERE id = ?2",
        params![STATUS_ARCHIVED, id],
    )?;
    tracing::info!(order_id = id, matched, "purchase order archived");
    Ok(matched)
}

/// Deletes order `id`, returning the number of rows removed (0 or 1).
pub fn delete_order(conn: &Connection, id: i64) -> Result<usize, OrderError> {
    let removed = conn.execute("DELETE FROM purchase_orders WHERE id = ?1", [id])?;
    tracing::info!(order_id = id, removed, "purchase order deleted");
    Ok(removed)
}
