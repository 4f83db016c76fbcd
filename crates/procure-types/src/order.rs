use serde::{Deserialize, Serialize};

use crate::null_as_default;

/// Status assigned to new orders when the client does not supply one.
pub const STATUS_OPEN: &str = "Open";

/// Status forced by the archive operation.
pub const STATUS_ARCHIVED: &str = "Archived";

/// A purchase order.
///
/// `vendor` is free text naming the supplier; it is not a reference to a
/// [`Vendor`](crate::Vendor) row. `status` is an open-ended label. Only
/// [`STATUS_OPEN`] (the default) and [`STATUS_ARCHIVED`] carry meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    /// Store-generated identity.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,
    /// Business order number, unique across all orders.
    #[serde(default, deserialize_with = "null_as_default")]
    pub po: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub amount: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vendor: String,
    /// `None` when the payload omitted the field or sent `null`.
    #[serde(default)]
    pub status: Option<String>,
}
