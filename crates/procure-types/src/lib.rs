//! Shared resource types for the procurement API.
//!
//! Both resources travel over the wire as flat JSON objects. Decoding is
//! lenient in the same way for every field: a missing key or an explicit
//! `null` becomes the field's zero value. The one exception is
//! [`PurchaseOrder::status`], which keeps "absent" distinguishable from an
//! explicit label so that revisions can preserve the stored status.

mod order;
mod vendor;

pub use order::{PurchaseOrder, STATUS_ARCHIVED, STATUS_OPEN};
pub use vendor::Vendor;

use serde::{Deserialize, Deserializer};

/// Deserializes a field, mapping JSON `null` to `T::default()`.
///
/// Pair with `#[serde(default)]` so that missing keys get the same treatment.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
