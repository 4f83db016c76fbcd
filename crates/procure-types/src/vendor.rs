use serde::{Deserialize, Serialize};

use crate::null_as_default;

/// A supplier record.
///
/// `id` is assigned by the store on creation; any value supplied by a client
/// in a create or update payload is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vendor {
    /// Store-generated identity.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,
    /// Display name. Required by the store, but an empty string is accepted.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub address: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub phone: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_and_null_fields_become_empty() {
        let vendor: Vendor =
            serde_json::from_str(r#"{"name":"Acme","phone":null}"#).expect("should decode");
        assert_eq!(vendor.id, 0);
        assert_eq!(vendor.name, "Acme");
        assert_eq!(vendor.address, "");
        assert_eq!(vendor.phone, "");
        assert_eq!(vendor.email, "");
    }

    #[test]
    fn wrong_field_type_is_rejected() {
        let result = serde_json::from_str::<Vendor>(r#"{"name":42}"#);
        assert!(result.is_err(), "numeric name should not decode");
    }
}
