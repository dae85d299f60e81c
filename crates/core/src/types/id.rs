//! Newtype IDs for type-safe entity references.
//!
//! Ids in Corner Shop are opaque strings assigned by the remote data gateway
//! (document ids, account uids). Use the `define_id!` macro to create wrappers
//! that prevent accidentally mixing ids from different entity types.

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]` (usable as a JSON map key)
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `AsRef<str>` implementations
///
/// # Example
///
/// ```rust
/// # use corner_shop_core::define_id;
/// define_id!(OrderId);
/// define_id!(ShipmentId);
///
/// let order_id = OrderId::new("a1");
/// let shipment_id = ShipmentId::new("a1");
///
/// // These are different types, so this won't compile:
/// // let _: OrderId = shipment_id;
/// assert_eq!(order_id.as_str(), shipment_id.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the underlying string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Product documents live under `users/{uid}/products/{id}`.
define_id!(ProductId);
// Account uid issued by the auth provider.
define_id!(UserId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn test_display_is_raw_string() {
        let id = ProductId::new("8xKq2");
        assert_eq!(id.to_string(), "8xKq2");
        assert_eq!(id.as_str(), "8xKq2");
    }

    #[test]
    fn test_serde_transparent() {
        let id = UserId::new("uid-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"uid-1\"");

        let parsed: UserId = serde_json::from_str("\"uid-1\"").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_usable_as_json_map_key() {
        let mut map = BTreeMap::new();
        map.insert(ProductId::new("p1"), 2_u32);

        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"p1":2}"#);

        let parsed: BTreeMap<ProductId, u32> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.get(&ProductId::new("p1")), Some(&2));
    }
}
