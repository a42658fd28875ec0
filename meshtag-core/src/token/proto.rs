//! Protobuf messages carried inside a contact token.
//!
//! Field numbers match the Meshtastic `SharedContact` and `User` messages and must
//! never change.

/// `SharedContact`. The user is kept as raw bytes so tokens produced by other
/// clients survive a decode/encode cycle untouched.
#[derive(Clone, PartialEq, Eq, prost::Message)]
pub(crate) struct SharedContact {
    #[prost(uint32, tag = "1")]
    pub node_num: u32,
    #[prost(bytes = "vec", tag = "2")]
    pub user: Vec<u8>,
    #[prost(bool, tag = "4")]
    pub manually_verified: bool,
}

/// `User`. The deprecated `macaddr` (4) is not carried.
#[derive(Clone, PartialEq, Eq, prost::Message)]
pub(crate) struct User {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub long_name: String,
    #[prost(string, tag = "3")]
    pub short_name: String,
    #[prost(int32, tag = "5")]
    pub hw_model: i32,
    #[prost(bool, tag = "6")]
    pub is_licensed: bool,
    #[prost(int32, tag = "7")]
    pub role: i32,
    #[prost(bytes = "vec", tag = "8")]
    pub public_key: Vec<u8>,
    #[prost(bool, optional, tag = "9")]
    pub is_unmessagable: Option<bool>,
}
