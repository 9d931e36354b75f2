//! Presence advertisement for the receiver

pub mod advertiser;


pub use advertiser::{
    Advertiser, AdvertiserError, MdnsAdvertiser, RAOP_SERVICE_TYPE, format_device_id, get_device_mac,
    raop_properties, service_name,
};
