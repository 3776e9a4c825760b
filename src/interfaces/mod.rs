pub mod tuya_api;

pub use tuya_api::TuyaClient;
