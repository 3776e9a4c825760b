pub mod tuya;
