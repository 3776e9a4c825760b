#![allow(dead_code)]

pub const DEVICE_ID: &str = "bf3a9c0e5d7f21a4b6xyz";
pub const OTHER_DEVICE_ID: &str = "bf77aa01cc02dd03ee";

pub const TOKEN_RESPONSE: &str = r#"
{
    "success": true,
    "t": 1700000000000,
    "result": {
        "access_token": "3f4e1c0b9a8d7e6f5a4b3c2d1e0f9a8b",
        "expire_time": 7200,
        "refresh_token": "0a1b2c3d4e5f6a7b8c9d0e1f2a3b4c5d",
        "uid": "ay1700000000000abcde"
    }
}
"#;

pub const STATUS_RESPONSE: &str = r#"
{
    "success": true,
    "t": 1700000000100,
    "result": [
        {"code": "battery_percentage", "value": 76},
        {"code": "total_input_power", "value": 0},
        {"code": "total_output_power", "value": 45},
        {"code": "switch_ac", "value": true},
        {"code": "switch_usb", "value": false},
        {"code": "error_code", "value": 0},
        {"code": "led_mode", "value": "lamp_50"}
    ]
}
"#;

pub const DEVICE_INFO_RESPONSE: &str = r#"
{
    "success": true,
    "t": 1700000000200,
    "result": {
        "id": "bf3a9c0e5d7f21a4b6xyz",
        "name": "Shed Power Station",
        "product_name": "Portable Power Station 1000",
        "category": "dcy",
        "online": true
    }
}
"#;

pub const DEVICE_LIST_RESPONSE: &str = r#"
{
    "success": true,
    "t": 1700000000300,
    "result": [
        {"id": "bf3a9c0e5d7f21a4b6xyz", "name": "Shed Power Station"},
        {"id": "bf77aa01cc02dd03ee", "name": "Camper Battery"}
    ]
}
"#;

pub const PERMISSION_DENIED_RESPONSE: &str = r#"
{"success": false, "code": 1106, "msg": "permission deny", "t": 1700000000400}
"#;

pub const COMMAND_OK_RESPONSE: &str = r#"{"success": true, "result": true}"#;

pub const COMMAND_REJECTED_RESPONSE: &str = r#"
{"success": false, "code": 2008, "msg": "command or value not support"}
"#;

pub const OTHER_DEVICE_INFO_RESPONSE: &str = r#"
{
    "success": true,
    "result": {"id": "bf77aa01cc02dd03ee", "name": "Camper Battery", "online": true}
}
"#;

pub const OFFLINE_RESPONSE: &str = r#"
{"success": false, "code": 2001, "msg": "device is offline"}
"#;
