use anyhow::{anyhow, Result};
use serde_json::Value;

use crate::argsets::SendCommandArgs;
use crate::data_mgmt::DpValue;

pub fn status() -> Result<()> {
    let (_, mut client) = super::connect()?;
    let status = client.get_device_status();
    println!("{}", serde_json::to_string(&status)?);
    client.close();
    Ok(())
}

pub fn info() -> Result<()> {
    let (_, mut client) = super::connect()?;
    let info = client.get_device_info()?;
    println!("{}", serde_json::to_string(&info)?);
    client.close();
    Ok(())
}

pub fn send_command(args: SendCommandArgs) -> Result<()> {
    let (_, mut client) = super::connect()?;
    // Valid JSON is sent as-is; anything else is sent as a string
    let value = match serde_json::from_str::<Value>(&args.value) {
        Ok(value) => DpValue::from(value),
        Err(_) => DpValue::String(args.value),
    };

    let success = client.send_command(&args.code, value);
    println!("{success}");
    client.close();
    if !success {
        return Err(anyhow!("Command '{}' was not accepted", args.code));
    }
    Ok(())
}
