use anyhow::{anyhow, Result};

use crate::node_mgmt::{validate_additional, validate_entry};

pub fn check() -> Result<()> {
    let (entries, mut client) = super::connect()?;

    let (connected, message) = client.test_connection();
    if !connected {
        return Err(anyhow!(message));
    }

    let (context, info) = validate_entry(&mut client, &entries.primary)?;
    log::info!(
        "Connected to device {} ({})",
        context.device_id,
        info.product_name.as_deref().unwrap_or("unknown product")
    );
    println!("{}", context.title);
    client.close();

    for (context, client) in validate_additional(&entries.additional) {
        println!("{}", context.title);
        client.close();
    }
    Ok(())
}
