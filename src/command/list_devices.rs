use anyhow::Result;

pub fn list_devices() -> Result<()> {
    let (entries, mut client) = super::connect()?;
    let configured = entries.device_ids();
    let devices = client.list_devices()?;
    log::info!("Found {} devices in project", devices.len());

    for device in devices {
        let marker = if configured.contains(&device.id.as_str()) {
            "*"
        } else {
            " "
        };
        println!(
            "{marker} {}\t{}",
            device.id,
            device.name.as_deref().unwrap_or("")
        );
    }
    client.close();
    Ok(())
}
