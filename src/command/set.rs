use anyhow::{anyhow, Result};
use flume::Receiver;

use crate::argsets::SetArgs;
use crate::data_mgmt::entities::Platform;
use crate::data_mgmt::{
    build_entities, spawn_coordinator, CoordinatorHandle, DpValue, Entity, StatusMap, Update,
};
use crate::helpers::Clock;
use crate::node_mgmt::{validate_entry, EntryContext};

use super::entities::render;

/// Switch or select an entity by its table key, then print its new state.
pub fn set(args: SetArgs) -> Result<()> {
    let (entries, mut client) = super::connect()?;
    let (context, _) = validate_entry(&mut client, &entries.primary)?;

    let (handle, updates) = spawn_coordinator(client, entries.primary.scan_interval)?;
    let result = apply(&context, &handle, &updates, &args);
    handle.shutdown()?.close();
    result
}

fn current_status<C: Clock + Send + 'static>(
    handle: &CoordinatorHandle<C>,
    updates: &Receiver<Update>,
) -> Result<StatusMap> {
    match updates.recv()? {
        Update::Status(status) => Ok(status),
        Update::Unavailable(reason) => {
            log::warn!("Device unavailable ({}); refreshing once", reason);
            handle.refresh();
            match updates.recv()? {
                Update::Status(status) => Ok(status),
                Update::Unavailable(reason) => Err(anyhow!("Device unavailable: {}", reason)),
            }
        }
    }
}

fn apply<C: Clock + Send + 'static>(
    context: &EntryContext,
    handle: &CoordinatorHandle<C>,
    updates: &Receiver<Update>,
    args: &SetArgs,
) -> Result<()> {
    let status = current_status(handle, updates)?;
    let entities = build_entities(context, &status);
    let entity = entities
        .iter()
        .find(|entity| entity.description.key == args.key)
        .ok_or_else(|| {
            let settable: Vec<&str> = entities
                .iter()
                .filter(|entity| {
                    matches!(
                        entity.description.platform,
                        Platform::Switch | Platform::Select
                    )
                })
                .map(|entity| entity.description.key)
                .collect();
            anyhow!(
                "No entity '{}' on this device; settable entities: {}",
                args.key,
                settable.join(", ")
            )
        })?;

    let (code, value) = resolve(entity, &args.value)?;
    log::info!("Setting {} to {} ({} = {})", entity.name, args.value, code, value);
    if !handle.send_command(code, value) {
        return Err(anyhow!("Command '{}' was not accepted", code));
    }

    match updates.recv()? {
        Update::Status(status) => println!("{}", render(entity, Some(&status))),
        Update::Unavailable(reason) => {
            log::warn!("Could not read back state: {}", reason);
            println!("{}", render(entity, None));
        }
    }
    Ok(())
}

fn resolve(entity: &Entity, value: &str) -> Result<(&'static str, DpValue)> {
    let command = match entity.description.platform {
        Platform::Switch => match value.trim().to_lowercase().as_str() {
            "on" | "true" | "1" => entity.command(true),
            "off" | "false" | "0" => entity.command(false),
            _ => {
                return Err(anyhow!(
                    "Switch value must be 'on' or 'off', got '{}'",
                    value
                ))
            }
        },
        Platform::Select => entity.command_for_option(value),
        Platform::Sensor | Platform::BinarySensor => {
            return Err(anyhow!("Entity '{}' is read-only", entity.description.key))
        }
    };
    command.ok_or_else(|| {
        anyhow!(
            "'{}' is not an option of {}; expected one of: {}",
            value,
            entity.name,
            entity.options().join(", ")
        )
    })
}
