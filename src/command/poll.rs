use anyhow::Result;
use flume::{Receiver, Selector};

use crate::argsets::PollArgs;
use crate::constants::defaults;
use crate::data_mgmt::{
    build_entities, find_new_devices, spawn_coordinator, CoordinatorHandle, Entity, Update,
};
use crate::helpers::SystemClock;
use crate::interfaces::TuyaClient;
use crate::node_mgmt::config::EntrySet;
use crate::node_mgmt::{validate_additional, validate_entry_with_retry, EntryContext};

use super::entities::render;

struct PolledDevice {
    context: EntryContext,
    handle: CoordinatorHandle<SystemClock>,
    updates: Receiver<Update>,
    entities: Vec<Entity>,
    received: usize,
}

impl PolledDevice {
    fn handle_update(&mut self, update: &Update) {
        self.received += 1;
        match update {
            Update::Status(status) => {
                if self.entities.is_empty() {
                    self.entities = build_entities(&self.context, status);
                    log::info!(
                        "Created {} entities for {}",
                        self.entities.len(),
                        self.context.title
                    );
                }
                for entity in &self.entities {
                    log::info!("{}", render(entity, Some(status)));
                }
            }
            Update::Unavailable(reason) => {
                log::warn!("{} unavailable: {}", self.context.title, reason);
            }
        }
    }
}

fn discover(entries: &EntrySet) -> Result<()> {
    // The coordinators own the polling clients; discovery runs on its own
    // client and token.
    let mut client = TuyaClient::new(entries.primary.credentials.clone())?;
    for device in find_new_devices(&mut client, &entries.device_ids()) {
        log::info!(
            "Discovered unconfigured device {} ({})",
            device.id,
            device.name.as_deref().unwrap_or("unnamed")
        );
    }
    client.close();
    Ok(())
}

pub fn poll(args: PollArgs) -> Result<()> {
    let (entries, mut client) = super::connect()?;
    let (context, _) = validate_entry_with_retry(
        &mut client,
        &entries.primary,
        Some(defaults::SETUP_RETRY_MAX_ELAPSED),
    )?;

    let interval = entries.primary.scan_interval;
    let mut validated = vec![(context, client)];
    validated.extend(validate_additional(&entries.additional));

    let mut devices = Vec::with_capacity(validated.len());
    for (context, client) in validated {
        log::info!("Polling {} every {}s", context.title, interval.as_secs());
        let (handle, updates) = spawn_coordinator(client, interval)?;
        devices.push(PolledDevice {
            context,
            handle,
            updates,
            entities: Vec::new(),
            received: 0,
        });
    }

    let mut discovered = false;
    loop {
        let (index, update) = devices
            .iter()
            .enumerate()
            .fold(Selector::new(), |selector, (index, device)| {
                selector.recv(&device.updates, move |update| (index, update))
            })
            .wait();
        let Ok(update) = update else {
            log::error!("Poll worker for {} stopped", devices[index].context.title);
            break;
        };
        devices[index].handle_update(&update);

        if !discovered {
            discovered = true;
            discover(&entries)?;
        }

        if args
            .count
            .is_some_and(|count| devices.iter().all(|device| device.received >= count))
        {
            break;
        }
    }

    for device in devices {
        device.handle.shutdown()?.close();
    }
    Ok(())
}
