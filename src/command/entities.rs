use anyhow::Result;

use crate::data_mgmt::{build_entities, Entity, EntityState, StatusMap};
use crate::node_mgmt::validate_entry;

pub(super) fn render(entity: &Entity, status: Option<&StatusMap>) -> String {
    let state = entity.state(status);
    match (&state, entity.description.unit) {
        (EntityState::Number(_), Some(unit)) => {
            format!("{} = {} {}", entity.entity_id, state, unit)
        }
        _ => format!("{} = {}", entity.entity_id, state),
    }
}

pub fn entities() -> Result<()> {
    let (entries, mut client) = super::connect()?;
    let (context, _) = validate_entry(&mut client, &entries.primary)?;

    let status = client.get_device_status();
    let status = (!status.is_empty()).then_some(status);
    let entities = build_entities(&context, status.as_ref().unwrap_or(&StatusMap::new()));
    log::debug!("Built {} entities", entities.len());

    for entity in &entities {
        println!("{}", render(entity, status.as_ref()));
    }
    client.close();
    Ok(())
}
