//! Entities exposed for a power station, built from a static description
//! table instead of one hand-written type per entity.
//!
//! Each [`EntityDescription`] names where its value comes from (one or more
//! alias data point codes, or a derived value), how it is presented and, for
//! switches and selects, how it is written back.

use std::fmt;

use serde::Serialize;

use crate::node_mgmt::EntryContext;

use super::models::{DpValue, StatusMap};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Sensor,
    BinarySensor,
    Switch,
    Select,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Sensor => "sensor",
            Platform::BinarySensor => "binary_sensor",
            Platform::Switch => "switch",
            Platform::Select => "select",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Source {
    /// The first of these codes present in the status is used.
    DataPoint(&'static [&'static str]),
    /// `total_output_power - total_input_power`; positive while discharging.
    BatteryPower,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Number,
    Text,
    /// Text, with zero/empty reported as "No errors".
    ErrorCode,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntityDescription {
    pub key: &'static str,
    pub name: &'static str,
    pub platform: Platform,
    pub source: Source,
    pub value: ValueKind,
    pub unit: Option<&'static str>,
    pub device_class: Option<&'static str>,
    pub state_class: Option<&'static str>,
    pub icon: Option<&'static str>,
    /// Multiplier from the vendor's raw integer to `unit`.
    pub scale: f64,
    /// Vendor value -> display label.
    pub options: &'static [(&'static str, &'static str)],
    /// Created even when the data point has not been reported yet.
    pub always: bool,
}

impl EntityDescription {
    const fn new(platform: Platform, key: &'static str, name: &'static str, source: Source) -> Self {
        EntityDescription {
            key,
            name,
            platform,
            source,
            value: ValueKind::Number,
            unit: None,
            device_class: None,
            state_class: None,
            icon: None,
            scale: 1.0,
            options: &[],
            always: false,
        }
    }

    const fn sensor(key: &'static str, name: &'static str, codes: &'static [&'static str]) -> Self {
        Self::new(Platform::Sensor, key, name, Source::DataPoint(codes))
    }

    const fn switch(key: &'static str, name: &'static str, codes: &'static [&'static str]) -> Self {
        Self::new(Platform::Switch, key, name, Source::DataPoint(codes))
    }

    const fn select(
        key: &'static str,
        name: &'static str,
        code: &'static [&'static str],
        options: &'static [(&'static str, &'static str)],
    ) -> Self {
        EntityDescription {
            options,
            value: ValueKind::Text,
            ..Self::new(Platform::Select, key, name, Source::DataPoint(code))
        }
    }

    const fn power(key: &'static str, name: &'static str, codes: &'static [&'static str]) -> Self {
        Self::sensor(key, name, codes)
            .unit("W")
            .device_class("power")
            .state_class("measurement")
    }

    const fn unit(self, unit: &'static str) -> Self {
        EntityDescription {
            unit: Some(unit),
            ..self
        }
    }

    const fn device_class(self, device_class: &'static str) -> Self {
        EntityDescription {
            device_class: Some(device_class),
            ..self
        }
    }

    const fn state_class(self, state_class: &'static str) -> Self {
        EntityDescription {
            state_class: Some(state_class),
            ..self
        }
    }

    const fn icon(self, icon: &'static str) -> Self {
        EntityDescription {
            icon: Some(icon),
            ..self
        }
    }

    const fn scale(self, scale: f64) -> Self {
        EntityDescription { scale, ..self }
    }

    const fn text(self, value: ValueKind) -> Self {
        EntityDescription { value, ..self }
    }

    const fn always(self) -> Self {
        EntityDescription {
            always: true,
            ..self
        }
    }
}

pub const LED_MODE_OPTIONS: &[(&str, &str)] = &[
    ("lamp_off", "Off"),
    ("lamp_100", "High Light"),
    ("lamp_flash", "Strobe"),
    ("lamp_50", "Half Bright"),
    ("lamp_30", "Low"),
    ("lamp_sos", "SOS"),
];

pub const OUTPUT_OFF_TIME_OPTIONS: &[(&str, &str)] = &[
    ("2hour", "2 Hours"),
    ("4hour", "4 Hours"),
    ("8hour", "8 Hours"),
    ("12hour", "12 Hours"),
    ("do_not_close", "Never"),
];

pub const STANDBY_TIME_OPTIONS: &[(&str, &str)] = &[
    ("3min", "3 Minutes"),
    ("5min", "5 Minutes"),
    ("15min", "15 Minutes"),
    ("60min", "60 Minutes"),
    ("do_not_close", "Never"),
];

pub const DISPLAY_OFF_TIME_OPTIONS: &[(&str, &str)] = &[
    ("2min", "2 Minutes"),
    ("5min", "5 Minutes"),
    ("10min", "10 Minutes"),
    ("20min", "20 Minutes"),
    ("do_not_close", "Never"),
];

pub static ENTITY_TABLE: &[EntityDescription] = &[
    // Sensors
    EntityDescription::sensor("battery", "Battery Level", &["battery_percentage", "va_battery"])
        .unit("%")
        .device_class("battery")
        .state_class("measurement")
        .always(),
    EntityDescription::power("input_power", "Total In Power", &["total_input_power"])
        .icon("mdi:transmission-tower-import"),
    EntityDescription::power("output_power", "Total Out Power", &["total_output_power"])
        .icon("mdi:transmission-tower-export"),
    EntityDescription::power("power", "Output Power", &["cur_power", "power"])
        .icon("mdi:flash"),
    EntityDescription::power("ac_power", "AC Out Power", &["ac_output_power"])
        .icon("mdi:power-plug-outline"),
    EntityDescription::power("dc_power", "DC Out Power", &["dc_output_power"])
        .icon("mdi:power-plug-outline"),
    EntityDescription::power("usb1_power", "USB1 Out Power", &["usb1_output_power"])
        .icon("mdi:usb-port"),
    EntityDescription::power("usb2_power", "USB2 Out Power", &["usb2_output_power"])
        .icon("mdi:usb-port"),
    EntityDescription::power("usb3_power", "USB3 Out Power", &["usb3_output_power"])
        .icon("mdi:usb-port"),
    EntityDescription::power("usb4_power", "USB4 Out Power", &["usb4_output_power"])
        .icon("mdi:usb-port"),
    EntityDescription::power("usbc1_power", "USB-C1 Out Power", &["usb_c1_output_power"])
        .icon("mdi:usb-port"),
    EntityDescription::power("usbc2_power", "USB-C2 Out Power", &["usb_c2_output_power"])
        .icon("mdi:usb-port"),
    EntityDescription::new(
        Platform::Sensor,
        "battery_power",
        "Battery Power",
        Source::BatteryPower,
    )
    .unit("W")
    .device_class("power")
    .state_class("measurement")
    .icon("mdi:battery-arrow-down-outline"),
    EntityDescription::sensor("charge_energy", "Battery Charge Energy", &["charge_energy"])
        .unit("kWh")
        .device_class("energy")
        .state_class("total_increasing")
        .scale(0.001)
        .icon("mdi:battery-charging"),
    EntityDescription::sensor(
        "discharge_energy",
        "Battery Discharge Energy",
        &["discharge_energy"],
    )
    .unit("kWh")
    .device_class("energy")
    .state_class("total_increasing")
    .scale(0.001)
    .icon("mdi:battery-minus"),
    EntityDescription::sensor("voltage", "Voltage", &["cur_voltage", "voltage"])
        .unit("V")
        .device_class("voltage")
        .state_class("measurement")
        .scale(0.1),
    EntityDescription::sensor("current", "Current", &["cur_current", "current"])
        .unit("A")
        .device_class("current")
        .state_class("measurement")
        .scale(0.001),
    EntityDescription::sensor("temperature", "Battery Temperature", &["temp_current"])
        .unit("°C")
        .device_class("temperature")
        .state_class("measurement"),
    EntityDescription::sensor("ac_voltage_freq", "AC Voltage/Frequency", &["ac_voltage_freq"])
        .text(ValueKind::Text)
        .icon("mdi:sine-wave"),
    EntityDescription::sensor("error_code", "Error Code", &["error_code"])
        .text(ValueKind::ErrorCode)
        .icon("mdi:alert-circle-outline"),
    EntityDescription::sensor("input_type", "Input Type", &["input_type"])
        .text(ValueKind::Text)
        .icon("mdi:power-plug"),
    // Binary sensors
    EntityDescription::new(
        Platform::BinarySensor,
        "usb_status",
        "USB Output Status",
        Source::DataPoint(&["switch_usb"]),
    )
    .device_class("power")
    .icon("mdi:usb-port"),
    // Switches
    EntityDescription::switch("main_output", "Output Enabled", &["switch", "switch_1", "main_switch"])
        .icon("mdi:power"),
    EntityDescription::switch("ac_output", "AC Enabled", &["switch_ac", "ac_switch", "switch_2"])
        .icon("mdi:power-socket-eu"),
    EntityDescription::switch("dc_output", "DC (12V) Enabled", &["switch_dc", "dc_switch", "switch_3"])
        .icon("mdi:power-plug-outline"),
    EntityDescription::switch("usb_output", "USB Enabled", &["switch_usb"]).icon("mdi:usb-port"),
    EntityDescription::switch("buzzer", "Beeper", &["switch_buzzer"]).icon("mdi:volume-high"),
    // Selects
    EntityDescription::select("led_mode_select", "LED Mode", &["led_mode"], LED_MODE_OPTIONS)
        .icon("mdi:lightbulb-outline"),
    EntityDescription::select(
        "ac_off_time",
        "AC Auto-Off Time",
        &["ac_off_time_set"],
        OUTPUT_OFF_TIME_OPTIONS,
    )
    .icon("mdi:timer-off-outline"),
    EntityDescription::select(
        "dc_off_time",
        "DC Auto-Off Time",
        &["dc_off_time_set"],
        OUTPUT_OFF_TIME_OPTIONS,
    )
    .icon("mdi:timer-off-outline"),
    EntityDescription::select(
        "led_off_time",
        "LED Auto-Off Time",
        &["led_off_time_set"],
        OUTPUT_OFF_TIME_OPTIONS,
    )
    .icon("mdi:timer-off-outline"),
    EntityDescription::select(
        "standby_time",
        "Standby Time",
        &["device_standby_time_set"],
        STANDBY_TIME_OPTIONS,
    )
    .icon("mdi:timer-outline"),
    EntityDescription::select(
        "display_off_time",
        "Display Auto-Off Time",
        &["display_off_time_set"],
        DISPLAY_OFF_TIME_OPTIONS,
    )
    .icon("mdi:monitor-off"),
];

const INPUT_POWER: &str = "total_input_power";
const OUTPUT_POWER: &str = "total_output_power";

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EntityState {
    Unavailable,
    Unknown,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl fmt::Display for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityState::Unavailable => write!(f, "unavailable"),
            EntityState::Unknown => write!(f, "unknown"),
            EntityState::Bool(true) => write!(f, "on"),
            EntityState::Bool(false) => write!(f, "off"),
            EntityState::Number(n) => write!(f, "{n}"),
            EntityState::Text(s) => write!(f, "{s}"),
        }
    }
}

/// One entity of one configured device.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    pub unique_id: String,
    pub entity_id: String,
    pub name: String,
    pub description: &'static EntityDescription,
    /// Data point read and written; `None` for derived values.
    pub code: Option<&'static str>,
}

pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    slug.trim_end_matches('_').to_string()
}

fn round(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn resolve_code(description: &EntityDescription, status: &StatusMap) -> Option<Option<&'static str>> {
    match description.source {
        Source::DataPoint(codes) => codes
            .iter()
            .find(|code| status.contains_key(**code))
            .or_else(|| codes.first().filter(|_| description.always))
            .map(|code| Some(*code)),
        Source::BatteryPower => (status.contains_key(INPUT_POWER)
            || status.contains_key(OUTPUT_POWER)
            || description.always)
            .then_some(None),
    }
}

/// Create every entity whose data is present in `status`.
pub fn build_entities(context: &EntryContext, status: &StatusMap) -> Vec<Entity> {
    let entities: Vec<Entity> = ENTITY_TABLE
        .iter()
        .filter_map(|description| {
            resolve_code(description, status).map(|code| Entity::new(context, description, code))
        })
        .collect();

    if !entities
        .iter()
        .any(|e| e.description.platform == Platform::Switch)
    {
        log::warn!("No switches found in device data");
    }
    entities
}

impl Entity {
    pub fn new(
        context: &EntryContext,
        description: &'static EntityDescription,
        code: Option<&'static str>,
    ) -> Self {
        Entity {
            unique_id: format!("{}_{}", context.entry_id, description.key),
            entity_id: format!(
                "{}.{}_{}",
                description.platform.as_str(),
                slugify(&context.title),
                slugify(description.name)
            ),
            name: format!("{} {}", context.title, description.name),
            description,
            code,
        }
    }

    fn raw<'a>(&self, status: &'a StatusMap) -> Option<&'a DpValue> {
        self.code.and_then(|code| status.get(code))
    }

    /// Render the entity's state. `None` means the last poll failed.
    pub fn state(&self, status: Option<&StatusMap>) -> EntityState {
        let Some(status) = status else {
            return EntityState::Unavailable;
        };
        let description = self.description;

        match description.platform {
            Platform::Switch | Platform::BinarySensor => {
                EntityState::Bool(self.raw(status).and_then(DpValue::as_bool).unwrap_or(false))
            }
            Platform::Select => match self.raw(status) {
                Some(value) => description
                    .options
                    .iter()
                    .find(|(vendor, _)| value.as_str() == Some(*vendor))
                    .map(|(_, label)| EntityState::Text(label.to_string()))
                    .unwrap_or(EntityState::Unknown),
                None => EntityState::Unknown,
            },
            Platform::Sensor => match (description.source, description.value) {
                (Source::BatteryPower, _) => {
                    let get = |code: &str| status.get(code).and_then(DpValue::as_f64).unwrap_or(0.0);
                    EntityState::Number(round((get(OUTPUT_POWER) - get(INPUT_POWER)) * description.scale))
                }
                (_, ValueKind::Number) => match self.raw(status).and_then(DpValue::as_f64) {
                    Some(value) => EntityState::Number(round(value * description.scale)),
                    None => EntityState::Unknown,
                },
                (_, ValueKind::Text) => match self.raw(status) {
                    Some(value) => EntityState::Text(value.to_string()),
                    None => EntityState::Unknown,
                },
                (_, ValueKind::ErrorCode) => match self.raw(status) {
                    Some(value) if !value.is_falsy() => EntityState::Text(value.to_string()),
                    _ => EntityState::Text("No errors".to_string()),
                },
            },
        }
    }

    /// Labels a select can be set to.
    pub fn options(&self) -> Vec<&'static str> {
        self.description.options.iter().map(|(_, label)| *label).collect()
    }

    /// Command that turns this switch on or off.
    pub fn command(&self, on: bool) -> Option<(&'static str, DpValue)> {
        match (self.description.platform, self.code) {
            (Platform::Switch, Some(code)) => Some((code, DpValue::Bool(on))),
            _ => None,
        }
    }

    /// Command that sets this select to the option with `label`.
    pub fn command_for_option(&self, label: &str) -> Option<(&'static str, DpValue)> {
        if self.description.platform != Platform::Select {
            return None;
        }
        let code = self.code?;
        match self
            .description
            .options
            .iter()
            .find(|(_, option)| *option == label)
        {
            Some((vendor, _)) => Some((code, DpValue::from(*vendor))),
            None => {
                log::error!("Could not find vendor value for option: {}", label);
                None
            }
        }
    }
}
