mod argsets;
mod command;
mod constants;
mod data_mgmt;
mod helpers;
mod interfaces;
mod node_mgmt;

use anyhow::{anyhow, Result};
use env_logger::Env;

use constants::{defaults, envvars};

const CMD_CHECK: &str = "check";
const CMD_STATUS: &str = "status";
const CMD_INFO: &str = "info";
const CMD_SEND_COMMAND: &str = "send-command";
const CMD_LIST_DEVICES: &str = "list-devices";
const CMD_ENTITIES: &str = "entities";
const CMD_SET: &str = "set";
const CMD_POLL: &str = "poll";

fn main() -> Result<()> {
    helpers::load_dotenv();
    env_logger::Builder::from_env(Env::default().filter_or(envvars::LOG_LEVEL, defaults::LOG_LEVEL))
        .init();

    let mut args = pico_args::Arguments::from_env();
    match args.subcommand()?.as_deref() {
        Some(CMD_CHECK) => command::check(),
        Some(CMD_STATUS) => command::status(),
        Some(CMD_INFO) => command::info(),
        Some(CMD_SEND_COMMAND) => command::send_command(argsets::SendCommandArgs {
            code: args.free_from_str()?,
            value: args.free_from_str()?,
        }),
        Some(CMD_LIST_DEVICES) => command::list_devices(),
        Some(CMD_ENTITIES) => command::entities(),
        Some(CMD_SET) => command::set(argsets::SetArgs {
            key: args.free_from_str()?,
            value: args.free_from_str()?,
        }),
        Some(CMD_POLL) => command::poll(argsets::PollArgs {
            count: args.opt_value_from_str("--count")?,
        }),
        _ => Err(anyhow!(
            "Subcommand must be one of 'check', 'status', 'info', 'send-command', 'list-devices', 'entities', 'set', 'poll'"
        )),
    }
}
