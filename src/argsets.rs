pub struct SendCommandArgs {
    pub code: String,
    pub value: String,
}

pub struct PollArgs {
    /// Stop after this many updates; run until interrupted if unset.
    pub count: Option<usize>,
}

pub struct SetArgs {
    /// Entity key from the entity table, e.g. `ac_output` or `led_mode_select`.
    pub key: String,
    /// `on`/`off` for switches, an option label for selects.
    pub value: String,
}
