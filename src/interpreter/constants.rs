// Constants for the robot runtime

/// Name of the required entry function
pub const ENTRY_POINT: &str = "user_main";

/// Number of sensor channels (`gAD[0..10]`)
pub const CHANNEL_COUNT: usize = 10;

/// Number of shared variable slots (`gV[0..10]`)
pub const SLOT_COUNT: usize = 10;

/// Sensor channel array as seen by user code
pub const SENSOR_ARRAY: &str = "gAD";

/// Variable slot array as seen by user code
pub const SLOT_ARRAY: &str = "gV";

/// Motor actuator built-in
pub const ACTUATE_FN: &str = "motor";

/// Timed-wait built-in
pub const WAIT_FN: &str = "wait_ms";

/// Reserved boolean literal; also the only cast-like token the normalizer keeps
pub const TRUE_LITERAL: &str = "TRUE";

/// Channel-id constant names, bound to the center/left/right channels
pub const CENTER_CHANNEL: &str = "CN2";
pub const LEFT_CHANNEL: &str = "CN5";
pub const RIGHT_CHANNEL: &str = "CN6";

/// Symbolic names for the variable slots, `VAR_A` = 0 … `VAR_J` = 9
pub const SLOT_NAMES: [&str; SLOT_COUNT] = [
    "VAR_A", "VAR_B", "VAR_C", "VAR_D", "VAR_E", "VAR_F", "VAR_G", "VAR_H", "VAR_I", "VAR_J",
];

/// Names user code may not declare or define
pub fn is_reserved_name(name: &str) -> bool {
    matches!(
        name,
        SENSOR_ARRAY
            | SLOT_ARRAY
            | ACTUATE_FN
            | WAIT_FN
            | TRUE_LITERAL
            | CENTER_CHANNEL
            | LEFT_CHANNEL
            | RIGHT_CHANNEL
    ) || SLOT_NAMES.contains(&name)
}
