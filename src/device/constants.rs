use uuid::Uuid;

/**
 * How long (milliseconds) a single connection attempt may take.
 */
pub const CONNECT_TIMEOUT: u64 = 10_000;

/**
 * How often (milliseconds) to check the connection status while listening.
 */
pub const POLL_DELAY: u64 = 1000;

/**
 * How long (milliseconds) to wait before attempting to reconnect.
 */
pub const RETRY_DELAY: u64 = 2000;

/**
 * How long (milliseconds) closing a link may take.
 */
pub const DISCONNECT_DEADLINE: u64 = 2000;

/**
 * How often (milliseconds) to look for a fixed address among known peripherals.
 */
pub const ADDRESS_POLL_DELAY: u64 = 250;

pub const DEFAULT_NAME_PREFIX: &str = "ESP32-RGB-BLE";
pub const DEFAULT_SCAN_SECONDS: f64 = 6.0;

/**
 * Nordic UART Service TX characteristic: notifications from the device to us.
 */
pub const NUS_TX_UUID: Uuid = Uuid::from_u128(0x6e400003_b5a3_f393_e0a9_e50e24dcca9e);

/**
 * Prefix printed in front of every received message.
 */
pub const RX_MARKER: &str = "[RX]";
