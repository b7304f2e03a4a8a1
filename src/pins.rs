//! GPIO / I²C assignments for the call-station main board.
//!
//! Single source of truth for pin numbers, bus addresses and the bit
//! layout of both PCF8574-style port expanders.

// ---------------------------------------------------------------------------
// I²C bus
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 32;
pub const I2C_SCL_GPIO: i32 = 33;
pub const I2C_FREQ_HZ: u32 = 100_000;
/// Per-transaction timeout.  Applies to every read and write.
pub const I2C_TIMEOUT_MS: u32 = 10;

// ---------------------------------------------------------------------------
// Expander interrupt lines (open-drain, active LOW)
// ---------------------------------------------------------------------------

/// Keyboard expander INT.  Input-only pad, external pull-up.
pub const KEYBOARD_INT_GPIO: i32 = 34;
/// Board expander INT.  Input-only pad, external pull-up.
pub const BOARD_INT_GPIO: i32 = 35;

// ---------------------------------------------------------------------------
// Board expander (bed-side inputs + doorway lamps)
// ---------------------------------------------------------------------------

pub const BOARD_EXPANDER_ADDR: u8 = 0x38;
/// Input bits.  Active LOW: a pressed key pulls its bit to 0.
pub const BOARD_INPUT_MASK: u8 = 0x3F;

pub const BOARD_BED1_BIT: u8 = 0;
pub const BOARD_CALL1_BIT: u8 = 1;
pub const BOARD_BED2_BIT: u8 = 2;
pub const BOARD_CALL2_BIT: u8 = 3;
/// Panic / priority pull-cord.  Polarity can be inverted by config.
pub const BOARD_PANIC_BIT: u8 = 4;
pub const BOARD_BATH_BIT: u8 = 5;

/// Doorway lamp outputs (active LOW).
pub const BOARD_DOOR_RED_BIT: u8 = 6;
pub const BOARD_DOOR_GREEN_BIT: u8 = 7;

// ---------------------------------------------------------------------------
// Keyboard expander (nurse keypad + front-panel LEDs)
// ---------------------------------------------------------------------------

pub const KEYBOARD_EXPANDER_ADDR: u8 = 0x39;
/// Input bits.  Active HIGH with external pull-downs.
pub const KEYBOARD_INPUT_MASK: u8 = 0x0F;

pub const KEYBOARD_RESOLVE_BIT: u8 = 0;
pub const KEYBOARD_GRAY_BIT: u8 = 1;
pub const KEYBOARD_NURSE_BIT: u8 = 2;
pub const KEYBOARD_BLACK_BIT: u8 = 3;

/// Front-panel LED outputs (active LOW).
pub const KEYBOARD_STATUS_LED_BIT: u8 = 4;
pub const KEYBOARD_BED1_LED_BIT: u8 = 5;
pub const KEYBOARD_BED2_LED_BIT: u8 = 6;
pub const KEYBOARD_BATH_LED_BIT: u8 = 7;

/// What the keyboard bank reads at rest when the pull-downs are fitted:
/// inputs pulled to 0, LED latches idle at 1.
pub const KEYBOARD_PULLDOWN_PATTERN: u8 = 0xF0;

// ---------------------------------------------------------------------------
// Board temperature probe (LM75-compatible)
// ---------------------------------------------------------------------------

pub const TEMP_SENSOR_ADDR: u8 = 0x48;
