use std::path::PathBuf;
use std::time::Duration;

/// How the daemon acquires frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSourceKind {
    /// Use the camera if the device node exists, else fall back to the
    /// synthetic source.
    Auto,
    Camera,
    Synthetic,
}

/// Annunciator selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareMode {
    /// Probe the host and use GPIO/LCD hardware when present.
    Auto,
    /// Force the console annunciator.
    Console,
}

/// Daemon configuration, loaded from environment variables.
pub struct Config {
    /// Path to the SQLite database file.
    pub db_path: PathBuf,
    /// Directory for saved evidence captures.
    pub evidence_dir: PathBuf,
    /// Euclidean distance below which an observation matches (strict).
    pub match_threshold: f32,
    /// Minimum time between two alerts for the same identity.
    pub cooldown: Duration,
    /// How long the alert signal stays active once fired.
    pub alert_duration: Duration,
    /// Scanning falls back to idle after this long without observations.
    pub idle_timeout: Duration,
    /// Poll interval while gated out by the motion sensor.
    pub motion_poll: Duration,
    /// Pacing between frame iterations.
    pub frame_interval: Duration,
    /// Downscale factor applied before the encoder runs (0 < f <= 1).
    pub scale_factor: f32,
    /// Identifier of this detection terminal, stamped on every alert.
    pub terminal_id: String,
    /// V4L2 device path.
    pub camera_device: String,
    pub camera_width: u32,
    pub camera_height: u32,
    pub frame_source: FrameSourceKind,
    /// Encoder backend name ("sim" is the only in-tree backend).
    pub encoder: String,
    /// Capacity of the alert handoff queue.
    pub sink_queue: usize,
    /// Gallery reload interval.
    pub refresh_interval: Duration,
    pub hardware: HardwareMode,
    /// BCM pin driving the buzzer.
    pub buzzer_pin: u32,
    /// BCM pin of the PIR motion sensor; unset disables motion gating.
    pub motion_pin: Option<u32>,
    /// I2C bus device for the status LCD.
    pub lcd_bus: String,
    /// I2C address of the LCD backpack.
    pub lcd_addr: u16,
}

impl Config {
    /// Load configuration from `VIGIL_*` environment variables with defaults.
    pub fn from_env() -> Self {
        let data_dir = std::env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
                PathBuf::from(home).join(".local/share")
            })
            .join("vigil");

        let db_path = std::env::var("VIGIL_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("vigil.db"));

        let evidence_dir = std::env::var("VIGIL_EVIDENCE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("evidence"));

        let frame_source = match std::env::var("VIGIL_FRAME_SOURCE").as_deref() {
            Ok("camera") => FrameSourceKind::Camera,
            Ok("sim") | Ok("synthetic") => FrameSourceKind::Synthetic,
            _ => FrameSourceKind::Auto,
        };

        let hardware = match std::env::var("VIGIL_HARDWARE").as_deref() {
            Ok("console") | Ok("off") => HardwareMode::Console,
            _ => HardwareMode::Auto,
        };

        Self {
            db_path,
            evidence_dir,
            match_threshold: env_f32("VIGIL_MATCH_THRESHOLD", 0.6),
            cooldown: Duration::from_secs(env_u64("VIGIL_COOLDOWN_SECS", 30)),
            alert_duration: Duration::from_secs(env_u64("VIGIL_ALERT_SECS", 5)),
            idle_timeout: Duration::from_secs(env_u64("VIGIL_IDLE_TIMEOUT_SECS", 30)),
            motion_poll: Duration::from_millis(env_u64("VIGIL_MOTION_POLL_MS", 1000)),
            frame_interval: Duration::from_millis(env_u64("VIGIL_FRAME_INTERVAL_MS", 100)),
            scale_factor: env_f32("VIGIL_SCALE_FACTOR", 0.5),
            terminal_id: std::env::var("VIGIL_TERMINAL_ID")
                .unwrap_or_else(|_| "TERM-01".to_string()),
            camera_device: std::env::var("VIGIL_CAMERA_DEVICE")
                .unwrap_or_else(|_| "/dev/video0".to_string()),
            camera_width: env_u32("VIGIL_CAMERA_WIDTH", 640),
            camera_height: env_u32("VIGIL_CAMERA_HEIGHT", 480),
            frame_source,
            encoder: std::env::var("VIGIL_ENCODER").unwrap_or_else(|_| "sim".to_string()),
            sink_queue: env_usize("VIGIL_SINK_QUEUE", 16),
            refresh_interval: Duration::from_secs(env_u64("VIGIL_REFRESH_SECS", 30)),
            hardware,
            buzzer_pin: env_u32("VIGIL_BUZZER_GPIO", 26),
            motion_pin: std::env::var("VIGIL_MOTION_GPIO")
                .ok()
                .and_then(|v| v.parse().ok()),
            lcd_bus: std::env::var("VIGIL_LCD_BUS").unwrap_or_else(|_| "/dev/i2c-1".to_string()),
            lcd_addr: env_hex_u16("VIGIL_LCD_ADDR", 0x27),
        }
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Accepts "0x27" or "39".
fn env_hex_u16(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|v| {
            let v = v.trim();
            match v.strip_prefix("0x").or_else(|| v.strip_prefix("0X")) {
                Some(hex) => u16::from_str_radix(hex, 16).ok(),
                None => v.parse().ok(),
            }
        })
        .unwrap_or(default)
}
