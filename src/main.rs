//! Nurse-call station firmware: main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  EspI2cBus      QueueLedSink    WifiAccessPoint  LogEventSink│
//! │  (BusPort)      TicketNotifier  (AccessPoint)    (EventSink) │
//! │  FileConfigStore  EspSip / DisabledSip   MonotonicClock      │
//! │                                                              │
//! │  ─────────────── Port Trait Boundary ──────────────────      │
//! │                                                              │
//! │   io task (pri 10, APP)   arbiter (pri 5, APP)   reporter    │
//! │   sampler · latches  ──▶  call session · config  (pri 1, PRO)│
//! │                KEY_QUEUE / LED_QUEUE / TICKET_QUEUE          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use core::net::Ipv4Addr;
use core::str::FromStr;

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::EspWifi;
use log::{error, info, warn};

use nursecall::adapters::config_store::{CONFIG_PATH, FileConfigStore, mount_spiffs};
use nursecall::adapters::log_sink::LogEventSink;
use nursecall::adapters::queues::QueueKeySource;
use nursecall::adapters::reporter::{EspHttpPoster, ReportTarget, Reporter};
use nursecall::adapters::sip::DisabledSip;
use nursecall::adapters::station::StationAdapter;
use nursecall::adapters::time::MonotonicClock;
use nursecall::adapters::wifi_ap::{AP_PASS, AP_SSID, WifiAccessPoint};
use nursecall::app::arbiter::{Arbiter, StationProfile};
use nursecall::app::ports::SipPort;
use nursecall::config::{BootConfig, FW_VERSION, StationConfig, load_or_reset};
use nursecall::drivers::hw_init::{StationHw, init_peripherals};
use nursecall::drivers::task_pin::{ARBITER_TASK, IO_TASK, REPORTER_TASK, spawn_on_core};
use nursecall::events::{KEY_QUEUE, LED_QUEUE, TICKET_QUEUE};
use nursecall::io_task::IoTask;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    info!("nursecall station, firmware version {}", FW_VERSION);

    // ── 2. Configuration ──────────────────────────────────────
    mount_spiffs()?;
    let store = FileConfigStore::new(CONFIG_PATH);
    let config = match load_or_reset(&store) {
        BootConfig::Run(cfg) => cfg,
        BootConfig::Restart => {
            warn!("restarting with default configuration");
            esp_idf_hal::reset::restart();
        }
    };
    let mut profile = config.station_profile();

    // ── 3. Peripherals ────────────────────────────────────────
    let StationHw {
        bus,
        board_int,
        keyboard_int,
        modem,
    } = init_peripherals()?;

    // ── 4. Expander I/O task ──────────────────────────────────
    let invert_panic = profile.invert_panic;
    spawn_on_core(IO_TASK, move || {
        let io = IoTask::new(bus, board_int, keyboard_int, FreeRtos, invert_panic);
        io.run(&MonotonicClock::new(), &KEY_QUEUE, &LED_QUEUE)
    })?;

    // ── 5. Configuration access point (off until requested) ───
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let wifi = EspWifi::new(modem, sysloop, Some(nvs))?;
    let ap = WifiAccessPoint::new(wifi, AP_SSID, AP_PASS)?;

    // ── 6. Reporter ───────────────────────────────────────────
    match ReportTarget::from_config(&config) {
        Some(target) => {
            spawn_on_core(REPORTER_TASK, move || {
                Reporter::new(target, EspHttpPoster).run(&TICKET_QUEUE, FreeRtos)
            })?;
        }
        None => warn!("reporter disabled, tickets will be dropped"),
    }

    // ── 7. Call-state arbiter ─────────────────────────────────
    let arbiter = if profile.sip_enabled {
        match start_sip(&config) {
            Some(sip) => spawn_arbiter(profile, sip, ap)?,
            None => {
                profile.sip_enabled = false;
                spawn_arbiter(profile, DisabledSip, ap)?
            }
        }
    } else {
        info!("SIP disabled");
        spawn_arbiter(profile, DisabledSip, ap)?
    };

    if arbiter.join().is_err() {
        error!("arbiter task panicked, restarting");
    }
    esp_idf_hal::reset::restart();
}

fn spawn_arbiter<S>(
    profile: StationProfile,
    sip: S,
    ap: WifiAccessPoint,
) -> std::io::Result<std::thread::JoinHandle<()>>
where
    S: SipPort + Send + 'static,
{
    spawn_on_core(ARBITER_TASK, move || {
        let mut station = StationAdapter::new(&LED_QUEUE, &TICKET_QUEUE, sip, ap);
        let mut keys = QueueKeySource::new(&KEY_QUEUE, FreeRtos);
        Arbiter::new(profile).run(
            &MonotonicClock::new(),
            &mut keys,
            &mut station,
            &mut LogEventSink::new(),
        )
    })
}

/// The station's own address for the SIP stack.  Only known up front
/// with static addressing.
fn local_ip(config: &StationConfig) -> Ipv4Addr {
    if config.use_dhcp {
        return Ipv4Addr::UNSPECIFIED;
    }
    Ipv4Addr::from_str(&config.ip).unwrap_or(Ipv4Addr::UNSPECIFIED)
}

#[cfg(feature = "adf-sip")]
fn start_sip(config: &StationConfig) -> Option<nursecall::adapters::sip::EspSip> {
    match nursecall::adapters::sip::EspSip::start(&config.sip_uri, local_ip(config)) {
        Ok(sip) => Some(sip),
        Err(e) => {
            error!("SIP start failed: {}", e);
            None
        }
    }
}

#[cfg(not(feature = "adf-sip"))]
fn start_sip(config: &StationConfig) -> Option<DisabledSip> {
    warn!(
        "SIP enabled for {} but no SIP stack is linked (local ip {})",
        config.sip_uri,
        local_ip(config)
    );
    None
}
