//! SIP user-agent adapters.
//!
//! | Adapter      | When                                                    |
//! |--------------|---------------------------------------------------------|
//! | `DisabledSip`| `sip_enable` is false, or no SIP stack is linked        |
//! | `EspSip`     | device build with the `adf-sip` feature (ESP-ADF stack) |
//! | `SimSip`     | host simulation; state is scripted by the caller        |
//!
//! The stack owns registration and media; the station only polls its
//! state bitset and issues the four call actions.

use log::info;

use crate::app::ports::{SipError, SipPort};
use crate::sip::SipState;

// ───────────────────────────────────────────────────────────────
// Disabled
// ───────────────────────────────────────────────────────────────

/// Always reports `NONE`; every action is refused.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledSip;

impl SipPort for DisabledSip {
    fn state(&mut self) -> SipState {
        SipState::NONE
    }

    fn invite(&mut self, _target: &str) -> Result<(), SipError> {
        Err(SipError::Unavailable)
    }

    fn bye(&mut self) -> Result<(), SipError> {
        Err(SipError::Unavailable)
    }

    fn cancel(&mut self) -> Result<(), SipError> {
        Err(SipError::Unavailable)
    }

    fn answer(&mut self, _auto: bool) -> Result<(), SipError> {
        Err(SipError::Unavailable)
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation
// ───────────────────────────────────────────────────────────────

/// Host stand-in for the SIP stack.  Moves through the call states the
/// way the real stack would for each accepted action.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug)]
pub struct SimSip {
    state: SipState,
    last_target: heapless::String<16>,
}

#[cfg(not(target_os = "espidf"))]
impl Default for SimSip {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_os = "espidf"))]
impl SimSip {
    pub fn new() -> Self {
        Self {
            state: SipState::NONE,
            last_target: heapless::String::new(),
        }
    }

    pub fn set_state(&mut self, state: SipState) {
        self.state = state;
    }

    pub fn last_target(&self) -> &str {
        &self.last_target
    }

    fn registered(&self) -> SipState {
        SipState::CONNECTED.union(SipState::REGISTERED)
    }
}

#[cfg(not(target_os = "espidf"))]
impl SipPort for SimSip {
    fn state(&mut self) -> SipState {
        self.state
    }

    fn invite(&mut self, target: &str) -> Result<(), SipError> {
        if !self.state.is_registered() {
            return Err(SipError::Rejected(-1));
        }
        self.last_target.clear();
        self.last_target
            .push_str(target)
            .map_err(|()| SipError::Rejected(-2))?;
        info!("SIP(sim): INVITE {}", target);
        self.state = self.state.union(SipState::CALLING);
        Ok(())
    }

    fn bye(&mut self) -> Result<(), SipError> {
        if !self.state.is_on_call() {
            return Err(SipError::Rejected(-1));
        }
        info!("SIP(sim): BYE");
        self.state = self.registered();
        Ok(())
    }

    fn cancel(&mut self) -> Result<(), SipError> {
        if !(self.state.is_calling() || self.state.is_in_progress()) {
            return Err(SipError::Rejected(-1));
        }
        info!("SIP(sim): CANCEL");
        self.state = self.registered();
        Ok(())
    }

    fn answer(&mut self, _auto: bool) -> Result<(), SipError> {
        if !self.state.is_ringing() {
            return Err(SipError::Rejected(-1));
        }
        info!("SIP(sim): 200 OK");
        self.state = self.registered().union(SipState::ON_CALL);
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-ADF stack
// ───────────────────────────────────────────────────────────────

#[cfg(all(target_os = "espidf", feature = "adf-sip"))]
pub use self::esp::EspSip;

#[cfg(all(target_os = "espidf", feature = "adf-sip"))]
mod esp {
    //! Thin wrapper over ESP-ADF `esp_sip`.  Requires the ADF component
    //! in the IDF build; the config layout follows `sip_service.h`.

    use core::ffi::{c_char, c_int, c_void};
    use core::net::Ipv4Addr;
    use core::sync::atomic::{AtomicU32, Ordering};
    use std::ffi::CString;

    use log::{debug, info};

    use crate::app::ports::{SipError, SipPort};
    use crate::sip::SipState;

    type SipHandle = *mut c_void;

    #[repr(C)]
    struct SipEventMsg {
        handle: SipHandle,
        kind: c_int,
        data: *mut c_void,
        data_len: c_int,
    }

    #[repr(C)]
    struct SipConfig {
        uri: *const c_char,
        stack: c_int,
        task_prio: c_int,
        task_core: c_int,
        send_options: bool,
        event_handler: Option<unsafe extern "C" fn(*mut SipEventMsg) -> c_int>,
        acodec_type: c_int,
        crt_bundle_attach: *mut c_void,
        cert_pem: *const c_char,
        cert_len: c_int,
    }

    unsafe extern "C" {
        fn esp_sip_init(config: *mut SipConfig) -> SipHandle;
        fn esp_sip_start(sip: SipHandle) -> c_int;
        fn esp_sip_get_state(sip: SipHandle) -> u32;
        fn esp_sip_uac_invite(sip: SipHandle, extension: *const c_char) -> c_int;
        fn esp_sip_uac_bye(sip: SipHandle) -> c_int;
        fn esp_sip_uac_cancel(sip: SipHandle) -> c_int;
        fn esp_sip_uas_answer(sip: SipHandle, accept: bool) -> c_int;
    }

    const EVENT_REQUEST_NETWORK_STATUS: c_int = 1;
    const EVENT_REQUEST_NETWORK_IP: c_int = 2;
    const ACODEC_G711U: c_int = 1;

    /// Station address handed to the stack on request.  0 = no link.
    static LOCAL_IP: AtomicU32 = AtomicU32::new(0);

    unsafe extern "C" fn on_event(event: *mut SipEventMsg) -> c_int {
        // SAFETY: the stack passes a valid message for the callback's duration.
        let Some(event) = (unsafe { event.as_mut() }) else {
            return 0;
        };
        let ip = Ipv4Addr::from(LOCAL_IP.load(Ordering::Relaxed));
        match event.kind {
            EVENT_REQUEST_NETWORK_STATUS => c_int::from(!ip.is_unspecified()),
            EVENT_REQUEST_NETWORK_IP => {
                let text = ip.to_string();
                let len = text.len().min(15);
                // SAFETY: the stack provides a buffer sized for a dotted quad.
                unsafe {
                    core::ptr::copy_nonoverlapping(text.as_ptr(), event.data.cast::<u8>(), len);
                    *event.data.cast::<u8>().add(len) = 0;
                }
                len as c_int
            }
            other => {
                debug!("SIP event {}", other);
                0
            }
        }
    }

    pub struct EspSip {
        handle: SipHandle,
        // Kept alive for the stack, which holds the pointer.
        _uri: CString,
    }

    // SAFETY: the ADF stack serialises access internally; the handle is
    // only used from the arbiter task after construction.
    unsafe impl Send for EspSip {}

    impl EspSip {
        pub fn start(uri: &str, local_ip: Ipv4Addr) -> anyhow::Result<Self> {
            LOCAL_IP.store(u32::from(local_ip), Ordering::Relaxed);
            let uri = CString::new(uri)?;
            let mut cfg = SipConfig {
                uri: uri.as_ptr(),
                stack: 0,
                task_prio: 0,
                task_core: 0,
                send_options: true,
                event_handler: Some(on_event),
                acodec_type: ACODEC_G711U,
                crt_bundle_attach: core::ptr::null_mut(),
                cert_pem: core::ptr::null(),
                cert_len: 0,
            };
            // SAFETY: cfg and uri outlive the call; the stack copies cfg.
            let handle = unsafe { esp_sip_init(&mut cfg) };
            anyhow::ensure!(!handle.is_null(), "esp_sip_init failed");
            // SAFETY: handle was just returned by esp_sip_init.
            let rc = unsafe { esp_sip_start(handle) };
            anyhow::ensure!(rc == 0, "esp_sip_start failed ({})", rc);
            info!("SIP: stack started");
            Ok(Self { handle, _uri: uri })
        }

        fn check(rc: c_int) -> Result<(), SipError> {
            if rc == 0 { Ok(()) } else { Err(SipError::Rejected(rc)) }
        }
    }

    impl SipPort for EspSip {
        fn state(&mut self) -> SipState {
            // SAFETY: valid handle for the lifetime of self.
            SipState::from_bits(unsafe { esp_sip_get_state(self.handle) })
        }

        fn invite(&mut self, target: &str) -> Result<(), SipError> {
            let ext = CString::new(target).map_err(|_| SipError::Rejected(-1))?;
            // SAFETY: valid handle; ext lives across the call.
            Self::check(unsafe { esp_sip_uac_invite(self.handle, ext.as_ptr()) })
        }

        fn bye(&mut self) -> Result<(), SipError> {
            // SAFETY: valid handle.
            Self::check(unsafe { esp_sip_uac_bye(self.handle) })
        }

        fn cancel(&mut self) -> Result<(), SipError> {
            // SAFETY: valid handle.
            Self::check(unsafe { esp_sip_uac_cancel(self.handle) })
        }

        fn answer(&mut self, auto: bool) -> Result<(), SipError> {
            // SAFETY: valid handle.
            Self::check(unsafe { esp_sip_uas_answer(self.handle, auto) })
        }
    }
}
