//! The host event channel (§4.7, §6): fire-and-forget status messages,
//! delivered synchronously through a caller-supplied sink. Distinct from
//! the `log` crate usage elsewhere in this crate — this is a structured
//! notification aimed at a host application, not a text log line.

/// Severity as delivered to the host; the numeric values match §6's wire
/// contract (`Warn=0`, `Ok=1`, `Err=2`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warn = 0,
    Ok = 1,
    Err = 2,
}

impl Severity {
    /// The bracketed label the original callback channel sends alongside
    /// the severity code (e.g. `"[Err]"`).
    pub fn label(self) -> &'static str {
        match self {
            Severity::Warn => "[Warn]",
            Severity::Ok => "[Ok]",
            Severity::Err => "[Err]",
        }
    }
}

/// One status message. `timestamp_ticks` is 100-nanosecond ticks since
/// local midnight, matching the original host boundary.
#[derive(Debug, Clone)]
pub struct Event {
    pub message: String,
    pub severity: Severity,
    pub timestamp_ticks: i64,
}

/// Falls back to UTC if the local offset can't be determined (e.g. no
/// `/etc/localtime` in a minimal container), same fallback shape as
/// `time`'s own `local-offset` callers elsewhere in the pack.
fn ticks_since_local_midnight() -> i64 {
    use time::OffsetDateTime;
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let seconds_today =
        now.hour() as i64 * 3_600 + now.minute() as i64 * 60 + now.second() as i64;
    let sub_second_ticks = (now.nanosecond() / 100) as i64;
    seconds_today * 10_000_000 + sub_second_ticks
}

/// A write-only sink the core calls synchronously and at most once per
/// failing operation. Modeled as a plain closure bound rather than a
/// boxed trait object, matching §9's "explicit interface object" note —
/// single-threaded code doesn't need `Arc`/`Mutex` here.
pub trait EventSink {
    fn send(&mut self, event: Event);
}

impl<F: FnMut(Event)> EventSink for F {
    fn send(&mut self, event: Event) {
        self(event)
    }
}

/// A sink that drops every event; used where the caller doesn't care.
pub struct NullSink;

impl EventSink for NullSink {
    fn send(&mut self, _event: Event) {}
}

pub(crate) fn emit(sink: &mut dyn EventSink, severity: Severity, message: impl Into<String>) {
    sink.send(Event {
        message: message.into(),
        severity,
        timestamp_ticks: ticks_since_local_midnight(),
    });
}
