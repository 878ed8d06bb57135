mod engine;
mod evidence;

pub use {
    engine::{SourceLease, StatusEngine, StatusListener, new_listener},
    evidence::{
        CaptureKind, ChangeDetail, Evidence, Status, StatusChange, StatusSnapshot, now_ms,
    },
};
