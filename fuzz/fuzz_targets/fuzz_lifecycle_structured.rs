#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mlayer_core::{HostEvent, LayerKind, ModalConfig, Trigger};
use mlayer_harness::MockHost;
use mlayer_runtime::{LayerHandle, LayerService};

#[derive(Debug, Arbitrary)]
enum Op {
    Open { kind: u8, auto_close: Option<u16>, backdrop: bool },
    Trigger { layer: u8, trigger: u8 },
    Escape,
    Backdrop { layer: u8 },
    Remove { all: bool, layer: u8 },
    Advance { millis: u16 },
}

fn kind(n: u8) -> LayerKind {
    LayerKind::ALL[usize::from(n) % LayerKind::ALL.len()]
}

fn trigger(n: u8) -> Trigger {
    Trigger::ALL[usize::from(n) % Trigger::ALL.len()]
}

fuzz_target!(|ops: Vec<Op>| {
    let mut service = LayerService::new(MockHost::new().with_scrollbar(15.0));
    let mut handles: Vec<LayerHandle> = Vec::new();

    for op in ops.into_iter().take(64) {
        match op {
            Op::Open { kind: k, auto_close, backdrop } => {
                let mut config = ModalConfig::new().on_backdrop(backdrop);
                if let Some(ms) = auto_close {
                    config = config.auto_close(u32::from(ms));
                }
                if let Ok(handle) = service.open(kind(k), config) {
                    handles.push(handle);
                }
            }
            Op::Trigger { layer, trigger: t } => {
                if let Some(handle) = handles.get(usize::from(layer) % handles.len().max(1)) {
                    let _ = service.dispatch(HostEvent::Action {
                        layer: handle.id(),
                        trigger: trigger(t),
                        payload: None,
                    });
                }
            }
            Op::Escape => {
                let _ = service.dispatch(HostEvent::KeyDown { key: "Escape".into() });
            }
            Op::Backdrop { layer } => {
                if let Some(handle) = handles.get(usize::from(layer) % handles.len().max(1)) {
                    let _ = service.dispatch(HostEvent::BackdropClick { layer: handle.id() });
                }
            }
            Op::Remove { all, layer } => {
                if all {
                    service.remove(None);
                } else if let Some(handle) = handles.get(usize::from(layer) % handles.len().max(1)) {
                    handle.remove(None);
                    let _ = service.pump();
                }
            }
            Op::Advance { millis } => {
                let _ = service.advance(Duration::from_millis(u64::from(millis)));
            }
        }
    }

    // Drain everything: every acquired lock must be released.
    service.remove(None);
    let lock = service.scroll_lock();
    assert_eq!(lock.acquisitions(), lock.releases());
    assert_eq!(lock.holders(), 0);
    assert_eq!(service.host().active_listeners(), 0);
    assert_eq!(service.host().mounted_layers(), 0);
});
