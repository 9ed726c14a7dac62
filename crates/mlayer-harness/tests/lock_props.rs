#![forbid(unsafe_code)]

//! Property tests: page state is restored after any sequence of layer
//! operations.

use std::time::Duration;

use mlayer_core::{HostEvent, LayerHost, LayerKind, ModalConfig, Trigger};
use mlayer_harness::MockHost;
use mlayer_runtime::{LayerHandle, LayerService};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Open(LayerKind, Option<u32>),
    Trigger(usize, Trigger),
    Escape,
    Remove(usize),
    Advance(u64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (
            prop::sample::select(LayerKind::ALL.to_vec()),
            prop::option::of(1u32..1000)
        )
            .prop_map(|(kind, auto)| Op::Open(kind, auto)),
        (0usize..8, prop::sample::select(Trigger::ALL.to_vec()))
            .prop_map(|(i, t)| Op::Trigger(i, t)),
        Just(Op::Escape),
        (0usize..8).prop_map(Op::Remove),
        (0u64..500).prop_map(Op::Advance),
    ]
}

fn pick(handles: &[LayerHandle], i: usize) -> Option<&LayerHandle> {
    if handles.is_empty() {
        None
    } else {
        handles.get(i % handles.len())
    }
}

proptest! {
    #[test]
    fn page_restored_after_any_sequence(ops in prop::collection::vec(op(), 0..40)) {
        let mut svc = LayerService::new(MockHost::new().with_scrollbar(16.0));
        let page = svc.host().page_root();
        let mut handles = Vec::new();

        for op in ops {
            match op {
                Op::Open(kind, auto) => {
                    let mut config = ModalConfig::new();
                    if let Some(ms) = auto {
                        config = config.auto_close(ms);
                    }
                    handles.push(svc.open(kind, config).expect("open"));
                }
                Op::Trigger(i, trigger) => {
                    if let Some(layer) = pick(&handles, i) {
                        svc.dispatch(HostEvent::Action {
                            layer: layer.id(),
                            trigger,
                            payload: None,
                        })
                        .expect("dispatch");
                    }
                }
                Op::Escape => {
                    svc.dispatch(HostEvent::KeyDown { key: "Escape".into() })
                        .expect("escape");
                }
                Op::Remove(i) => {
                    if let Some(layer) = pick(&handles, i) {
                        layer.remove(None);
                        svc.pump().expect("pump");
                    }
                }
                Op::Advance(ms) => svc.advance(Duration::from_millis(ms)).expect("advance"),
            }
            let lock = svc.scroll_lock();
            prop_assert!(lock.releases() <= lock.acquisitions());
        }

        svc.remove(None);
        let lock = svc.scroll_lock();
        prop_assert_eq!(lock.acquisitions(), lock.releases());
        prop_assert!(!svc.host().has_class(page, "no-scroll"));
        prop_assert_eq!(svc.host().style(page, "padding-right"), None);
        prop_assert_eq!(svc.host().active_listeners(), 0);
        prop_assert_eq!(svc.host().live_stylesheets(), 0);
        prop_assert!(handles.iter().all(|h| !h.is_alive()));
    }
}
