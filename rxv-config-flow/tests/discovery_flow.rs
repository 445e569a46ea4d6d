//! Discovery-initiated registration flow

mod common;

use std::sync::Arc;

use entry_registry::{EntryRegistry, EntrySource, RegistrationStore};
use rstest::rstest;
use rxv_config_flow::{AbortReason, FlowResult, ReceiverConfigFlow, STEP_CONFIRM};
use rxv_discovery::{Advertisement, HEADER_HOST};
use serde_json::json;

use common::*;

#[rstest]
#[case::not_a_yamaha_device(FakeIndex::not_yamaha(), discovery_advertisement("123456789"))]
#[case::missing_location(FakeIndex::yamaha(), Advertisement::new("mock_usn", "mock_st"))]
#[case::blank_location(FakeIndex::yamaha(), Advertisement::new("mock_usn", "mock_st").with_location(" "))]
fn test_unusable_advertisement_aborts_without_probe(
    #[case] index: Arc<FakeIndex>,
    #[case] advertisement: Advertisement,
) {
    let registry = Arc::new(EntryRegistry::new());
    let probe = FakeProbe::identified(Some(SERIAL), Some(MODEL));
    let manager = manager(probe.clone(), index, &registry);

    let step = manager.init_discovery(&advertisement);

    assert_eq!(step.result.abort_reason(), Some(AbortReason::YxcControlUrlMissing));
    assert_eq!(probe.calls(), 0);
    assert!(manager.in_progress().is_empty());
}

#[test]
fn test_successful_add_device() {
    let registry = Arc::new(EntryRegistry::new());
    let manager = manager(FakeProbe::identified(None, Some(MODEL)), FakeIndex::yamaha(), &registry);

    let step = manager.init_discovery(&discovery_advertisement(SERIAL));

    match &step.result {
        FlowResult::Form {
            step_id,
            data_schema,
            errors,
        } => {
            assert_eq!(step_id, STEP_CONFIRM);
            assert!(data_schema.is_empty());
            assert!(errors.is_none());
        }
        other => panic!("Expected confirm form, got {:?}", other),
    }
    assert!(registry.is_empty());

    let step = manager.configure(&step.flow_id, &json!({})).unwrap();

    let FlowResult::CreateEntry { data, entry, .. } = step.result else {
        panic!("Expected create_entry");
    };
    assert_eq!(
        data,
        json!({
            "host": "127.0.0.1",
            "serial": "1234567890",
            "upnp_description": "http://127.0.0.1/desc.xml",
        })
    );
    let entry = entry.unwrap();
    assert_eq!(entry.source, EntrySource::Ssdp);
    assert_eq!(entry.unique_id.as_deref(), Some(SERIAL));
    assert_eq!(entry.title, MODEL);
}

#[test]
fn test_confirmation_does_not_probe_again() {
    let registry = Arc::new(EntryRegistry::new());
    let probe = FakeProbe::identified(Some(SERIAL), Some(MODEL));
    let manager = manager(probe.clone(), FakeIndex::yamaha(), &registry);

    let step = manager.init_discovery(&discovery_advertisement(SERIAL));
    manager.configure(&step.flow_id, &json!({})).unwrap();

    assert_eq!(probe.calls(), 1);
}

#[test]
fn test_existing_device_update() {
    let registry = Arc::new(EntryRegistry::new());
    add_existing(&registry, "192.168.188.18");
    let manager = manager(FakeProbe::identified(None, None), FakeIndex::yamaha(), &registry);

    let step = manager.init_discovery(&discovery_advertisement(SERIAL));

    assert_eq!(step.result.abort_reason(), Some(AbortReason::AlreadyConfigured));
    let entry = registry.find(SERIAL).unwrap();
    assert_eq!(entry.data.host, "127.0.0.1");
    assert_eq!(entry.model.as_deref(), Some("MC20"));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_existing_device_same_host_untouched() {
    let registry = Arc::new(EntryRegistry::new());
    add_existing(&registry, HOST);
    let before = registry.entries();
    let manager = manager(FakeProbe::identified(Some(SERIAL), Some(MODEL)), FakeIndex::yamaha(), &registry);

    let step = manager.init_discovery(&discovery_advertisement(SERIAL));

    assert_eq!(step.result.abort_reason(), Some(AbortReason::AlreadyConfigured));
    assert_eq!(registry.entries(), before);
}

#[rstest]
#[case::connection_failure(FakeProbe::connection_error(), AbortReason::CannotConnect)]
#[case::malformed(FakeProbe::malformed(), AbortReason::CannotConnect)]
#[case::unexpected(FakeProbe::unexpected_error(), AbortReason::Unknown)]
fn test_probe_failures_abort(#[case] probe: Arc<FakeProbe>, #[case] reason: AbortReason) {
    let registry = Arc::new(EntryRegistry::new());
    let manager = manager(probe, FakeIndex::yamaha(), &registry);

    let step = manager.init_discovery(&discovery_advertisement(SERIAL));

    assert_eq!(step.result.abort_reason(), Some(reason));
    assert!(registry.is_empty());
}

#[test]
fn test_host_header_preferred_over_location() {
    let registry = Arc::new(EntryRegistry::new());
    let mut flow = ReceiverConfigFlow::new(
        FakeProbe::identified(Some(SERIAL), Some(MODEL)),
        FakeIndex::yamaha(),
        registry.clone(),
    );

    let advertisement = discovery_advertisement(SERIAL).with_header(HEADER_HOST, "10.0.0.5");
    assert_eq!(flow.start_discovery(&advertisement).step_id(), Some(STEP_CONFIRM));

    let result = flow.configure(&json!({})).unwrap();
    assert_eq!(result.data().unwrap()["host"], "10.0.0.5");
    assert_eq!(result.data().unwrap()["upnp_description"], "http://127.0.0.1/desc.xml");
    assert!(flow.is_finished());
}

#[test]
fn test_racing_confirmations_register_once() {
    let registry = Arc::new(EntryRegistry::new());
    let manager = manager(FakeProbe::identified(Some(SERIAL), Some(MODEL)), FakeIndex::yamaha(), &registry);

    // Both flows validate before either registers
    let first = manager.init_discovery(&discovery_advertisement(SERIAL));
    let second = manager.init_discovery(&discovery_advertisement(SERIAL));
    assert_eq!(first.result.step_id(), Some(STEP_CONFIRM));
    assert_eq!(second.result.step_id(), Some(STEP_CONFIRM));

    let first = manager.configure(&first.flow_id, &json!({})).unwrap();
    let second = manager.configure(&second.flow_id, &json!({})).unwrap();

    assert!(matches!(first.result, FlowResult::CreateEntry { .. }));
    assert_eq!(second.result.abort_reason(), Some(AbortReason::AlreadyConfigured));
    assert_eq!(registry.len(), 1);
}
