// Licensed under the Apache-2.0 license

use hdcp_api::secure_action::ControlEncryptionResp;
use hdcp_api::{RxInfo, RxInfoFlags, DP_TYPE_MASK_ALL};
use hdcp_error::{ErrorClass, HdcpError};
use hdcp_hw_model::InitParams;
use hdcp_runtime::step::Step;

use crate::common::{enable_req, TestHarness, TestReceiver, DOWNSTREAM_IDS};

fn locked() -> TestHarness {
    TestHarness::ready_with(InitParams {
        type1_lock: true,
        ..Default::default()
    })
}

#[test]
fn test_lock_requires_type1_everywhere() {
    let mut h = locked();
    h.authenticate(&TestReceiver::new(), 0, 2).unwrap();

    for (types, mask) in [
        ([0u8, 1], DP_TYPE_MASK_ALL),
        ([1, 1], [0; 2]),
        ([1, 1], [u32::MAX, 0]),
    ] {
        let err = h.call(&enable_req(0, &types, mask)).unwrap_err();
        assert_eq!(err, HdcpError::RUNTIME_INVALID_TYPE1_LOCK_VIOLATION);
        assert_eq!(err.class(), ErrorClass::InvalidInput);
    }
    assert!(!h.hw().is_encrypting(0));
    assert_eq!(h.marker(), Step::EksGen);

    let resp: ControlEncryptionResp = h
        .call(&enable_req(0, &[1, 1], DP_TYPE_MASK_ALL))
        .unwrap();
    assert_eq!(resp.type0_enforced, 0);
    assert_eq!(h.hw().stream_types(0, 2), vec![1, 1]);
    assert_eq!(h.hw().dp_type_mask(0), DP_TYPE_MASK_ALL);
    assert!(h.hw().is_encrypting(0));
}

#[test]
fn test_lock_rejects_legacy_downstream() {
    let mut h = locked();
    let session = h.authenticate(&TestReceiver::repeater(), 0, 1).unwrap();
    let rx_info = RxInfo::new(
        1,
        DOWNSTREAM_IDS.len() as u8,
        RxInfoFlags::HDCP1_DEVICE_DOWNSTREAM,
    );
    h.vprime(&session, &DOWNSTREAM_IDS, rx_info, 0).unwrap();
    h.call(&session.mprime_req(&[1], 1)).unwrap();

    assert_eq!(
        h.call(&enable_req(0, &[1], DP_TYPE_MASK_ALL)).unwrap_err(),
        HdcpError::RUNTIME_INVALID_TYPE1_LOCK_VIOLATION
    );
    assert!(!h.hw().is_encrypting(0));
}

#[test]
fn test_lock_engaged_mid_session_blocks_type0() {
    let rx = TestReceiver::new();

    let mut h = TestHarness::ready();
    let start = h.start_session(0, 1).unwrap();
    h.hw().set_type1_lock(true);
    h.authenticate_from_start(&rx, 0, &start).unwrap();
    assert_eq!(
        h.call(&enable_req(0, &[0], [0; 2])).unwrap_err(),
        HdcpError::RUNTIME_INVALID_TYPE1_LOCK_VIOLATION
    );
    assert!(!h.hw().is_encrypting(0));
    assert_eq!(h.marker(), Step::EksGen);

    h.call(&enable_req(0, &[1], DP_TYPE_MASK_ALL)).unwrap();
    assert_eq!(h.hw().stream_types(0, 1), vec![1]);
    assert!(h.hw().is_encrypting(0));
}

#[test]
fn test_lock_released_mid_session_still_applies() {
    let rx = TestReceiver::new();

    let mut h = locked();
    let start = h.start_session(0, 1).unwrap();
    h.hw().set_type1_lock(false);
    h.authenticate_from_start(&rx, 0, &start).unwrap();
    assert_eq!(
        h.call(&enable_req(0, &[0], [0; 2])).unwrap_err(),
        HdcpError::RUNTIME_INVALID_TYPE1_LOCK_VIOLATION
    );
}
