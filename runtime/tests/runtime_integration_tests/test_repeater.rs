// Licensed under the Apache-2.0 license

use hdcp_api::secure_action::{ControlEncryptionResp, ValidateVprimeResp};
use hdcp_api::{RxInfo, RxInfoFlags};
use hdcp_drivers::SecretId;
use hdcp_error::HdcpError;
use hdcp_runtime::step::Step;

use crate::common::{enable_req, AuthSession, TestHarness, TestReceiver, DOWNSTREAM_IDS};

fn two_downstream() -> RxInfo {
    RxInfo::new(1, DOWNSTREAM_IDS.len() as u8, RxInfoFlags::empty())
}

fn repeater_through_eks(h: &mut TestHarness, stream_count: u32) -> AuthSession {
    let session = h
        .authenticate(&TestReceiver::repeater(), 0, stream_count)
        .unwrap();
    assert!(session.repeater);
    assert_eq!(h.marker(), Step::EksGen);
    session
}

#[test]
fn test_repeater_handshake() {
    let mut h = TestHarness::ready();
    let session = repeater_through_eks(&mut h, 2);

    // Encryption waits for the topology and stream checks.
    assert_eq!(
        h.call(&enable_req(0, &[0, 1], [0; 2])).unwrap_err(),
        HdcpError::RUNTIME_SEQUENCE_VIOLATION
    );

    let (req, v) = session.vprime_req(&DOWNSTREAM_IDS, two_downstream(), 0);
    let resp: ValidateVprimeResp = h.call(&req).unwrap();
    assert_eq!(resp.v_lsb, v[16..]);
    assert_eq!(resp.flags, 0);
    assert_eq!(h.marker(), Step::VprimeValidation);
    assert_eq!(h.store().peek(SecretId::Vlsb), Some(&v[16..]));

    assert_eq!(
        h.call(&enable_req(0, &[0, 1], [0; 2])).unwrap_err(),
        HdcpError::RUNTIME_SEQUENCE_VIOLATION
    );

    h.call(&session.mprime_req(&[0, 1], 1)).unwrap();
    assert_eq!(h.marker(), Step::MprimeValidation);

    let resp: ControlEncryptionResp = h.call(&enable_req(0, &[0, 1], [0; 2])).unwrap();
    assert_eq!(resp.type0_enforced, 0);
    assert!(h.hw().is_encrypting(0));
    assert_eq!(h.hw().stream_types(0, 2), vec![0, 1]);
    assert_eq!(h.marker(), Step::ControlEncryption);
}

#[test]
fn test_first_seq_num_v_must_be_zero() {
    let mut h = TestHarness::ready();
    let session = repeater_through_eks(&mut h, 1);

    assert_eq!(
        h.vprime(&session, &DOWNSTREAM_IDS, two_downstream(), 5)
            .unwrap_err(),
        HdcpError::RUNTIME_VERIFY_SEQ_NUM_V_REPLAY
    );
    assert_eq!(h.marker(), Step::EksGen);
    h.vprime(&session, &DOWNSTREAM_IDS, two_downstream(), 0)
        .unwrap();
}

#[test]
fn test_topology_exceeded() {
    let mut h = TestHarness::ready();
    let session = repeater_through_eks(&mut h, 1);
    let before = h.snapshot();

    for flag in [RxInfoFlags::MAX_DEVS_EXCEEDED, RxInfoFlags::MAX_CASCADE_EXCEEDED] {
        let rx_info = RxInfo::new(1, DOWNSTREAM_IDS.len() as u8, flag);
        assert_eq!(
            h.vprime(&session, &DOWNSTREAM_IDS, rx_info, 0).unwrap_err(),
            HdcpError::RUNTIME_VERIFY_TOPOLOGY_EXCEEDED
        );
    }
    assert_eq!(h.snapshot(), before);
}

#[test]
fn test_receiver_id_list_longer_than_device_count() {
    let mut h = TestHarness::ready();
    let session = repeater_through_eks(&mut h, 1);

    let rx_info = RxInfo::new(1, 1, RxInfoFlags::empty());
    assert_eq!(
        h.vprime(&session, &DOWNSTREAM_IDS, rx_info, 0).unwrap_err(),
        HdcpError::RUNTIME_INVALID_DEVICE_COUNT
    );
    h.vprime(&session, &DOWNSTREAM_IDS[..1], rx_info, 0)
        .unwrap();
}

#[test]
fn test_vprime_mismatch_keeps_seq_num() {
    let mut h = TestHarness::ready();
    let session = repeater_through_eks(&mut h, 1);
    let before = h.snapshot();

    let (mut req, _) = session.vprime_req(&DOWNSTREAM_IDS, two_downstream(), 0);
    req.v_prime[3] ^= 0x40;
    assert_eq!(
        h.call(&req).unwrap_err(),
        HdcpError::RUNTIME_VERIFY_VPRIME_MISMATCH
    );
    assert_eq!(h.snapshot(), before);

    // The rejected round did not consume seq_num_V 0.
    h.vprime(&session, &DOWNSTREAM_IDS, two_downstream(), 0)
        .unwrap();
}

#[test]
fn test_legacy_downstream_enforces_type0() {
    for flag in [
        RxInfoFlags::HDCP1_DEVICE_DOWNSTREAM,
        RxInfoFlags::HDCP2_0_REPEATER_DOWNSTREAM,
    ] {
        let mut h = TestHarness::ready();
        let session = repeater_through_eks(&mut h, 1);

        let rx_info = RxInfo::new(1, DOWNSTREAM_IDS.len() as u8, flag);
        let resp = h.vprime(&session, &DOWNSTREAM_IDS, rx_info, 0).unwrap();
        assert_eq!(resp.flags, ValidateVprimeResp::FLAG_TYPE0_ENFORCED);

        h.call(&session.mprime_req(&[1], 1)).unwrap();
        let resp: ControlEncryptionResp = h.call(&enable_req(0, &[1], [0; 2])).unwrap();
        assert_eq!(resp.type0_enforced, 1);
        assert_eq!(h.hw().stream_types(0, 1), vec![0]);
        assert!(h.hw().is_encrypting(0));
    }
}

#[test]
fn test_mprime_checks() {
    let mut h = TestHarness::ready();
    let session = repeater_through_eks(&mut h, 2);
    h.vprime(&session, &DOWNSTREAM_IDS, two_downstream(), 0)
        .unwrap();
    let before = h.snapshot();

    assert_eq!(
        h.call(&session.mprime_req(&[0], 1)).unwrap_err(),
        HdcpError::RUNTIME_INVALID_STREAM_COUNT
    );
    assert_eq!(
        h.call(&session.mprime_req(&[0, 2], 1)).unwrap_err(),
        HdcpError::RUNTIME_INVALID_STREAM_TYPE
    );
    assert_eq!(
        h.call(&session.mprime_req(&[0, 1], 0)).unwrap_err(),
        HdcpError::RUNTIME_VERIFY_SEQ_NUM_M_REPLAY
    );

    let mut req = session.mprime_req(&[0, 1], 1);
    req.m_prime[31] ^= 1;
    assert_eq!(
        h.call(&req).unwrap_err(),
        HdcpError::RUNTIME_VERIFY_MPRIME_MISMATCH
    );
    assert_eq!(h.snapshot(), before);

    h.call(&session.mprime_req(&[0, 1], 1)).unwrap();
}

#[test]
fn test_enable_must_match_acknowledged_streams() {
    let mut h = TestHarness::ready();
    let session = repeater_through_eks(&mut h, 2);
    h.vprime(&session, &DOWNSTREAM_IDS, two_downstream(), 0)
        .unwrap();
    h.call(&session.mprime_req(&[0, 1], 1)).unwrap();

    assert_eq!(
        h.call(&enable_req(0, &[1, 1], [0; 2])).unwrap_err(),
        HdcpError::RUNTIME_INVALID_STREAM_TABLE_MISMATCH
    );
    assert!(!h.hw().is_encrypting(0));
    assert_eq!(h.marker(), Step::MprimeValidation);

    h.call(&enable_req(0, &[0, 1], [0; 2])).unwrap();
}
