// Licensed under the Apache-2.0 license

use hdcp_api::secure_action::{
    ControlEncryptionResp, EndSessionReq, GenerateEksReq, ValidateHprimeReq, ValidateLprimeReq,
};
use hdcp_api::{LinkIndex, RxInfo, RxInfoFlags};
use hdcp_drivers::SecretId;
use hdcp_error::{ErrorClass, HdcpError};
use hdcp_hw_model::InitParams;
use hdcp_runtime::step::Step;

use crate::common::{
    cert_rx, disable_req, enable_req, hmac_sha256, kd, TestHarness, TestReceiver, DOWNSTREAM_IDS,
};

#[test]
fn test_full_handshake_receiver() {
    let mut h = TestHarness::ready();
    let rx = TestReceiver::new();

    let session = h.authenticate(&rx, 0, 1).unwrap();
    assert!(!session.stored_km);
    assert!(session.pairing_required);
    assert!(!session.repeater);
    assert_eq!(h.marker(), Step::EksGen);
    assert_eq!(h.store().peek(SecretId::Kd), Some(&session.kd[..]));
    assert_eq!(h.hw().session_key(0, LinkIndex::Primary), Some(session.ks));
    assert_eq!(h.hw().riv(0, LinkIndex::Primary), Some(session.riv));
    assert!(!h.hw().is_encrypting(0));

    let resp: ControlEncryptionResp = h.call(&enable_req(0, &[0], [0; 2])).unwrap();
    assert_eq!(resp.type0_enforced, 0);
    assert!(h.hw().is_encrypting(0));
    assert_eq!(h.hw().stream_types(0, 1), vec![0]);
    assert_eq!(h.marker(), Step::ControlEncryption);

    h.call(&EndSessionReq {}).unwrap();
    assert_eq!(h.marker(), Step::EndSession);
    assert_eq!(h.store().peek(SecretId::Km), Some(&[0u8; 16][..]));
    assert_eq!(h.store().peek(SecretId::Kd), Some(&[0u8; 32][..]));
    // Non-repeater sessions are saved but never resumed.
    assert!(h.active_sessions().find(0).is_some());
    assert!(h.active_sessions().find_resumable(0).is_none());
    assert_eq!(h.start_session(0, 1).unwrap().flags, 0);
    assert!(h.active_sessions().find(0).is_none());
}

#[test]
fn test_steps_out_of_order_are_rejected() {
    let mut h = TestHarness::ready();
    let rx = TestReceiver::new();
    h.start_session(0, 1).unwrap();

    let out_of_order = [
        h.call(&ValidateLprimeReq::default()).map(|_| ()),
        h.call(&GenerateEksReq {}).map(|_| ()),
        h.call(&enable_req(0, &[0], [0; 2])).map(|_| ()),
    ];
    for result in out_of_order {
        assert_eq!(result, Err(HdcpError::RUNTIME_SEQUENCE_VIOLATION));
    }

    let start = h.start_session(0, 1);
    assert_eq!(start.unwrap_err(), HdcpError::RUNTIME_SEQUENCE_VIOLATION);
    h.call(&rx.verify_certificate_req()).unwrap();
    assert_eq!(
        h.call(&rx.verify_certificate_req()).unwrap_err(),
        HdcpError::RUNTIME_SEQUENCE_VIOLATION
    );
}

#[test]
fn test_hprime_mismatch_leaves_state_unchanged() {
    let mut h = TestHarness::ready();
    let rx = TestReceiver::new();
    let start = h.start_session(0, 1).unwrap();
    let cert = h.call(&rx.verify_certificate_req()).unwrap();
    assert_eq!(cert.stored_km, 0);
    let before = h.snapshot();

    let err = h
        .call(&ValidateHprimeReq {
            h_prime: [0x5a; 32],
        })
        .unwrap_err();
    assert_eq!(err, HdcpError::RUNTIME_VERIFY_HPRIME_MISMATCH);
    assert_eq!(err.class(), ErrorClass::VerificationFailure);
    assert_eq!(h.snapshot(), before);
    assert_eq!(h.marker(), Step::VerifyCertificate);

    // Only the first 16 bytes of H' take part in the comparison.
    let km: [u8; 16] = h.store().peek(SecretId::Km).unwrap().try_into().unwrap();
    let session_kd = kd(&km, &start.rtx, &rx.rrx);
    let mut h_prime = hmac_sha256(
        &session_kd,
        &[&start.rtx, &rx.rx_caps, &hdcp_api::TX_CAPS],
    );
    h_prime[16..].fill(0);
    let resp = h.call(&ValidateHprimeReq { h_prime }).unwrap();
    assert_eq!(resp.pairing_required, 1);
    assert_eq!(h.marker(), Step::HprimeValidation);
}

#[test]
fn test_lprime_mismatch_leaves_state_unchanged() {
    let mut h = TestHarness::ready();
    let rx = TestReceiver::new();
    let start = h.start_session(0, 1).unwrap();
    let cert = h.call(&rx.verify_certificate_req()).unwrap();
    let km: [u8; 16] = h.store().peek(SecretId::Km).unwrap().try_into().unwrap();
    assert_eq!(cert.stored_km, 0);

    let session_kd = kd(&km, &start.rtx, &rx.rrx);
    let h_prime = hmac_sha256(
        &session_kd,
        &[&start.rtx, &rx.rx_caps, &hdcp_api::TX_CAPS],
    );
    h.call(&ValidateHprimeReq { h_prime }).unwrap();
    let before = h.snapshot();

    assert_eq!(
        h.call(&ValidateLprimeReq {
            l_prime: [0; 32]
        })
        .unwrap_err(),
        HdcpError::RUNTIME_VERIFY_LPRIME_MISMATCH
    );
    assert_eq!(h.snapshot(), before);
    assert_eq!(h.marker(), Step::HprimeValidation);
}

#[test]
fn test_certificate_checks() {
    let mut h = TestHarness::ready();
    let rx = TestReceiver::new();
    h.start_session(0, 1).unwrap();
    let before = h.snapshot();

    // 19 one bits
    let mut bad_id = rx.verify_certificate_req();
    bad_id.cert_rx = cert_rx([0xff, 0xff, 0x07, 0x00, 0x00]);
    assert_eq!(
        h.call(&bad_id).unwrap_err(),
        HdcpError::RUNTIME_VERIFY_INVALID_RECEIVER_ID
    );

    let mut bad_sig = rx.verify_certificate_req();
    bad_sig.cert_rx[20] ^= 0x01;
    assert_eq!(
        h.call(&bad_sig).unwrap_err(),
        HdcpError::RUNTIME_VERIFY_CERT_SIGNATURE_FAILED
    );

    let mut bad_pad = rx.verify_certificate_req();
    bad_pad.cert_rx[140] = 0x01;
    assert_eq!(
        h.call(&bad_pad).unwrap_err(),
        HdcpError::RUNTIME_VERIFY_CERT_SIGNATURE_FAILED
    );

    assert_eq!(h.snapshot(), before);
    assert_eq!(h.marker(), Step::StartSession);
    h.call(&rx.verify_certificate_req()).unwrap();
}

#[test]
fn test_eks_depends_on_rrx() {
    let mut first = TestHarness::ready();
    let mut second = TestHarness::ready();
    let rx = TestReceiver::new();
    let other = TestReceiver {
        rrx: [0xe1, 0x7a, 0xb0, 0xfd, 0x0f, 0x54, 0x40, 0x52],
        ..TestReceiver::new()
    };

    let a = first.authenticate(&rx, 0, 1).unwrap();
    let b = second.authenticate(&other, 0, 1).unwrap();
    // Same seed, so the same ks and riv were generated on both sides.
    assert_eq!(a.ks, b.ks);
    assert_eq!(a.riv, b.riv);
    assert_ne!(a.edkey_ks, b.edkey_ks);
}

#[test]
fn test_key_programming_failure() {
    let mut h = TestHarness::ready();
    let rx = TestReceiver::new();
    let start = h.start_session(0, 1).unwrap();
    let cert = h.call(&rx.verify_certificate_req()).unwrap();
    assert_eq!(cert.stored_km, 0);
    let km: [u8; 16] = h.store().peek(SecretId::Km).unwrap().try_into().unwrap();
    let session_kd = kd(&km, &start.rtx, &rx.rrx);
    let h_prime = hmac_sha256(
        &session_kd,
        &[&start.rtx, &rx.rx_caps, &hdcp_api::TX_CAPS],
    );
    h.call(&ValidateHprimeReq { h_prime }).unwrap();
    let mut key = session_kd;
    for (k, r) in key[24..].iter_mut().zip(rx.rrx) {
        *k ^= r;
    }
    let l_prime = hmac_sha256(&key, &[&start.rn]);
    h.call(&ValidateLprimeReq { l_prime }).unwrap();

    h.hw().set_fail_key_load(true);
    assert_eq!(
        h.call(&GenerateEksReq {}).unwrap_err(),
        HdcpError::DRIVER_HW_KEY_PROGRAMMING_FAILED
    );
    assert_eq!(h.marker(), Step::LprimeValidation);

    h.hw().set_fail_key_load(false);
    h.call(&GenerateEksReq {}).unwrap();
    assert_eq!(h.marker(), Step::EksGen);
}

#[test]
fn test_vprime_on_receiver_is_wrong_type() {
    let mut h = TestHarness::ready();
    let session = h.authenticate(&TestReceiver::new(), 0, 1).unwrap();
    let err = h
        .vprime(&session, &DOWNSTREAM_IDS, RxInfo::new(1, 2, RxInfoFlags::empty()), 0)
        .unwrap_err();
    assert_eq!(err, HdcpError::RUNTIME_SEQUENCE_WRONG_RECEIVER_TYPE);
    assert_eq!(err.class(), ErrorClass::SequenceViolation);
}

#[test]
fn test_control_encryption_checks() {
    let mut h = TestHarness::ready_with(InitParams::default());
    h.authenticate(&TestReceiver::new(), 0, 2).unwrap();
    let before = h.snapshot();

    assert_eq!(
        h.call(&enable_req(1, &[0, 0], [0; 2])).unwrap_err(),
        HdcpError::RUNTIME_INVALID_OUTPUT_MISMATCH
    );
    assert_eq!(
        h.call(&enable_req(8, &[0, 0], [0; 2])).unwrap_err(),
        HdcpError::RUNTIME_INVALID_OUTPUT_INDEX
    );
    assert_eq!(
        h.call(&enable_req(0, &[0], [0; 2])).unwrap_err(),
        HdcpError::RUNTIME_INVALID_STREAM_COUNT
    );
    assert_eq!(
        h.call(&enable_req(0, &[0, 2], [0; 2])).unwrap_err(),
        HdcpError::RUNTIME_INVALID_STREAM_TYPE
    );
    let mut bogus = enable_req(0, &[0, 0], [0; 2]);
    bogus.enable = 2;
    assert_eq!(
        h.call(&bogus).unwrap_err(),
        HdcpError::RUNTIME_INVALID_ENCRYPTION_REQUEST
    );
    assert_eq!(h.snapshot(), before);
    assert!(!h.hw().is_encrypting(0));

    let resp = h.call(&enable_req(0, &[1, 0], [0; 2])).unwrap();
    assert_eq!(resp.type0_enforced, 0);
    assert_eq!(h.hw().stream_types(0, 2), vec![1, 0]);
}

#[test]
fn test_disable_encryption_in_any_state() {
    let mut h = TestHarness::ready();
    h.authenticate(&TestReceiver::new(), 2, 1).unwrap();
    h.call(&enable_req(2, &[0], [0; 2])).unwrap();
    assert!(h.hw().is_encrypting(2));

    let marker = h.marker();
    h.call(&disable_req(2)).unwrap();
    assert!(!h.hw().is_encrypting(2));
    assert_eq!(h.marker(), marker);

    assert_eq!(
        h.call(&disable_req(8)).unwrap_err(),
        HdcpError::RUNTIME_INVALID_OUTPUT_INDEX
    );
    // Nothing was ever enabled on output 5.
    h.call(&disable_req(5)).unwrap();
}
