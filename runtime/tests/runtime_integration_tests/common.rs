// Licensed under the Apache-2.0 license

use hdcp_api::secure_action::{
    ControlEncryptionReq, ControlEncryptionResp, EndSessionReq, GenerateEksReq, GenerateEksResp,
    PairingInfoReq, Request, StartSessionReq, StartSessionResp, ValidateHprimeReq,
    ValidateHprimeResp, ValidateLprimeReq, ValidateMprimeReq, ValidateVprimeReq,
    ValidateVprimeResp, VerifyCertificateReq, VerifyCertificateResp, MAX_RESP_SIZE,
};
use hdcp_api::{
    seq_num_to_be, RxInfo, RxInfoFlags, CERT_RX_SIZE, CERT_SIGNED_SIZE, KD_SIZE, KM_SIZE, KS_SIZE,
    MAX_STREAMS, RECEIVER_ID_LIST_SIZE, RECEIVER_ID_SIZE, RIV_SIZE, RN_SIZE, RRX_SIZE, RTX_SIZE,
    RX_CAPS_SIZE, STREAM_ID_TYPE_SIZE, TX_CAPS, V_PRIME_SIZE,
};
use hdcp_drivers::SecretId;
use hdcp_error::HdcpResult;
use hdcp_hw_model::{new_models, InitParams, ModelDisplayEngine, ModelSecretStore, ModelTrng};
use hdcp_runtime::secrets::ActiveSessionTable;
use hdcp_runtime::step::Step;
use hdcp_runtime::{handle_secure_action, Drivers, HdcpConfig};
use lazy_static::lazy_static;
use rand::{rngs::StdRng, SeedableRng};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, Pkcs1v15Sign, RsaPrivateKey};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use zerocopy::{FromBytes, IntoBytes};

pub type TestDrivers = Drivers<ModelSecretStore, ModelDisplayEngine, ModelTrng>;

lazy_static! {
    /// Stand-in for the DCP LLC root key that signs receiver certificates.
    pub static ref DCP_KEY: RsaPrivateKey =
        RsaPrivateKey::new(&mut StdRng::seed_from_u64(0x0dc9), 1024).unwrap();
    pub static ref RX_KEY: RsaPrivateKey =
        RsaPrivateKey::new(&mut StdRng::seed_from_u64(0x5258), 1024).unwrap();
}

pub const RECEIVER_ID: [u8; RECEIVER_ID_SIZE] = [0xff, 0xff, 0x0f, 0x00, 0x00];
pub const OTHER_RECEIVER_ID: [u8; RECEIVER_ID_SIZE] = [0x0f, 0x0f, 0x0f, 0x0f, 0x0f];
pub const RX_CAPS: [u8; RX_CAPS_SIZE] = [0x02, 0x00, 0x00];
pub const REPEATER_RX_CAPS: [u8; RX_CAPS_SIZE] = [0x02, 0x00, 0x01];

/// Downstream receiver IDs reported by the test repeater.
pub const DOWNSTREAM_IDS: [[u8; RECEIVER_ID_SIZE]; 2] =
    [[0x33, 0x33, 0x33, 0x33, 0x33], [0xf0, 0xf0, 0xf0, 0xf0, 0xf0]];

pub fn hmac_sha256(key: &[u8], parts: &[&[u8]]) -> [u8; 32] {
    use hmac::{Hmac, Mac};
    let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(key).unwrap();
    for part in parts {
        mac.update(part);
    }
    mac.finalize().into_bytes().into()
}

fn aes128_encrypt(key: &[u8; 16], block: [u8; 16]) -> [u8; 16] {
    use aes::cipher::{BlockEncrypt, KeyInit};
    let cipher = <aes::Aes128 as KeyInit>::new(&(*key).into());
    let mut block = aes::Block::from(block);
    cipher.encrypt_block(&mut block);
    block.into()
}

fn xor_tail(dst: &mut [u8], src: &[u8]) {
    let start = dst.len() - src.len();
    for (d, s) in dst[start..].iter_mut().zip(src) {
        *d ^= s;
    }
}

/// Reference `dkey_i` derivation.
pub fn dkey(
    km: &[u8; KM_SIZE],
    rn: &[u8; RN_SIZE],
    rtx: &[u8; RTX_SIZE],
    rrx: &[u8; RRX_SIZE],
    i: u64,
) -> [u8; 16] {
    let mut key = *km;
    xor_tail(&mut key, rn);
    let mut block = [0u8; 16];
    block[..8].copy_from_slice(rtx);
    block[8..].copy_from_slice(rrx);
    xor_tail(&mut block, &i.to_be_bytes());
    aes128_encrypt(&key, block)
}

pub fn kd(km: &[u8; KM_SIZE], rtx: &[u8; RTX_SIZE], rrx: &[u8; RRX_SIZE]) -> [u8; KD_SIZE] {
    let mut kd = [0u8; KD_SIZE];
    kd[..16].copy_from_slice(&dkey(km, &[0; RN_SIZE], rtx, rrx, 0));
    kd[16..].copy_from_slice(&dkey(km, &[0; RN_SIZE], rtx, rrx, 1));
    kd
}

/// Receiver certificate signed with `DCP_KEY`.
pub fn cert_rx(receiver_id: [u8; RECEIVER_ID_SIZE]) -> [u8; CERT_RX_SIZE] {
    let n = RX_KEY.n().to_bytes_be();
    let e = RX_KEY.e().to_bytes_be();
    assert_eq!(n.len(), 128);

    let mut cert = [0u8; CERT_RX_SIZE];
    cert[..5].copy_from_slice(&receiver_id);
    cert[5..133].copy_from_slice(&n);
    cert[136 - e.len()..136].copy_from_slice(&e);

    let digest = Sha256::digest(&cert[..CERT_SIGNED_SIZE]);
    let sig = DCP_KEY
        .sign(Pkcs1v15Sign::new::<Sha256>(), &digest)
        .unwrap();
    cert[CERT_RX_SIZE - sig.len()..].copy_from_slice(&sig);
    cert
}

/// A receiver or repeater on the other end of the link.
#[derive(Clone)]
pub struct TestReceiver {
    pub receiver_id: [u8; RECEIVER_ID_SIZE],
    pub rx_caps: [u8; RX_CAPS_SIZE],
    pub rrx: [u8; RRX_SIZE],
    /// Send AKE_Send_Pairing_Info when asked to.
    pub pair: bool,
    /// `km` and `Ekh(km)` this receiver remembers from an earlier pairing.
    pub paired: Option<([u8; KM_SIZE], [u8; 16])>,
}

impl TestReceiver {
    pub fn new() -> Self {
        Self {
            receiver_id: RECEIVER_ID,
            rx_caps: RX_CAPS,
            rrx: [0x3b, 0x5b, 0xf0, 0xbf, 0x2e, 0x0e, 0x7d, 0x3a],
            pair: false,
            paired: None,
        }
    }

    pub fn repeater() -> Self {
        Self {
            rx_caps: REPEATER_RX_CAPS,
            ..Self::new()
        }
    }

    pub fn verify_certificate_req(&self) -> VerifyCertificateReq {
        VerifyCertificateReq {
            cert_rx: cert_rx(self.receiver_id),
            rx_caps: self.rx_caps,
            reserved: [0; 3],
            rrx: self.rrx,
        }
    }
}

/// Everything both ends know after a completed AKE/LC/SKE exchange.
pub struct AuthSession {
    pub output: u32,
    pub rtx: [u8; RTX_SIZE],
    pub rrx: [u8; RRX_SIZE],
    pub rn: [u8; RN_SIZE],
    pub km: [u8; KM_SIZE],
    pub kd: [u8; KD_SIZE],
    pub ekh_km: [u8; 16],
    /// `m` returned with AKE_Stored_km.
    pub m: [u8; 16],
    pub ks: [u8; KS_SIZE],
    pub riv: [u8; RIV_SIZE],
    pub edkey_ks: [u8; KS_SIZE],
    pub stored_km: bool,
    pub pairing_required: bool,
    pub repeater: bool,
}

impl AuthSession {
    pub fn h_prime(&self, rx_caps: &[u8; RX_CAPS_SIZE]) -> [u8; 32] {
        hmac_sha256(&self.kd, &[&self.rtx, rx_caps, &TX_CAPS])
    }

    pub fn l_prime(&self) -> [u8; 32] {
        let mut key = self.kd;
        xor_tail(&mut key, &self.rrx);
        hmac_sha256(&key, &[&self.rn])
    }

    /// V' request for `ids`, plus the full V the core is expected to compute.
    pub fn vprime_req(
        &self,
        ids: &[[u8; RECEIVER_ID_SIZE]],
        rx_info: RxInfo,
        seq_num_v: u32,
    ) -> (ValidateVprimeReq, [u8; 32]) {
        let mut list = [0u8; RECEIVER_ID_LIST_SIZE];
        for (chunk, id) in list.chunks_exact_mut(RECEIVER_ID_SIZE).zip(ids) {
            chunk.copy_from_slice(id);
        }
        let seq = seq_num_to_be(seq_num_v);
        let rx_info = rx_info.to_be_bytes();
        let v = hmac_sha256(
            &self.kd,
            &[&list[..ids.len() * RECEIVER_ID_SIZE], &rx_info, &seq],
        );
        let mut v_prime = [0u8; V_PRIME_SIZE];
        v_prime.copy_from_slice(&v[..V_PRIME_SIZE]);
        (
            ValidateVprimeReq {
                rx_info,
                seq_num_v: seq,
                reserved: [0; 3],
                v_prime,
                receiver_id_list: list,
            },
            v,
        )
    }

    /// M' request for `types` (stream `i` gets stream ID `i`), with
    /// `seq_num_m` the counter value after Stream_Manage was sent.
    pub fn mprime_req(&self, types: &[u8], seq_num_m: u32) -> ValidateMprimeReq {
        let mut table = [0u8; MAX_STREAMS * STREAM_ID_TYPE_SIZE];
        for (i, (entry, ty)) in table
            .chunks_exact_mut(STREAM_ID_TYPE_SIZE)
            .zip(types)
            .enumerate()
        {
            entry[0] = i as u8;
            entry[1] = *ty;
        }
        let key = Sha256::digest(self.kd);
        let m_prime = hmac_sha256(
            &key,
            &[
                &table[..types.len() * STREAM_ID_TYPE_SIZE],
                &seq_num_to_be(seq_num_m.wrapping_sub(1)),
            ],
        );
        ValidateMprimeReq {
            seq_num_m: seq_num_to_be(seq_num_m),
            reserved: 0,
            stream_count: types.len() as u32,
            stream_id_types: table,
            m_prime,
        }
    }
}

pub fn enable_req(output: u32, types: &[u8], dp_type_mask: [u32; 2]) -> ControlEncryptionReq {
    let mut stream_types = [0u8; MAX_STREAMS];
    stream_types[..types.len()].copy_from_slice(types);
    ControlEncryptionReq {
        output_index: output,
        enable: ControlEncryptionReq::ENABLE,
        stream_count: types.len() as u32,
        stream_types,
        dp_type_mask,
    }
}

pub fn disable_req(output: u32) -> ControlEncryptionReq {
    ControlEncryptionReq {
        output_index: output,
        enable: ControlEncryptionReq::DISABLE,
        ..Default::default()
    }
}

pub struct TestHarness {
    pub drivers: TestDrivers,
}

impl TestHarness {
    /// Core on a store that has never been written.
    pub fn new(params: InitParams) -> Self {
        let (store, hw, trng) = new_models(params);
        let config = HdcpConfig::new(&DCP_KEY.n().to_bytes_be(), &DCP_KEY.e().to_bytes_be());
        Self {
            drivers: Drivers::new(store, hw, trng, config),
        }
    }

    /// Core whose store was initialised by an End-Session.
    pub fn ready_with(params: InitParams) -> Self {
        let mut harness = Self::new(params);
        harness.call(&EndSessionReq {}).unwrap();
        harness
    }

    pub fn ready() -> Self {
        Self::ready_with(InitParams::default())
    }

    pub fn call<R: Request>(&mut self, req: &R) -> HdcpResult<R::Resp> {
        let mut resp = [0u32; MAX_RESP_SIZE / 4];
        let len = handle_secure_action(
            &mut self.drivers,
            R::ID,
            req.as_bytes(),
            resp.as_mut_bytes(),
        )?;
        assert_eq!(len, core::mem::size_of::<R::Resp>());
        Ok(R::Resp::read_from_prefix(resp.as_bytes()).unwrap().0)
    }

    pub fn store(&self) -> &ModelSecretStore {
        self.drivers.vault.store()
    }

    pub fn store_mut(&mut self) -> &mut ModelSecretStore {
        self.drivers.vault.store_mut()
    }

    pub fn hw(&mut self) -> &mut ModelDisplayEngine {
        &mut self.drivers.hw
    }

    pub fn snapshot(&self) -> BTreeMap<SecretId, Vec<u8>> {
        self.store().snapshot()
    }

    pub fn marker(&self) -> Step {
        let bytes = self.store().peek(SecretId::StepMarker).unwrap();
        Step::from_u32(u32::from_le_bytes(bytes.try_into().unwrap())).unwrap()
    }

    pub fn active_sessions(&self) -> ActiveSessionTable {
        let bytes = self.store().peek(SecretId::ActiveSessions).unwrap();
        ActiveSessionTable::read_from_bytes(bytes).unwrap()
    }

    pub fn start_session(
        &mut self,
        output: u32,
        stream_count: u32,
    ) -> HdcpResult<StartSessionResp> {
        self.call(&StartSessionReq {
            output_index: output,
            link_index: 0,
            stream_count,
            flags: 0,
        })
    }

    /// Run VerifyCertificate through Eks generation for `rx`.
    pub fn authenticate_from_start(
        &mut self,
        rx: &TestReceiver,
        output: u32,
        start: &StartSessionResp,
    ) -> HdcpResult<AuthSession> {
        let cert: VerifyCertificateResp = self.call(&rx.verify_certificate_req())?;
        let stored_km = cert.stored_km != 0;
        let (km, ekh_km) = if stored_km {
            let (km, ekh_km) = rx.paired.unwrap();
            assert_eq!(cert.ekh_km, ekh_km);
            (km, ekh_km)
        } else {
            let km: [u8; KM_SIZE] = RX_KEY
                .decrypt(Oaep::new::<Sha256>(), &cert.ekpub_km)
                .unwrap()
                .try_into()
                .unwrap();
            let mut ekh_km = km;
            ekh_km.iter_mut().for_each(|b| *b ^= 0xa5);
            (km, ekh_km)
        };

        let mut session = AuthSession {
            output,
            rtx: start.rtx,
            rrx: rx.rrx,
            rn: start.rn,
            km,
            kd: kd(&km, &start.rtx, &rx.rrx),
            ekh_km,
            m: cert.m,
            ks: [0; KS_SIZE],
            riv: [0; RIV_SIZE],
            edkey_ks: [0; KS_SIZE],
            stored_km,
            pairing_required: false,
            repeater: false,
        };

        let h: ValidateHprimeResp = self.call(&ValidateHprimeReq {
            h_prime: session.h_prime(&rx.rx_caps),
        })?;
        session.pairing_required = h.pairing_required != 0;
        if session.pairing_required && rx.pair {
            self.call(&PairingInfoReq { ekh_km })?;
        }

        self.call(&ValidateLprimeReq {
            l_prime: session.l_prime(),
        })?;

        let eks: GenerateEksResp = self.call(&GenerateEksReq {})?;
        let mut dkey2 = dkey(&km, &session.rn, &session.rtx, &session.rrx, 2);
        xor_tail(&mut dkey2, &session.rrx);
        for ((ks, e), d) in session.ks.iter_mut().zip(eks.edkey_ks).zip(dkey2) {
            *ks = e ^ d;
        }
        session.riv = eks.riv;
        session.edkey_ks = eks.edkey_ks;
        session.repeater = eks.repeater != 0;
        Ok(session)
    }

    /// StartSession on link 0 of `output`, then authenticate `rx`.
    pub fn authenticate(
        &mut self,
        rx: &TestReceiver,
        output: u32,
        stream_count: u32,
    ) -> HdcpResult<AuthSession> {
        let start = self.start_session(output, stream_count)?;
        self.authenticate_from_start(rx, output, &start)
    }

    /// Full repeater authentication through M' for `types`, with
    /// encryption enabled.
    pub fn authenticate_repeater(&mut self, types: &[u8]) -> AuthSession {
        let session = self
            .authenticate(&TestReceiver::repeater(), 0, types.len() as u32)
            .unwrap();
        assert!(session.repeater);
        let rx_info = RxInfo::new(1, DOWNSTREAM_IDS.len() as u8, RxInfoFlags::empty());
        let (vreq, _) = session.vprime_req(&DOWNSTREAM_IDS, rx_info, 0);
        self.call(&vreq).unwrap();
        self.call(&session.mprime_req(types, 1)).unwrap();
        let resp: ControlEncryptionResp = self.call(&enable_req(0, types, [0; 2])).unwrap();
        assert_eq!(resp.type0_enforced, 0);
        session
    }

    pub fn vprime(
        &mut self,
        session: &AuthSession,
        ids: &[[u8; RECEIVER_ID_SIZE]],
        rx_info: RxInfo,
        seq_num_v: u32,
    ) -> HdcpResult<ValidateVprimeResp> {
        let (req, _) = session.vprime_req(ids, rx_info, seq_num_v);
        self.call(&req)
    }
}
