/*++

Licensed under the Apache-2.0 license.

File Name:

    crypto.rs

Abstract:

    HDCP 2.2 key derivation and the H, L, V and M message authentication
    values.

--*/

use crate::secrets::{Kd, Km, Rn, Rrx, Rtx};
use hdcp_api::{DKEY_SIZE, KD_SIZE, KS_SIZE, RN_SIZE, RRX_SIZE, RX_CAPS_SIZE, TX_CAPS_SIZE};
use hdcp_drivers::{Aes128, Hmac256, HmacTag, HdcpResult, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// One 128-bit derived key block.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Dkey(pub [u8; DKEY_SIZE]);

/// Session key `ks`. Never stored; only programmed into the cipher.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SessionKey(pub [u8; KS_SIZE]);

/// XOR `src` into the trailing bytes of `dst`.
fn xor_tail(dst: &mut [u8], src: &[u8]) {
    let start = dst.len() - src.len();
    for (d, s) in dst[start..].iter_mut().zip(src) {
        *d ^= s;
    }
}

/// `dkey_i = AES128_{km ^ rn}(rtx || (rrx ^ i))`, with `rn` XORed into the
/// low 64 bits of `km` and `i` into the low 64 bits of `rrx`.
pub fn derive_dkey(km: &Km, rn: &[u8; RN_SIZE], rtx: &Rtx, rrx: &Rrx, i: u64) -> Dkey {
    let mut key = Zeroizing::new(km.0);
    xor_tail(&mut key[..], rn);

    let mut block = [0u8; DKEY_SIZE];
    block[..8].copy_from_slice(&rtx.0);
    block[8..].copy_from_slice(&rrx.0);
    xor_tail(&mut block, &i.to_be_bytes());

    Aes128::encrypt_block(&key, &mut block);
    Dkey(block)
}

/// `kd = dkey0 || dkey1`, both derived with `rn = 0`.
pub fn derive_kd(km: &Km, rtx: &Rtx, rrx: &Rrx) -> Kd {
    let zero_rn = [0u8; RN_SIZE];
    let dkey0 = derive_dkey(km, &zero_rn, rtx, rrx, 0);
    let dkey1 = derive_dkey(km, &zero_rn, rtx, rrx, 1);
    let mut kd = Kd([0; KD_SIZE]);
    kd.0[..DKEY_SIZE].copy_from_slice(&dkey0.0);
    kd.0[DKEY_SIZE..].copy_from_slice(&dkey1.0);
    kd
}

/// `H = HMAC-SHA256(rtx || RxCaps || TxCaps, kd)`
pub fn compute_h(
    kd: &Kd,
    rtx: &Rtx,
    rx_caps: &[u8; RX_CAPS_SIZE],
    tx_caps: &[u8; TX_CAPS_SIZE],
) -> HdcpResult<HmacTag> {
    Hmac256::mac(&kd.0, &[&rtx.0, rx_caps, tx_caps])
}

/// `L = HMAC-SHA256(rn, kd ^ rrx)`, `rrx` XORed into the low 64 bits of `kd`.
pub fn compute_l(kd: &Kd, rrx: &Rrx, rn: &Rn) -> HdcpResult<HmacTag> {
    let mut key = Zeroizing::new(kd.0);
    xor_tail(&mut key[..], &rrx.0);
    Hmac256::mac(&key[..], &[&rn.0])
}

/// `Edkey(ks) = ks ^ (dkey2 ^ rrx)`, `rrx` XORed into the low 64 bits of `dkey2`.
pub fn encrypt_session_key(
    km: &Km,
    rtx: &Rtx,
    rrx: &Rrx,
    rn: &Rn,
    ks: &SessionKey,
) -> [u8; KS_SIZE] {
    let mut dkey2 = derive_dkey(km, &rn.0, rtx, rrx, 2);
    xor_tail(&mut dkey2.0, &rrx.0[..RRX_SIZE]);
    let mut eks = [0u8; KS_SIZE];
    for (e, (k, d)) in eks.iter_mut().zip(ks.0.iter().zip(dkey2.0.iter())) {
        *e = k ^ d;
    }
    eks
}

/// `V = HMAC-SHA256(ReceiverID_list || RxInfo || seq_num_V, kd)`
pub fn compute_v(
    kd: &Kd,
    receiver_ids: &[u8],
    rx_info: &[u8],
    seq_num_v: &[u8],
) -> HdcpResult<HmacTag> {
    Hmac256::mac(&kd.0, &[receiver_ids, rx_info, seq_num_v])
}

/// `M = HMAC-SHA256(StreamID_Type || seq_num_M, SHA256(kd))`
pub fn compute_m(kd: &Kd, stream_id_types: &[u8], seq_num_m: &[u8]) -> HdcpResult<HmacTag> {
    let key = Zeroizing::new(Sha256::digest(&kd.0));
    Hmac256::mac(&key[..], &[stream_id_types, seq_num_m])
}
