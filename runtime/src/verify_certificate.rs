/*++

Licensed under the Apache-2.0 license.

File Name:

    verify_certificate.rs

Abstract:

    AKE_Send_Cert handling: checks the receiver certificate against the
    DCP LLC key and produces either AKE_No_Stored_km (Ekpub(km)) or, for a
    paired receiver, AKE_Stored_km (Ekh(km) and m).

--*/

use crate::secrets::{
    Km, PairingCache, ReceiverIdRecord, Rrx, RxCapsRecord, SessionFlags, SessionFlagsRecord,
};
use crate::step::{require_step, Step};
use crate::{mutrefbytes, Drivers};
use hdcp_api::secure_action::{CertRx, VerifyCertificateReq, VerifyCertificateResp};
use hdcp_api::{CERT_SIGNED_SIZE, KM_SIZE, RECEIVER_ID_SIZE, RX_CAPS_REPEATER};
use hdcp_drivers::{
    cprintln, rsa, HdcpHw, IntegrityMode, RsaPublicKey, RsaVerifyResult, SecretStore, Sha256,
    Trng, SHA256_DIGEST_SIZE,
};
use hdcp_error::{HdcpError, HdcpResult};
use zerocopy::{FromBytes, IntoBytes};
use zeroize::Zeroizing;

/// Number of one bits a valid receiver ID carries.
const RECEIVER_ID_ONES: u32 = 20;

fn receiver_id_valid(receiver_id: &[u8; RECEIVER_ID_SIZE]) -> bool {
    receiver_id.iter().map(|b| b.count_ones()).sum::<u32>() == RECEIVER_ID_ONES
}

pub struct VerifyCertificateCmd;
impl VerifyCertificateCmd {
    #[inline(never)]
    pub(crate) fn execute<S: SecretStore, H: HdcpHw, T: Trng>(
        drivers: &mut Drivers<S, H, T>,
        cmd_args: &[u8],
        resp: &mut [u8],
    ) -> HdcpResult<usize> {
        let cmd = VerifyCertificateReq::ref_from_bytes(cmd_args)
            .map_err(|_| HdcpError::RUNTIME_INVALID_ARGS_SIZE)?;
        require_step(drivers, &[Step::StartSession])?;

        let cert = CertRx::ref_from_bytes(&cmd.cert_rx)
            .map_err(|_| HdcpError::RUNTIME_INVALID_ARGS_SIZE)?;
        if !receiver_id_valid(&cert.receiver_id) {
            cprintln!("[hdcp] Receiver ID does not have 20 ones");
            return Err(HdcpError::RUNTIME_VERIFY_INVALID_RECEIVER_ID);
        }

        let digest = Sha256::digest(&cert.as_bytes()[..CERT_SIGNED_SIZE]);
        let result =
            rsa::pkcs1v15_sha256_verify(&drivers.config.dcp_key(), &digest, &cert.dcp_signature)?;
        if result != RsaVerifyResult::Success {
            cprintln!("[hdcp] Receiver certificate signature verification failed");
            return Err(HdcpError::RUNTIME_VERIFY_CERT_SIGNATURE_FAILED);
        }

        let mut flags = drivers.vault.read::<SessionFlagsRecord>()?.flags();
        flags.set(
            SessionFlags::REPEATER,
            cmd.rx_caps[2] & RX_CAPS_REPEATER != 0,
        );

        let resp = mutrefbytes::<VerifyCertificateResp>(resp)?;
        resp.stored_km = 0;
        resp.ekpub_km = [0; hdcp_api::EKPUB_KM_SIZE];
        resp.ekh_km = [0; hdcp_api::EKH_KM_SIZE];
        resp.m = [0; hdcp_api::PAIRING_M_SIZE];

        let cache = drivers.vault.read::<PairingCache>()?;
        let km = match cache.find(&cert.receiver_id) {
            Some(entry) => {
                flags |= SessionFlags::STORED_KM;
                resp.stored_km = 1;
                resp.ekh_km = entry.ekh_km;
                resp.m = entry.m;
                Km(entry.km)
            }
            None => {
                flags.remove(SessionFlags::STORED_KM);
                let km = Km(drivers.trng.generate_array::<KM_SIZE>()?);
                let seed = Zeroizing::new(drivers.trng.generate_array::<SHA256_DIGEST_SIZE>()?);
                let kpub_rx = RsaPublicKey {
                    modulus: &cert.kpub_rx_n,
                    exponent: &cert.kpub_rx_e,
                };
                rsa::oaep_sha256_encrypt(&kpub_rx, &km.0, &seed, &mut resp.ekpub_km).map_err(
                    |err| match err {
                        HdcpError::DRIVER_RSA_INVALID_KEY
                        | HdcpError::DRIVER_RSA_INVALID_OUTPUT_SIZE => {
                            HdcpError::RUNTIME_INVALID_RECEIVER_KEY
                        }
                        err => err,
                    },
                )?;
                km
            }
        };

        let mut txn = drivers.vault.txn();
        txn.stage(&ReceiverIdRecord {
            id: cert.receiver_id,
            reserved: [0; 3],
        })?;
        txn.stage(&Rrx(cmd.rrx))?;
        txn.stage(&RxCapsRecord {
            caps: cmd.rx_caps,
            reserved: 0,
        })?;
        txn.stage(&km)?;
        txn.stage(&SessionFlagsRecord::new(flags))?;
        Step::VerifyCertificate.stage(&mut txn)?;
        drivers.vault.commit(txn, IntegrityMode::Verify)?;

        Ok(core::mem::size_of::<VerifyCertificateResp>())
    }
}
