//! Key derivation and P2PKH signing
//!
//! Everything here works on key material borrowed from an open
//! [`SecretScope`](crate::secrets::SecretScope). Nothing is stored.

use bitcoin::blockdata::script::{Builder, PushBytesBuf};
use bitcoin::hashes::Hash;
use bitcoin::secp256k1::{Message, Secp256k1};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::{Address, Network, PrivateKey, PublicKey, Transaction};

use crate::creator::IssuanceTransaction;
use crate::error::{IssuerError, Result};

/// Key and address derived from a WIF for one network
pub struct DerivedKey {
    pub private_key: PrivateKey,
    pub public_key: PublicKey,
    pub address: Address,
}

impl DerivedKey {
    pub fn from_wif(wif: &str, network: Network) -> Result<Self> {
        let secp = Secp256k1::new();
        let private_key =
            PrivateKey::from_wif(wif).map_err(|e| IssuerError::Key(format!("Invalid WIF: {}", e)))?;
        let public_key = private_key.public_key(&secp);
        let address = Address::p2pkh(public_key.pubkey_hash(), network);

        Ok(Self {
            private_key,
            public_key,
            address,
        })
    }

    /// Fail with `Config` unless this key controls `issuing_address`
    pub fn ensure_controls(&self, issuing_address: &str) -> Result<()> {
        let derived = self.address.to_string();
        if derived != issuing_address {
            let err = IssuerError::Config {
                derived,
                issuing: issuing_address.to_string(),
            };
            log::error!("{}", err);
            return Err(err);
        }
        Ok(())
    }
}

/// Address a WIF derives to on `network`
pub fn derive_address(wif: &str, network: Network) -> Result<Address> {
    Ok(DerivedKey::from_wif(wif, network)?.address)
}

/// Sign every input as P2PKH spending from the key's address
pub fn sign_transaction(unsigned: IssuanceTransaction, key: &DerivedKey) -> Result<Transaction> {
    let secp = Secp256k1::new();
    let script_pubkey = key.address.script_pubkey();
    let mut tx = unsigned.tx;

    let mut script_sigs = Vec::with_capacity(tx.input.len());
    {
        let cache = SighashCache::new(&tx);
        for input_index in 0..tx.input.len() {
            let sighash = cache
                .legacy_signature_hash(input_index, &script_pubkey, EcdsaSighashType::All.to_u32())
                .map_err(|e| IssuerError::Transaction(e.to_string()))?;

            let message = Message::from_digest(sighash.to_byte_array());
            let signature = bitcoin::ecdsa::Signature::sighash_all(
                secp.sign_ecdsa(&message, &key.private_key.inner),
            );

            let sig_bytes = PushBytesBuf::try_from(signature.to_vec())
                .map_err(|e| IssuerError::Transaction(e.to_string()))?;

            script_sigs.push(
                Builder::new()
                    .push_slice(sig_bytes)
                    .push_key(&key.public_key)
                    .into_script(),
            );
        }
    }

    for (input, script_sig) in tx.input.iter_mut().zip(script_sigs) {
        input.script_sig = script_sig;
    }

    Ok(tx)
}
