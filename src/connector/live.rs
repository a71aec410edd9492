//! Live connector: local key derivation and signing, remote relay

use bitcoin::consensus::encode::serialize_hex;
use bitcoin::{Address, Network, Transaction};

use super::{BroadcastRequest, ServiceProviderConnector};
use crate::chain::Chain;
use crate::config::IssuerConfig;
use crate::creator::build_op_return_script;
use crate::error::{IssuerError, Result};
use crate::provider::{EsploraClient, ProviderBackend};
use crate::secrets::{SecretManager, SecretScope};
use crate::signer::{sign_transaction, DerivedKey};

pub struct BitcoinServiceProviderConnector<B> {
    chain: Chain,
    backend: B,
}

impl<B: ProviderBackend> BitcoinServiceProviderConnector<B> {
    pub fn new(chain: Chain, backend: B) -> Self {
        Self { chain, backend }
    }

    pub fn network(&self) -> Network {
        self.chain.network()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Derive the issuing key and confirm it controls `issuing_address`.
    /// The scope closes before this returns.
    fn verified_address(
        &self,
        issuing_address: &str,
        secrets: &mut dyn SecretManager,
    ) -> Result<Address> {
        let scope = SecretScope::acquire(secrets)?;
        let key = DerivedKey::from_wif(scope.wif()?, self.network())?;
        key.ensure_controls(issuing_address)?;
        Ok(key.address)
    }

    /// Fetch spendables with no secret open, then reopen the scope only to
    /// build and sign.
    fn signed_transaction(
        &self,
        request: &BroadcastRequest<'_>,
        secrets: &mut dyn SecretManager,
    ) -> Result<Transaction> {
        let address = self.verified_address(request.issuing_address, secrets)?;

        let spendables = self.backend.spendables_for_address(&address)?;
        if spendables.is_empty() {
            return Err(IssuerError::InsufficientFunds {
                shortfall: request
                    .transaction_creator
                    .estimate_cost_for_certificate_batch(request.tx_cost_constants),
                address: request.issuing_address.to_string(),
            });
        }

        let unsigned = request.transaction_creator.create_transaction(
            request.tx_cost_constants,
            &address,
            &spendables,
            request.payload,
        )?;
        log::debug!(
            "Signing {} inputs, fee {} sats",
            unsigned.inputs.len(),
            unsigned.fee
        );

        let scope = SecretScope::acquire(secrets)?;
        let key = DerivedKey::from_wif(scope.wif()?, self.network())?;
        key.ensure_controls(request.issuing_address)?;
        sign_transaction(unsigned, &key)
    }
}

impl BitcoinServiceProviderConnector<EsploraClient> {
    /// Esplora-backed connector for the configured chain
    pub fn from_config(config: &IssuerConfig) -> Result<Self> {
        let backend = EsploraClient::new(config.esplora_url.clone())?;
        log::info!(
            "Using Esplora backend {} for {}",
            backend.base_url(),
            config.chain
        );
        Ok(Self::new(config.chain, backend))
    }
}

impl<B: ProviderBackend> ServiceProviderConnector for BitcoinServiceProviderConnector<B> {
    fn get_balance(&self, issuing_address: &str, secrets: &mut dyn SecretManager) -> Result<u64> {
        let address = self.verified_address(issuing_address, secrets)?;

        let balance = self.backend.spendable_balance(&address)?;
        log::debug!("{} spendable balance: {} sats", address, balance);
        Ok(balance)
    }

    fn broadcast_op_return(
        &self,
        request: &BroadcastRequest<'_>,
        secrets: &mut dyn SecretManager,
    ) -> Result<String> {
        // Reject oversized payloads before touching the key
        build_op_return_script(request.payload)?;

        let signed = self.signed_transaction(request, secrets)?;
        let txid = signed.compute_txid().to_string();
        let tx_hex = serialize_hex(&signed);
        let max_attempts = request.retry_policy.max_attempts;

        let relayed = request.retry_policy.run(|attempt| {
            log::debug!("Submitting {} (attempt {}/{})", txid, attempt, max_attempts);
            match self.backend.broadcast_raw_tx(&tx_hex) {
                Ok(relayed) => Ok(relayed),
                // An earlier attempt got through but its response was lost
                Err(e) if e.is_already_known() => {
                    log::warn!("Provider already has {}: {}", txid, e);
                    Ok(txid.clone())
                }
                Err(e) => Err(e.into()),
            }
        })?;

        log::info!("✅ OP_RETURN transaction broadcast: {}", relayed);
        log::debug!("   Payload: {}", hex::encode(request.payload));

        Ok(relayed)
    }
}
