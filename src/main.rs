use anchor_issuer::{
    BitcoinServiceProviderConnector, FileSecretManager, IssuanceLocks, IssuerConfig,
    MockServiceProviderConnector, ServiceProviderConnector, TransactionHandler, WifSecretManager,
};
use std::env;

fn issue<C: ServiceProviderConnector>(
    mut handler: TransactionHandler<C>,
    payload: &[u8],
) -> anyhow::Result<String> {
    Ok(handler.issue(payload)?)
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Initialize logger (set RUST_LOG=debug for verbose output, RUST_LOG=info for normal)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let payload_hex = env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: anchor-issuer <payload-hex>"))?;
    let payload = hex::decode(payload_hex.trim())?;

    let config = IssuerConfig::from_env()?;
    log::info!(
        "Issuing {}-byte commitment from {} on {}",
        payload.len(),
        config.issuing_address,
        config.chain
    );

    let issuance_locks = IssuanceLocks::new();

    let txid = if config.chain.is_mock() {
        let handler = TransactionHandler::new(
            MockServiceProviderConnector::default(),
            config.tx_cost_constants.clone(),
            WifSecretManager::new(String::new()),
            config.issuing_address.clone(),
            config.retry_policy.clone(),
            issuance_locks,
        );
        issue(handler, &payload)?
    } else {
        let key_file = config
            .key_file
            .clone()
            .ok_or_else(|| anyhow::anyhow!("ISSUER_KEY_FILE is not set"))?;
        let handler = TransactionHandler::new(
            BitcoinServiceProviderConnector::from_config(&config)?,
            config.tx_cost_constants.clone(),
            FileSecretManager::new(key_file),
            config.issuing_address.clone(),
            config.retry_policy.clone(),
            issuance_locks,
        );
        issue(handler, &payload)?
    };

    println!("{}", txid);
    Ok(())
}
