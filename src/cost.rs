//! Transaction cost model
//!
//! Pure fee arithmetic. The same function sizes the pre-flight balance check
//! (with an assumed input count) and the built transaction (with the real one).

/// Input count assumed before spendables are known
pub const ESTIMATE_NUM_INPUTS: usize = 1;

/// Value outputs in an issuance transaction (the change output)
pub const V2_NUM_OUTPUTS: usize = 1;

const BASE_TX_SIZE: u64 = 10;
const P2PKH_INPUT_SIZE: u64 = 148;
const P2PKH_OUTPUT_SIZE: u64 = 34;
/// value (8) + script length (1) + OP_RETURN (1) + push (1) + 32-byte commitment
const OP_RETURN_OUTPUT_SIZE: u64 = 43;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionCostConstants {
    /// Fee floor in satoshis
    pub recommended_tx_fee: u64,
    /// Smallest change output worth creating
    pub min_per_output: u64,
    pub satoshi_per_byte: u64,
    /// Input count for the pre-flight estimate
    pub default_assumed_inputs: usize,
}

impl TransactionCostConstants {
    pub fn new(recommended_tx_fee: u64, min_per_output: u64, satoshi_per_byte: u64) -> Self {
        Self {
            recommended_tx_fee,
            min_per_output,
            satoshi_per_byte,
            default_assumed_inputs: ESTIMATE_NUM_INPUTS,
        }
    }

    pub fn with_default_assumed_inputs(mut self, inputs: usize) -> Self {
        self.default_assumed_inputs = inputs;
        self
    }

    /// Estimate before any inputs are selected
    pub fn preflight_cost(&self, num_outputs: usize) -> u64 {
        estimate_cost(self, self.default_assumed_inputs, num_outputs)
    }
}

impl Default for TransactionCostConstants {
    fn default() -> Self {
        Self::new(60_000, 2_750, 250)
    }
}

/// Estimate raw transaction size in bytes, OP_RETURN output included
pub fn estimate_tx_size(num_inputs: usize, num_outputs: usize) -> u64 {
    BASE_TX_SIZE
        .saturating_add((num_inputs as u64).saturating_mul(P2PKH_INPUT_SIZE))
        .saturating_add((num_outputs as u64).saturating_mul(P2PKH_OUTPUT_SIZE))
        .saturating_add(OP_RETURN_OUTPUT_SIZE)
}

/// Fee in satoshis: size-based fee, never below the recommended floor
pub fn estimate_cost(
    constants: &TransactionCostConstants,
    num_inputs: usize,
    num_outputs: usize,
) -> u64 {
    let size_fee = estimate_tx_size(num_inputs, num_outputs).saturating_mul(constants.satoshi_per_byte);
    size_fee.max(constants.recommended_tx_fee)
}
