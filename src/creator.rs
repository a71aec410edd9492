//! OP_RETURN issuance transaction construction
//!
//! Layout of every transaction built here:
//!
//! - inputs: every supplied spendable, in provider order
//! - output 0: `OP_RETURN <payload>`, zero value
//! - output 1 (optional): change back to the issuing address, only when it
//!   clears the dust threshold; otherwise the remainder goes to the fee
//!
//! Signing happens elsewhere; inputs leave here with empty script_sigs.

use bitcoin::blockdata::opcodes;
use bitcoin::blockdata::script::{Instruction, PushBytesBuf, Script, ScriptBuf};
use bitcoin::blockdata::transaction::{Transaction, TxIn, TxOut};
use bitcoin::blockdata::witness::Witness;
use bitcoin::transaction::{OutPoint, Sequence};
use bitcoin::{absolute, Address, Amount};

use crate::cost::{estimate_cost, TransactionCostConstants, V2_NUM_OUTPUTS};
use crate::error::{IssuerError, Result};

/// Standard relay limit for OP_RETURN data
pub const MAX_OP_RETURN_SIZE: usize = 80;

/// Unspent output owned by the issuing address
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spendable {
    pub outpoint: OutPoint,
    pub value: u64,
    pub address: String,
}

/// Unsigned transaction plus the bookkeeping the signer needs
#[derive(Clone, Debug)]
pub struct IssuanceTransaction {
    pub tx: Transaction,
    pub fee: u64,
    pub inputs: Vec<Spendable>,
}

impl IssuanceTransaction {
    pub fn change(&self) -> Option<u64> {
        self.tx.output.get(1).map(|o| o.value.to_sat())
    }
}

pub trait TransactionCreator {
    /// Pre-flight cost, before spendables are known
    fn estimate_cost_for_certificate_batch(&self, constants: &TransactionCostConstants) -> u64;

    fn create_transaction(
        &self,
        constants: &TransactionCostConstants,
        issuing_address: &Address,
        inputs: &[Spendable],
        op_return_value: &[u8],
    ) -> Result<IssuanceTransaction>;
}

/// One OP_RETURN output plus optional change
#[derive(Clone, Copy, Debug, Default)]
pub struct OpReturnTransactionCreator;

impl TransactionCreator for OpReturnTransactionCreator {
    fn estimate_cost_for_certificate_batch(&self, constants: &TransactionCostConstants) -> u64 {
        constants.preflight_cost(V2_NUM_OUTPUTS)
    }

    fn create_transaction(
        &self,
        constants: &TransactionCostConstants,
        issuing_address: &Address,
        inputs: &[Spendable],
        op_return_value: &[u8],
    ) -> Result<IssuanceTransaction> {
        let op_return_script = build_op_return_script(op_return_value)?;

        let fee = estimate_cost(constants, inputs.len(), V2_NUM_OUTPUTS);
        let total_input: u64 = inputs.iter().map(|s| s.value).sum();

        if inputs.is_empty() || total_input < fee {
            return Err(IssuerError::InsufficientFunds {
                shortfall: fee - total_input,
                address: issuing_address.to_string(),
            });
        }

        let change_amount = total_input - fee;

        let mut tx = Transaction {
            version: bitcoin::transaction::Version::TWO,
            lock_time: absolute::LockTime::ZERO,
            input: Vec::with_capacity(inputs.len()),
            output: Vec::with_capacity(2),
        };

        for spendable in inputs {
            tx.input.push(TxIn {
                previous_output: spendable.outpoint,
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::new(),
            });
        }

        tx.output.push(TxOut {
            value: Amount::ZERO,
            script_pubkey: op_return_script,
        });

        // Dust change goes to the miners
        if change_amount >= constants.min_per_output {
            tx.output.push(TxOut {
                value: Amount::from_sat(change_amount),
                script_pubkey: issuing_address.script_pubkey(),
            });
        } else {
            log::debug!(
                "Change of {} sats is below dust threshold {}, adding it to the fee",
                change_amount,
                constants.min_per_output
            );
        }

        let effective_fee = total_input - tx.output.iter().map(|o| o.value.to_sat()).sum::<u64>();

        log::debug!(
            "Built issuance transaction: {} inputs, {} outputs, fee {} sats",
            tx.input.len(),
            tx.output.len(),
            effective_fee
        );

        Ok(IssuanceTransaction {
            tx,
            fee: effective_fee,
            inputs: inputs.to_vec(),
        })
    }
}

/// Build `OP_RETURN <payload>`
pub fn build_op_return_script(payload: &[u8]) -> Result<ScriptBuf> {
    if payload.len() > MAX_OP_RETURN_SIZE {
        return Err(IssuerError::InvalidPayload(format!(
            "data too large: {} > {}",
            payload.len(),
            MAX_OP_RETURN_SIZE
        )));
    }

    let push_bytes = PushBytesBuf::try_from(payload.to_vec())
        .map_err(|e| IssuerError::InvalidPayload(e.to_string()))?;

    Ok(ScriptBuf::new_op_return(&push_bytes))
}

/// Read the payload back out of an OP_RETURN script
pub fn extract_op_return_payload(script: &Script) -> Result<Vec<u8>> {
    let mut instructions = script.instructions();

    match instructions.next() {
        Some(Ok(Instruction::Op(op))) if op == opcodes::all::OP_RETURN => {}
        _ => {
            return Err(IssuerError::InvalidPayload(
                "not an OP_RETURN script".to_string(),
            ))
        }
    }

    match instructions.next() {
        Some(Ok(Instruction::PushBytes(data))) => Ok(data.as_bytes().to_vec()),
        None => Ok(Vec::new()),
        _ => Err(IssuerError::InvalidPayload(
            "unexpected OP_RETURN script format".to_string(),
        )),
    }
}
