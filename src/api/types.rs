use serde::{Deserialize, Serialize};

use crate::types::ChainIndex;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateResponse {
    pub version: String,
    pub network: String,
    /// Unix seconds.
    pub start_time: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddressResponse {
    pub address: String,
}

/// Amounts in satoshis.
#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub confirmed: u64,
    pub immature: u64,
    pub pending: u64,
    pub total: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OutputEntry {
    pub outpoint: String,
    pub value: u64,
    pub height: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OutputsResponse {
    pub basis: Option<ChainIndex>,
    pub outputs: Vec<OutputEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EventEntry {
    pub txid: String,
    /// `None` while unconfirmed.
    pub height: Option<u32>,
    pub received: u64,
    pub sent: u64,
}
