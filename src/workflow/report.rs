//! Final summary of a successful run.

use serde_json::{json, Value};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;

use crate::config::schema::TokenConfig;
use crate::workflow::MintedSupply;

/// Addresses, amounts and signatures produced by a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionReport {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub payer: Pubkey,
    pub mint: Pubkey,
    pub metadata: Pubkey,
    pub token_account: Pubkey,
    /// Base units credited to the holding account.
    pub amount: u64,
    /// Supply read back from the mint after revocation.
    pub ledger_supply: u64,
    pub signatures: ReportSignatures,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSignatures {
    pub mint_creation: Signature,
    pub metadata: Signature,
    /// `None` when an existing account was reused.
    pub token_account: Option<Signature>,
    pub minting: Signature,
    pub authority_revocation: Signature,
}

impl ProvisionReport {
    pub(crate) fn new(
        token: &TokenConfig,
        payer: Pubkey,
        minted: &MintedSupply,
        ledger_supply: u64,
        revocation: Signature,
    ) -> Self {
        let account = minted.account();
        let metadata = account.metadata();
        Self {
            name: token.name.clone(),
            symbol: token.symbol.clone(),
            decimals: token.decimals,
            payer,
            mint: minted.mint().address(),
            metadata: metadata.address(),
            token_account: account.address(),
            amount: minted.amount(),
            ledger_supply,
            signatures: ReportSignatures {
                mint_creation: minted.mint().signature(),
                metadata: metadata.signature(),
                token_account: account.signature(),
                minting: minted.signature(),
                authority_revocation: revocation,
            },
        }
    }

    /// Credited amount in whole tokens, formatted with the mint's precision.
    pub fn ui_amount(&self) -> String {
        let scale = 10u64.pow(self.decimals as u32);
        let whole = self.amount / scale;
        let fraction = self.amount % scale;
        if self.decimals == 0 {
            whole.to_string()
        } else {
            format!("{}.{:0width$}", whole, fraction, width = self.decimals as usize)
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "symbol": self.symbol,
            "decimals": self.decimals,
            "payer": self.payer.to_string(),
            "mint": self.mint.to_string(),
            "metadata": self.metadata.to_string(),
            "token_account": self.token_account.to_string(),
            "amount": self.amount.to_string(),
            "ledger_supply": self.ledger_supply.to_string(),
            "signatures": {
                "mint_creation": self.signatures.mint_creation.to_string(),
                "metadata": self.signatures.metadata.to_string(),
                "token_account": self.signatures.token_account.map(|s| s.to_string()),
                "minting": self.signatures.minting.to_string(),
                "authority_revocation": self.signatures.authority_revocation.to_string(),
            },
        })
    }
}

impl std::fmt::Display for ProvisionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Tokens minted successfully")?;
        writeln!(f, "Name: {} ({})", self.name, self.symbol)?;
        writeln!(f, "Mint public key: {}", self.mint)?;
        writeln!(f, "Metadata account: {}", self.metadata)?;
        writeln!(f, "Token Account: {}", self.token_account)?;
        writeln!(f, "Minted: {} {} ({} base units)", self.ui_amount(), self.symbol, self.amount)?;
        write!(f, "Mint authority: removed")
    }
}
