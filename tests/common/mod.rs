//! In-memory ledger for integration tests.
//!
//! Interprets the system, token, associated-token and metadata instructions the
//! workflow sends, and supports failure injection.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use solana_sdk::account::Account;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::{CompiledInstruction, InstructionError};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::transaction::{Transaction, TransactionError};
use spl_token::instruction::{AuthorityType, TokenInstruction};
use spl_token::solana_program::program_option::COption;
use spl_token::solana_program::program_pack::Pack;
use spl_token::state::{Account as TokenAccount, AccountState, Mint};

use token_provision::blockchain::{
    BlockchainError, BlockchainResult, ConfirmationStatus, LatestBlockhash, Ledger, Wallet,
};
use token_provision::config::ProvisionConfig;

pub const SOL: u64 = 1_000_000_000;
pub const FEE_PER_SIGNATURE: u64 = 5_000;
const VALIDITY_WINDOW: u64 = 150;

/// Predicate selecting instructions that fail on-chain.
pub type FailOn = fn(&Pubkey, &[u8]) -> bool;

#[derive(Default)]
struct State {
    balances: HashMap<Pubkey, u64>,
    accounts: HashMap<Pubkey, Account>,
    statuses: HashMap<Signature, ConfirmationStatus>,
    /// Oldest first.
    signatures_by_address: HashMap<Pubkey, Vec<Signature>>,
    block_height: u64,
    issued_blockhashes: Vec<Hash>,
    sent: Vec<Transaction>,
    metadata_lookups: u32,

    // Failure injection.
    transient_send_failures: u32,
    fail_sends_from: Option<usize>,
    fail_on: Option<FailOn>,
    lag_status_on: Option<FailOn>,
    apply_twice_on: Option<FailOn>,
    hidden_metadata_lookups: u32,
    balance_unavailable: bool,
    hide_signatures: bool,
    never_land: bool,
}

pub struct MockLedger {
    state: Mutex<State>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                block_height: 1_000,
                ..State::default()
            }),
        }
    }

    pub fn with_balance(owner: &Pubkey, lamports: u64) -> Self {
        let ledger = Self::new();
        ledger.set_balance(owner, lamports);
        ledger
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn set_balance(&self, owner: &Pubkey, lamports: u64) {
        self.state().balances.insert(*owner, lamports);
    }

    /// The next `n` submissions fail with a transport error.
    pub fn fail_next_sends(&self, n: u32) {
        self.state().transient_send_failures = n;
    }

    /// Every submission from the `index`-th (0-based, counting all sends) fails.
    pub fn fail_sends_from(&self, index: usize) {
        self.state().fail_sends_from = Some(index);
    }

    /// Transactions containing a matching instruction land but fail.
    pub fn fail_on_chain(&self, predicate: FailOn) {
        self.state().fail_on = Some(predicate);
    }

    /// Transactions containing a matching instruction land, but their status
    /// stays pending, as on a lagging node.
    pub fn lag_status_on(&self, predicate: FailOn) {
        self.state().lag_status_on = Some(predicate);
    }

    /// Matching instructions are applied twice, as if a duplicate had also landed.
    pub fn apply_twice_on(&self, predicate: FailOn) {
        self.state().apply_twice_on = Some(predicate);
    }

    /// Metadata accounts read as missing for the next `n` lookups.
    pub fn hide_metadata_for(&self, n: u32) {
        self.state().hidden_metadata_lookups = n;
    }

    pub fn make_balance_unavailable(&self) {
        self.state().balance_unavailable = true;
    }

    pub fn hide_signatures(&self) {
        self.state().hide_signatures = true;
    }

    /// Submissions are accepted but never reach a block; block height keeps rising.
    pub fn never_land(&self) {
        self.state().never_land = true;
    }

    pub fn balance(&self, owner: &Pubkey) -> u64 {
        self.state().balances.get(owner).copied().unwrap_or(0)
    }

    pub fn account(&self, address: &Pubkey) -> Option<Account> {
        self.state().accounts.get(address).cloned()
    }

    pub fn mint_state(&self, address: &Pubkey) -> Option<Mint> {
        self.account(address)
            .and_then(|account| Mint::unpack(&account.data).ok())
    }

    pub fn token_state(&self, address: &Pubkey) -> Option<TokenAccount> {
        self.account(address)
            .and_then(|account| TokenAccount::unpack(&account.data).ok())
    }

    pub fn sent(&self) -> Vec<Transaction> {
        self.state().sent.clone()
    }

    pub fn issued_blockhashes(&self) -> Vec<Hash> {
        self.state().issued_blockhashes.clone()
    }

    pub fn metadata_lookups(&self) -> u32 {
        self.state().metadata_lookups
    }

    /// Number of accounts owned by `program`.
    pub fn accounts_owned_by(&self, program: &Pubkey) -> usize {
        self.state()
            .accounts
            .values()
            .filter(|account| &account.owner == program)
            .count()
    }

    /// Submitted transactions containing an instruction matching `predicate`.
    pub fn sends_matching(&self, predicate: FailOn) -> usize {
        self.state()
            .sent
            .iter()
            .filter(|tx| contains(tx, predicate))
            .count()
    }
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl State {
    fn submit(&mut self, tx: &Transaction) -> BlockchainResult<Signature> {
        let index = self.sent.len();
        self.sent.push(tx.clone());

        if self.fail_sends_from.map_or(false, |from| index >= from) {
            return Err(BlockchainError::Rpc("connection reset by peer".to_string()));
        }
        if self.transient_send_failures > 0 {
            self.transient_send_failures -= 1;
            return Err(BlockchainError::Rpc("request timed out".to_string()));
        }
        if !self.issued_blockhashes.contains(&tx.message.recent_blockhash) {
            return Err(BlockchainError::BlockhashExpired { last_valid_block_height: 0 });
        }
        if tx.verify().is_err() {
            return Err(BlockchainError::Rejected("signature verification failure".to_string()));
        }

        let signature = tx.signatures[0];
        if self.never_land {
            return Ok(signature);
        }

        let status = match self.execute(tx) {
            Ok(()) => ConfirmationStatus::Confirmed,
            Err(e) => ConfirmationStatus::Failed(e),
        };
        let lagging = self.lag_status_on.map_or(false, |predicate| contains(tx, predicate));
        if !lagging {
            self.statuses.insert(signature, status);
        }
        for key in &tx.message.account_keys {
            self.signatures_by_address.entry(*key).or_default().push(signature);
        }
        Ok(signature)
    }

    /// Apply every instruction or none.
    fn execute(&mut self, tx: &Transaction) -> Result<(), TransactionError> {
        let payer = tx.message.account_keys[0];
        let fee = FEE_PER_SIGNATURE * tx.signatures.len() as u64;
        let balance = self.balances.get(&payer).copied().unwrap_or(0);
        if balance < fee {
            return Err(TransactionError::InsufficientFundsForFee);
        }

        let mut accounts = self.accounts.clone();
        let mut balances = self.balances.clone();
        *balances.entry(payer).or_default() -= fee;

        for (i, ix) in tx.message.instructions.iter().enumerate() {
            let program = tx.message.account_keys[ix.program_id_index as usize];
            if let Some(fail_on) = self.fail_on {
                if fail_on(&program, &ix.data) {
                    return Err(TransactionError::InstructionError(i as u8, InstructionError::Custom(1)));
                }
            }
            let times = match self.apply_twice_on {
                Some(predicate) if predicate(&program, &ix.data) => 2,
                _ => 1,
            };
            for _ in 0..times {
                apply(&tx.message.account_keys, ix, &program, &mut accounts, &mut balances)
                    .map_err(|e| TransactionError::InstructionError(i as u8, e))?;
            }
        }

        self.accounts = accounts;
        self.balances = balances;
        Ok(())
    }
}

fn contains(tx: &Transaction, predicate: FailOn) -> bool {
    tx.message.instructions.iter().any(|ix| {
        let program = tx.message.account_keys[ix.program_id_index as usize];
        predicate(&program, &ix.data)
    })
}

fn apply(
    keys: &[Pubkey],
    ix: &CompiledInstruction,
    program: &Pubkey,
    accounts: &mut HashMap<Pubkey, Account>,
    balances: &mut HashMap<Pubkey, u64>,
) -> Result<(), InstructionError> {
    let key = |n: usize| -> Result<Pubkey, InstructionError> {
        ix.accounts
            .get(n)
            .map(|&idx| keys[idx as usize])
            .ok_or(InstructionError::NotEnoughAccountKeys)
    };

    if *program == solana_sdk::system_program::id() {
        // CreateAccount: u32 tag, u64 lamports, u64 space, 32-byte owner.
        let data = &ix.data;
        if data.len() != 52 || data[..4] != [0, 0, 0, 0] {
            return Err(InstructionError::InvalidInstructionData);
        }
        let lamports = u64::from_le_bytes(data[4..12].try_into().unwrap());
        let space = u64::from_le_bytes(data[12..20].try_into().unwrap());
        let owner = Pubkey::try_from(&data[20..52]).unwrap();
        let (from, to) = (key(0)?, key(1)?);
        if accounts.contains_key(&to) {
            return Err(InstructionError::AccountAlreadyInitialized);
        }
        debit(balances, &from, lamports)?;
        accounts.insert(to, Account::new(lamports, space as usize, &owner));
        return Ok(());
    }

    if *program == spl_token::id() {
        let instruction =
            TokenInstruction::unpack(&ix.data).map_err(|_| InstructionError::InvalidInstructionData)?;
        return match instruction {
            TokenInstruction::InitializeMint2 {
                decimals,
                mint_authority,
                freeze_authority,
            } => {
                let account = accounts.get_mut(&key(0)?).ok_or(InstructionError::UninitializedAccount)?;
                if account.owner != spl_token::id() || account.data.len() != Mint::LEN {
                    return Err(InstructionError::InvalidAccountData);
                }
                let mint = Mint {
                    mint_authority: COption::Some(mint_authority),
                    supply: 0,
                    decimals,
                    is_initialized: true,
                    freeze_authority,
                };
                Mint::pack(mint, &mut account.data).map_err(|_| InstructionError::InvalidAccountData)
            }
            TokenInstruction::MintTo { amount } => {
                let (mint_key, dest_key, authority) = (key(0)?, key(1)?, key(2)?);
                let mut mint = load_mint(accounts, &mint_key)?;
                if mint.mint_authority != COption::Some(authority) {
                    return Err(InstructionError::Custom(4));
                }
                let dest_account = accounts.get_mut(&dest_key).ok_or(InstructionError::UninitializedAccount)?;
                let mut dest = TokenAccount::unpack(&dest_account.data)
                    .map_err(|_| InstructionError::InvalidAccountData)?;
                if dest.mint != mint_key {
                    return Err(InstructionError::Custom(3));
                }
                dest.amount = dest.amount.checked_add(amount).ok_or(InstructionError::Custom(14))?;
                TokenAccount::pack(dest, &mut dest_account.data)
                    .map_err(|_| InstructionError::InvalidAccountData)?;
                mint.supply = mint.supply.checked_add(amount).ok_or(InstructionError::Custom(14))?;
                store_mint(accounts, &mint_key, mint)
            }
            TokenInstruction::SetAuthority {
                authority_type: AuthorityType::MintTokens,
                new_authority,
            } => {
                let (mint_key, current) = (key(0)?, key(1)?);
                let mut mint = load_mint(accounts, &mint_key)?;
                if mint.mint_authority != COption::Some(current) {
                    return Err(InstructionError::Custom(4));
                }
                mint.mint_authority = new_authority;
                store_mint(accounts, &mint_key, mint)
            }
            _ => Err(InstructionError::InvalidInstructionData),
        };
    }

    if *program == spl_associated_token_account::id() {
        let (funder, address, wallet, mint) = (key(0)?, key(1)?, key(2)?, key(3)?);
        if accounts.contains_key(&address) {
            return Ok(());
        }
        load_mint(accounts, &mint)?;
        let lamports = 2_039_280;
        debit(balances, &funder, lamports)?;
        let mut account = Account::new(lamports, TokenAccount::LEN, &spl_token::id());
        let state = TokenAccount {
            mint,
            owner: wallet,
            amount: 0,
            delegate: COption::None,
            state: AccountState::Initialized,
            is_native: COption::None,
            delegated_amount: 0,
            close_authority: COption::None,
        };
        TokenAccount::pack(state, &mut account.data).map_err(|_| InstructionError::InvalidAccountData)?;
        accounts.insert(address, account);
        return Ok(());
    }

    if *program == mpl_token_metadata::ID {
        let (metadata, mint, payer) = (key(0)?, key(1)?, key(3)?);
        load_mint(accounts, &mint)?;
        if accounts.contains_key(&metadata) {
            return Err(InstructionError::AccountAlreadyInitialized);
        }
        let lamports = 15_115_600;
        debit(balances, &payer, lamports)?;
        let mut account = Account::new(lamports, 679, &mpl_token_metadata::ID);
        account.data[..ix.data.len().min(679)].copy_from_slice(&ix.data[..ix.data.len().min(679)]);
        accounts.insert(metadata, account);
        return Ok(());
    }

    Err(InstructionError::IncorrectProgramId)
}

fn debit(balances: &mut HashMap<Pubkey, u64>, from: &Pubkey, lamports: u64) -> Result<(), InstructionError> {
    let balance = balances.entry(*from).or_default();
    *balance = balance.checked_sub(lamports).ok_or(InstructionError::InsufficientFunds)?;
    Ok(())
}

fn load_mint(accounts: &HashMap<Pubkey, Account>, address: &Pubkey) -> Result<Mint, InstructionError> {
    let account = accounts.get(address).ok_or(InstructionError::UninitializedAccount)?;
    Mint::unpack(&account.data).map_err(|_| InstructionError::UninitializedAccount)
}

fn store_mint(accounts: &mut HashMap<Pubkey, Account>, address: &Pubkey, mint: Mint) -> Result<(), InstructionError> {
    let account = accounts.get_mut(address).ok_or(InstructionError::UninitializedAccount)?;
    Mint::pack(mint, &mut account.data).map_err(|_| InstructionError::InvalidAccountData)
}

impl Ledger for MockLedger {
    async fn get_balance(&self, address: &Pubkey) -> BlockchainResult<u64> {
        let state = self.state();
        if state.balance_unavailable {
            return Err(BlockchainError::Rpc("503 Service Unavailable".to_string()));
        }
        Ok(state.balances.get(address).copied().unwrap_or(0))
    }

    async fn get_latest_blockhash(&self, _commitment: CommitmentConfig) -> BlockchainResult<LatestBlockhash> {
        let mut state = self.state();
        let hash = Hash::new_unique();
        state.issued_blockhashes.push(hash);
        Ok(LatestBlockhash {
            hash,
            last_valid_block_height: state.block_height + VALIDITY_WINDOW,
        })
    }

    async fn get_block_height(&self, _commitment: CommitmentConfig) -> BlockchainResult<u64> {
        let mut state = self.state();
        if state.never_land {
            state.block_height += 50;
        }
        Ok(state.block_height)
    }

    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize) -> BlockchainResult<u64> {
        Ok((128 + data_len as u64) * 6_960)
    }

    async fn send_transaction(&self, transaction: &Transaction) -> BlockchainResult<Signature> {
        self.state().submit(transaction)
    }

    async fn get_signature_status(
        &self,
        signature: &Signature,
        _commitment: CommitmentConfig,
    ) -> BlockchainResult<ConfirmationStatus> {
        Ok(self
            .state()
            .statuses
            .get(signature)
            .cloned()
            .unwrap_or(ConfirmationStatus::Pending))
    }

    async fn get_account(
        &self,
        address: &Pubkey,
        _commitment: CommitmentConfig,
    ) -> BlockchainResult<Option<Account>> {
        let mut state = self.state();
        let account = state.accounts.get(address).cloned();
        if let Some(found) = &account {
            if found.owner == mpl_token_metadata::ID {
                state.metadata_lookups += 1;
                if state.hidden_metadata_lookups > 0 {
                    state.hidden_metadata_lookups -= 1;
                    return Ok(None);
                }
            }
        }
        Ok(account)
    }

    async fn get_signatures_for_address(
        &self,
        address: &Pubkey,
        limit: usize,
        _commitment: CommitmentConfig,
    ) -> BlockchainResult<Vec<Signature>> {
        let state = self.state();
        if state.hide_signatures {
            return Ok(Vec::new());
        }
        Ok(state
            .signatures_by_address
            .get(address)
            .map(|sigs| sigs.iter().rev().take(limit).copied().collect())
            .unwrap_or_default())
    }
}

/// Instruction predicates for failure injection and counting.
pub fn is_set_authority(program: &Pubkey, data: &[u8]) -> bool {
    *program == spl_token::id() && matches!(TokenInstruction::unpack(data), Ok(TokenInstruction::SetAuthority { .. }))
}

pub fn is_mint_to(program: &Pubkey, data: &[u8]) -> bool {
    *program == spl_token::id() && matches!(TokenInstruction::unpack(data), Ok(TokenInstruction::MintTo { .. }))
}

pub fn is_initialize_mint(program: &Pubkey, data: &[u8]) -> bool {
    *program == spl_token::id() && matches!(TokenInstruction::unpack(data), Ok(TokenInstruction::InitializeMint2 { .. }))
}

pub fn is_create_metadata(program: &Pubkey, _data: &[u8]) -> bool {
    *program == mpl_token_metadata::ID
}

/// Default config with a short poll interval.
pub fn test_config() -> ProvisionConfig {
    let mut config = ProvisionConfig::default();
    config.rpc.poll_interval_ms = 100;
    config
}

pub fn test_wallet() -> (Wallet, Pubkey) {
    let keypair = Keypair::new();
    let pubkey = solana_sdk::signer::Signer::pubkey(&keypair);
    (Wallet::from(keypair), pubkey)
}
