//! APIARY Token Contract
//!
//! CEP-18 compatible token with protocol-controlled minting.
//!
//! Minting rules:
//! - The owner mints freely (genesis distribution, test fixtures)
//! - Authorized minters (the treasury) mint against the recipient's allocation limit,
//!   which is consumed by every mint. A bond depository's remaining allocation is the
//!   headroom that bounds its maximum bond size.

use odra::prelude::*;
use odra::casper_types::{U256, Key};
use odra::casper_types::bytesrepr::ToBytes;
use crate::errors::ApiaryError;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;

const CEP18_NAME_KEY: &str = "name";
const CEP18_SYMBOL_KEY: &str = "symbol";
const CEP18_DECIMALS_KEY: &str = "decimals";
const CEP18_TOTAL_SUPPLY_KEY: &str = "total_supply";
const CEP18_BALANCES_DICT: &str = "balances";
const CEP18_ALLOWANCES_DICT: &str = "allowances";

/// APIARY Token Contract
#[odra::module]
pub struct ApiaryToken {
    name: Var<String>,
    symbol: Var<String>,
    decimals: Var<u8>,
    total_supply: Var<U256>,
    balances: Mapping<Address, U256>,
    /// (owner, spender) -> amount
    allowances: Mapping<(Address, Address), U256>,
    /// Token owner
    owner: Var<Address>,
    /// Accounts allowed to mint against allocations (the treasury)
    minters: Mapping<Address, bool>,
    /// Remaining mint allocation per recipient
    allocation_limits: Mapping<Address, U256>,
    /// Optional supply cap (0 = unlimited)
    supply_cap: Var<U256>,
}

#[odra::module]
impl ApiaryToken {
    /// Initialize the token; the deployer becomes owner
    pub fn init(&mut self, name: String, symbol: String, decimals: u8) {
        self.name.set(name.clone());
        self.symbol.set(symbol.clone());
        self.decimals.set(decimals);
        self.total_supply.set(U256::zero());
        self.supply_cap.set(U256::zero());
        self.owner.set(self.env().caller());
        self.env().init_dictionary(CEP18_BALANCES_DICT);
        self.env().init_dictionary(CEP18_ALLOWANCES_DICT);
        self.env().set_named_value(CEP18_NAME_KEY, name);
        self.env().set_named_value(CEP18_SYMBOL_KEY, symbol);
        self.env().set_named_value(CEP18_DECIMALS_KEY, decimals);
        self.env().set_named_value(CEP18_TOTAL_SUPPLY_KEY, U256::zero());
    }

    // ========== CEP-18 ==========

    pub fn name(&self) -> String {
        self.name.get().unwrap_or_default()
    }

    pub fn symbol(&self) -> String {
        self.symbol.get().unwrap_or_default()
    }

    pub fn decimals(&self) -> u8 {
        self.decimals.get().unwrap_or(18)
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply.get().unwrap_or(U256::zero())
    }

    pub fn balance_of(&self, account: Address) -> U256 {
        self.balances.get(&account).unwrap_or(U256::zero())
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances.get(&(owner, spender)).unwrap_or(U256::zero())
    }

    pub fn transfer(&mut self, recipient: Address, amount: U256) -> bool {
        let sender = self.env().caller();
        self.transfer_internal(sender, recipient, amount);
        true
    }

    pub fn approve(&mut self, spender: Address, amount: U256) -> bool {
        let owner = self.env().caller();
        self.approve_internal(owner, spender, amount);
        true
    }

    pub fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) -> bool {
        let spender = self.env().caller();
        self.spend_allowance(owner, spender, amount);
        self.transfer_internal(owner, recipient, amount);
        true
    }

    // ========== Protocol Functions ==========

    /// Mint new tokens.
    ///
    /// Owner mints are unrestricted; minter mints consume `to`'s allocation.
    pub fn mint(&mut self, to: Address, amount: U256) {
        let caller = self.env().caller();
        if self.owner.get() != Some(caller) {
            if !self.is_minter(caller) {
                self.env().revert(ApiaryError::UnauthorizedMinter);
            }
            let allocation = self.allocation_limits(to);
            if amount > allocation {
                self.env().revert(ApiaryError::AllocationExceeded);
            }
            self.allocation_limits.set(&to, allocation - amount);
        }

        let new_supply = self.total_supply() + amount;
        let cap = self.get_supply_cap();
        if !cap.is_zero() && new_supply > cap {
            self.env().revert(ApiaryError::SupplyCapExceeded);
        }

        let credited = self.balance_of(to) + amount;
        self.write_balance(to, credited);
        self.write_supply(new_supply);
    }

    /// Burn from the caller's balance
    pub fn burn(&mut self, amount: U256) {
        let holder = self.env().caller();
        self.burn_internal(holder, amount);
    }

    /// Burn tokens from `from` using the caller's allowance
    pub fn burn_from(&mut self, from: Address, amount: U256) {
        let spender = self.env().caller();
        self.spend_allowance(from, spender, amount);
        self.burn_internal(from, amount);
    }

    /// Remaining mint allocation for `account`
    pub fn allocation_limits(&self, account: Address) -> U256 {
        self.allocation_limits.get(&account).unwrap_or(U256::zero())
    }

    // ========== Admin Functions ==========

    pub fn add_minter(&mut self, minter: Address) {
        self.require_owner();
        self.minters.set(&minter, true);
    }

    pub fn remove_minter(&mut self, minter: Address) {
        self.require_owner();
        self.minters.set(&minter, false);
    }

    pub fn is_minter(&self, account: Address) -> bool {
        self.minters.get(&account).unwrap_or(false)
    }

    /// Set the remaining allocation for a recipient (owner only)
    pub fn set_allocation_limit(&mut self, account: Address, limit: U256) {
        self.require_owner();
        self.allocation_limits.set(&account, limit);
    }

    pub fn set_supply_cap(&mut self, cap: U256) {
        self.require_owner();
        self.supply_cap.set(cap);
    }

    pub fn get_supply_cap(&self) -> U256 {
        self.supply_cap.get().unwrap_or(U256::zero())
    }

    pub fn get_owner(&self) -> Option<Address> {
        self.owner.get()
    }

    pub fn transfer_ownership(&mut self, new_owner: Address) {
        self.require_owner();
        self.owner.set(new_owner);
    }

    // ========== Internal Functions ==========

    fn transfer_internal(&mut self, from: Address, to: Address, amount: U256) {
        self.debit(from, amount);
        let credited = self.balance_of(to) + amount;
        self.write_balance(to, credited);
    }

    fn spend_allowance(&mut self, owner: Address, spender: Address, amount: U256) {
        let remaining = self.allowance(owner, spender);
        if remaining < amount {
            self.env().revert(ApiaryError::InsufficientAllowance);
        }
        self.approve_internal(owner, spender, remaining - amount);
    }

    fn approve_internal(&mut self, owner: Address, spender: Address, amount: U256) {
        self.allowances.set(&(owner, spender), amount);
        let key = allowance_dictionary_key(owner, spender);
        self.env().set_dictionary_value(CEP18_ALLOWANCES_DICT, key.as_bytes(), amount);
    }

    fn burn_internal(&mut self, from: Address, amount: U256) {
        self.debit(from, amount);
        let supply = self.total_supply() - amount;
        self.write_supply(supply);
    }

    fn debit(&mut self, account: Address, amount: U256) {
        let balance = self.balance_of(account);
        if balance < amount {
            self.env().revert(ApiaryError::InsufficientTokenBalance);
        }
        self.write_balance(account, balance - amount);
    }

    /// Balances are mirrored into the CEP-18 dictionary read by wallets and explorers
    fn write_balance(&mut self, account: Address, balance: U256) {
        self.balances.set(&account, balance);
        let key = balance_dictionary_key(account);
        self.env().set_dictionary_value(CEP18_BALANCES_DICT, key.as_bytes(), balance);
    }

    fn write_supply(&mut self, supply: U256) {
        self.total_supply.set(supply);
        self.env().set_named_value(CEP18_TOTAL_SUPPLY_KEY, supply);
    }

    fn require_owner(&self) {
        if self.owner.get() != Some(self.env().caller()) {
            self.env().revert(ApiaryError::Unauthorized);
        }
    }
}

/// Base64 of the serialized account key
fn balance_dictionary_key(account: Address) -> String {
    BASE64_STANDARD.encode(Key::from(account).to_bytes().unwrap_or_default())
}

/// Base64 of the serialized owner key followed by the spender key
fn allowance_dictionary_key(owner: Address, spender: Address) -> String {
    let mut bytes = Key::from(owner).to_bytes().unwrap_or_default();
    bytes.extend(Key::from(spender).to_bytes().unwrap_or_default());
    BASE64_STANDARD.encode(bytes)
}
