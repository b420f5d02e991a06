//! APIARY token: minter roles, allocation limits, burning and the supply cap.

use crate::fixture::{assert_reverts, tokens, Protocol};
use apiary_contracts::errors::ApiaryError;
use odra::casper_types::U256;
use pretty_assertions::assert_eq;

#[test]
fn minters_are_bounded_by_allocation() {
    let mut p = Protocol::setup();
    p.apiary.add_minter(p.bob);
    p.apiary.set_allocation_limit(p.alice, tokens(100));
    assert!(p.apiary.is_minter(p.bob));

    p.env.set_caller(p.bob);
    assert_reverts(p.apiary.try_mint(p.alice, tokens(101)), ApiaryError::AllocationExceeded);
    assert_reverts(p.apiary.try_mint(p.bob, tokens(1)), ApiaryError::AllocationExceeded);
    p.apiary.mint(p.alice, tokens(60));
    assert_eq!(p.apiary.balance_of(p.alice), tokens(60));
    assert_eq!(p.apiary.allocation_limits(p.alice), tokens(40));

    p.env.set_caller(p.owner);
    p.apiary.remove_minter(p.bob);
    p.env.set_caller(p.bob);
    assert_reverts(p.apiary.try_mint(p.alice, tokens(1)), ApiaryError::UnauthorizedMinter);
}

#[test]
fn only_owner_manages_roles() {
    let mut p = Protocol::setup();
    p.env.set_caller(p.alice);
    assert_reverts(p.apiary.try_add_minter(p.alice), ApiaryError::Unauthorized);
    assert_reverts(
        p.apiary.try_set_allocation_limit(p.alice, tokens(1)),
        ApiaryError::Unauthorized,
    );

    p.env.set_caller(p.owner);
    p.apiary.transfer_ownership(p.alice);
    assert_eq!(p.apiary.get_owner(), Some(p.alice));
    assert_reverts(p.apiary.try_add_minter(p.bob), ApiaryError::Unauthorized);
}

#[test]
fn burn_from_spends_allowance() {
    let mut p = Protocol::setup();
    p.apiary.mint(p.alice, tokens(10));
    let supply = p.apiary.total_supply();

    p.env.set_caller(p.bob);
    assert_reverts(
        p.apiary.try_burn_from(p.alice, tokens(1)),
        ApiaryError::InsufficientAllowance,
    );

    p.env.set_caller(p.alice);
    p.apiary.approve(p.bob, tokens(4));
    p.env.set_caller(p.bob);
    p.apiary.burn_from(p.alice, tokens(4));
    assert_eq!(p.apiary.balance_of(p.alice), tokens(6));
    assert_eq!(p.apiary.allowance(p.alice, p.bob), U256::zero());
    assert_eq!(p.apiary.total_supply(), supply - tokens(4));

    p.env.set_caller(p.alice);
    assert_reverts(p.apiary.try_burn(tokens(7)), ApiaryError::InsufficientTokenBalance);
    p.apiary.burn(tokens(6));
    assert_eq!(p.apiary.balance_of(p.alice), U256::zero());
}

#[test]
fn supply_cap_limits_minting() {
    let mut p = Protocol::setup();
    let supply = p.apiary.total_supply();
    p.apiary.set_supply_cap(supply + tokens(5));

    assert_reverts(p.apiary.try_mint(p.alice, tokens(6)), ApiaryError::SupplyCapExceeded);
    p.apiary.mint(p.alice, tokens(5));
    assert_eq!(p.apiary.total_supply(), p.apiary.get_supply_cap());
}
