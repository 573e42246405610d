//! Per-project allow-list registry, consulted only by admin disbursements.

use soroban_sdk::{contractclient, Address, Env};

#[allow(dead_code)]
#[contractclient(name = "AllowListClient")]
pub trait AllowListInterface {
    fn is_member(env: Env, project_id: u64, identity: Address) -> bool;
}
