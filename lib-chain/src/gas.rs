//! Gas schedule for the binding layer's own transactions.

const FORGE_ORG_BASE_GAS: u64 = 4_543_776;
const FORGE_ORG_PER_FOUNDER_GAS: u64 = 50_000;
const MAX_GAS: u64 = 6_015_000;

/// Gas ceiling for `forgeOrg`, scaled by founder count
pub fn forge_org_gas_limit(founder_count: usize) -> u64 {
    FORGE_ORG_BASE_GAS + FORGE_ORG_PER_FOUNDER_GAS * founder_count as u64
}

/// Gas ceiling for contract deployment
pub fn max_gas_limit() -> u64 {
    MAX_GAS
}
