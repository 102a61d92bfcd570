//! Strategy catalog.
//!
//! Source of the candidate strategies agents choose from each day.
//! The trait keeps the engine independent of where candidates come
//! from; `StaticCatalog` ships a fixed cross-section of mainstream
//! DeFi positions for simulated runs.

use async_trait::async_trait;

use crate::types::{MarketTick, RiskTier, SimError, StrategyCandidate};

/// Abstraction over candidate sources.
///
/// `fetch` runs once per agent per day; a failure is reported to the
/// caller, which holds its position rather than retrying.
#[async_trait]
pub trait StrategyCatalog: Send + Sync {
    async fn fetch(&self, tick: &MarketTick) -> Result<Vec<StrategyCandidate>, SimError>;
}

// ---------------------------------------------------------------------------
// Static catalog
// ---------------------------------------------------------------------------

/// A fixed candidate list, returned unchanged every day.
pub struct StaticCatalog {
    candidates: Vec<StrategyCandidate>,
}

impl StaticCatalog {
    pub fn new(candidates: Vec<StrategyCandidate>) -> Self {
        StaticCatalog { candidates }
    }

    /// The standard simulation catalog: a spread of risk tiers,
    /// networks, and protocols wide enough that differently-mandated
    /// agents rank it differently.
    pub fn standard() -> Self {
        let c = |name: &str,
                 description: &str,
                 apy: f64,
                 protocols: &[&str],
                 networks: &[&str],
                 risk: RiskTier,
                 steps: &[&str],
                 leverage: Option<f64>| StrategyCandidate {
            name: name.to_string(),
            description: description.to_string(),
            expected_apy: apy,
            protocols: protocols.iter().map(|s| s.to_string()).collect(),
            networks: networks.iter().map(|s| s.to_string()).collect(),
            risk,
            steps: steps.iter().map(|s| s.to_string()).collect(),
            leverage_hint: leverage,
        };

        StaticCatalog::new(vec![
            c(
                "Lido stETH Staking",
                "Liquid-stake ETH for stETH and hold",
                3.2,
                &["lido"],
                &["ethereum"],
                RiskTier::Low,
                &["Stake ETH via Lido for stETH"],
                None,
            ),
            c(
                "Aave USDC Lending",
                "Swap to USDC and supply on Aave v3",
                4.1,
                &["aave", "uniswap"],
                &["ethereum", "arbitrum"],
                RiskTier::Low,
                &["Swap ETH to USDC", "Supply USDC to Aave v3"],
                None,
            ),
            c(
                "Morpho WETH Vault",
                "Deposit WETH into a curated Morpho Blue vault",
                4.8,
                &["morpho"],
                &["ethereum", "base"],
                RiskTier::Low,
                &["Wrap ETH", "Deposit WETH into Morpho vault"],
                None,
            ),
            c(
                "Curve 3pool + Convex",
                "Provide stablecoin liquidity to Curve 3pool, stake LP on Convex",
                5.6,
                &["curve", "convex"],
                &["ethereum"],
                RiskTier::Medium,
                &["Swap ETH to USDC", "Deposit into 3pool", "Stake LP token on Convex"],
                None,
            ),
            c(
                "Pendle PT-stETH",
                "Buy principal tokens on stETH yield, hold to maturity",
                6.9,
                &["pendle", "lido"],
                &["ethereum"],
                RiskTier::Medium,
                &["Stake ETH for stETH", "Buy PT-stETH on Pendle"],
                None,
            ),
            c(
                "Marinade mSOL Staking",
                "Bridge to Solana and liquid-stake via Marinade",
                7.1,
                &["marinade"],
                &["solana"],
                RiskTier::Medium,
                &["Bridge ETH to Solana", "Swap to SOL", "Stake via Marinade"],
                None,
            ),
            c(
                "Aave stETH Loop 3x",
                "Recursive stETH collateral loop on Aave at 3x leverage",
                8.4,
                &["aave", "lido"],
                &["ethereum"],
                RiskTier::Medium,
                &[
                    "Stake ETH for stETH",
                    "Supply stETH to Aave",
                    "Borrow ETH against it",
                    "Re-stake and repeat to 3x",
                ],
                Some(3.0),
            ),
            c(
                "Velodrome Stable LP",
                "Stable-pair liquidity on Velodrome with emissions",
                8.2,
                &["velodrome"],
                &["optimism"],
                RiskTier::Medium,
                &["Bridge to Optimism", "Provide USDC/DAI liquidity", "Stake LP for emissions"],
                None,
            ),
            c(
                "Uniswap V3 ETH/USDC LP",
                "Concentrated-range liquidity, actively managed",
                9.8,
                &["uniswap"],
                &["ethereum", "base"],
                RiskTier::High,
                &["Split ETH/USDC", "Open concentrated position", "Rebalance on range exit"],
                None,
            ),
            c(
                "GMX GLP Pool",
                "Provide GLP index liquidity, earn trading fees",
                11.4,
                &["gmx"],
                &["arbitrum"],
                RiskTier::High,
                &["Bridge ETH to Arbitrum", "Mint GLP", "Stake GLP"],
                None,
            ),
            c(
                "Leveraged GM Farming 10x",
                "Looped GM token farming at 10x via external credit",
                24.0,
                &["gmx", "dolomite"],
                &["arbitrum"],
                RiskTier::Extreme,
                &[
                    "Bridge ETH to Arbitrum",
                    "Deposit collateral on Dolomite",
                    "Loop borrow into GM tokens to 10x",
                    "Monitor liquidation threshold hourly",
                ],
                Some(10.0),
            ),
        ])
    }
}

#[async_trait]
impl StrategyCatalog for StaticCatalog {
    async fn fetch(&self, _tick: &MarketTick) -> Result<Vec<StrategyCandidate>, SimError> {
        Ok(self.candidates.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
