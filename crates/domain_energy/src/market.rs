//! Utility markets

use core_kernel::{record_accessors, IconId, Labelled, Record, RecordMeta, Relation, UtilityMarketId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// The commodity a market trades
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketKind {
    Gas,
    Electricity,
    Water,
}

impl MarketKind {
    pub const ALL: [MarketKind; 3] = [MarketKind::Gas, MarketKind::Electricity, MarketKind::Water];

    pub fn internal_key(&self) -> &'static str {
        match self {
            MarketKind::Gas => "GAS",
            MarketKind::Electricity => "ELECTRICITY",
            MarketKind::Water => "WATER",
        }
    }
}

impl fmt::Display for MarketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.internal_key())
    }
}

impl FromStr for MarketKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.internal_key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown utility market: {s}"))
    }
}

impl Labelled for MarketKind {
    fn label_key(&self) -> &'static str {
        match self {
            MarketKind::Gas => "market-gas",
            MarketKind::Electricity => "market-electricity",
            MarketKind::Water => "market-water",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UtilityMarket {
    pub id: UtilityMarketId,
    /// `GAS`, `ELECTRICITY` or `WATER`
    #[validate(length(max = 2048))]
    pub internal_key: Option<String>,
    #[validate(length(max = 2048))]
    pub language_key: Option<String>,
    pub icon_tbl_id: IconId,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    #[validate(nested)]
    pub meta: RecordMeta,
}

impl UtilityMarket {
    pub fn new(kind: MarketKind, icon_tbl_id: IconId) -> Self {
        Self {
            id: UtilityMarketId::new_v7(),
            internal_key: Some(kind.internal_key().to_string()),
            language_key: Some(kind.label_key().to_string()),
            icon_tbl_id,
            meta: RecordMeta::new(),
        }
    }

    /// The parsed market kind, if the internal key names one
    pub fn kind(&self) -> Option<MarketKind> {
        self.internal_key.as_deref()?.parse().ok()
    }
}

impl Record for UtilityMarket {
    record_accessors!(UtilityMarketId);

    fn relations(&self) -> Vec<Relation> {
        vec![Relation::protect("icon_tbl_id", self.icon_tbl_id)]
    }
}
