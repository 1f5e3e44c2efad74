use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Regional routing values for Riot API (Account-v1, Match-v5)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Americas,
    Asia,
    Europe,
    Sea,
}

impl Region {
    pub fn base_url(&self) -> String {
        format!("https://{}.api.riotgames.com", self.as_str())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Americas => "americas",
            Self::Asia => "asia",
            Self::Europe => "europe",
            Self::Sea => "sea",
        }
    }
}

impl FromStr for Region {
    type Err = AppError;

    /// Accepts the routing value itself or any platform code routed through it.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "AMERICAS" | "NA" | "NA1" | "BR" | "BR1" | "LAN" | "LA1" | "LAS" | "LA2" => {
                Ok(Self::Americas)
            }
            "ASIA" | "KR" | "JP" | "JP1" => Ok(Self::Asia),
            "EUROPE" | "EUW" | "EUW1" | "EUNE" | "EUN1" | "TR" | "TR1" | "RU" | "ME" | "ME1" => {
                Ok(Self::Europe)
            }
            "SEA" | "OCE" | "OC1" | "PH2" | "SG2" | "TH2" | "TW2" | "VN2" => Ok(Self::Sea),
            _ => Err(AppError::InvalidRegion(s.to_string())),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
