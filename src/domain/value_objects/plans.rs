use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlanType {
    Premium,
    #[serde(rename = "Premium Plus")]
    PremiumPlus,
}

impl Display for PlanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let plan = match self {
            PlanType::Premium => "Premium",
            PlanType::PremiumPlus => "Premium Plus",
        };
        write!(f, "{}", plan)
    }
}

impl PlanType {
    pub const ALL: [PlanType; 2] = [PlanType::Premium, PlanType::PremiumPlus];

    pub fn from_str(value: &str) -> Self {
        match value {
            "Premium" => PlanType::Premium,
            "Premium Plus" => PlanType::PremiumPlus,
            _ => PlanType::Premium,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlanDuration {
    #[serde(rename = "1 month")]
    OneMonth,
    #[serde(rename = "3 months")]
    ThreeMonths,
    #[serde(rename = "6 months")]
    SixMonths,
    #[serde(rename = "12 months")]
    TwelveMonths,
}

impl Display for PlanDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let duration = match self {
            PlanDuration::OneMonth => "1 month",
            PlanDuration::ThreeMonths => "3 months",
            PlanDuration::SixMonths => "6 months",
            PlanDuration::TwelveMonths => "12 months",
        };
        write!(f, "{}", duration)
    }
}

impl PlanDuration {
    pub const ALL: [PlanDuration; 4] = [
        PlanDuration::OneMonth,
        PlanDuration::ThreeMonths,
        PlanDuration::SixMonths,
        PlanDuration::TwelveMonths,
    ];

    pub fn months(&self) -> i32 {
        match self {
            PlanDuration::OneMonth => 1,
            PlanDuration::ThreeMonths => 3,
            PlanDuration::SixMonths => 6,
            PlanDuration::TwelveMonths => 12,
        }
    }

    pub fn from_months(months: i32) -> Option<Self> {
        match months {
            1 => Some(PlanDuration::OneMonth),
            3 => Some(PlanDuration::ThreeMonths),
            6 => Some(PlanDuration::SixMonths),
            12 => Some(PlanDuration::TwelveMonths),
            _ => None,
        }
    }
}

/// Price of a plan/duration combination in paise. The table is total over
/// both enums, so an order can never be created for an unpriced combination.
pub fn price_paise(plan_type: PlanType, duration: PlanDuration) -> i64 {
    let rupees: i64 = match (plan_type, duration) {
        (PlanType::Premium, PlanDuration::OneMonth) => 1599,
        (PlanType::Premium, PlanDuration::ThreeMonths) => 3999,
        (PlanType::Premium, PlanDuration::SixMonths) => 7999,
        (PlanType::Premium, PlanDuration::TwelveMonths) => 14999,
        (PlanType::PremiumPlus, PlanDuration::OneMonth) => 2999,
        (PlanType::PremiumPlus, PlanDuration::ThreeMonths) => 7999,
        (PlanType::PremiumPlus, PlanDuration::SixMonths) => 14999,
        (PlanType::PremiumPlus, PlanDuration::TwelveMonths) => 24999,
    };
    rupees * 100
}

/// Limits and feature flags attached to a plan. Not persisted; derived from
/// the plan type whenever a subscription is shown to a client.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlanFeatures {
    pub contacts_per_day: i64,
    pub messages_per_day: i64,
    pub profile_views: bool,
    pub advanced_search: bool,
    pub priority_support: bool,
    pub profile_highlight: bool,
}

impl PlanFeatures {
    pub fn for_plan(plan_type: PlanType) -> Self {
        match plan_type {
            PlanType::Premium => PlanFeatures {
                contacts_per_day: 10,
                messages_per_day: 50,
                profile_views: true,
                advanced_search: true,
                priority_support: false,
                profile_highlight: false,
            },
            PlanType::PremiumPlus => PlanFeatures {
                contacts_per_day: 25,
                messages_per_day: 100,
                profile_views: true,
                advanced_search: true,
                priority_support: true,
                profile_highlight: true,
            },
        }
    }
}

/// One purchasable plan/duration combination as listed by the plans endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlanOffer {
    #[serde(rename = "type")]
    pub plan_type: PlanType,
    pub duration: PlanDuration,
    pub price_paise: i64,
    pub features: PlanFeatures,
}

pub fn plan_catalog() -> Vec<PlanOffer> {
    let mut offers = Vec::with_capacity(PlanType::ALL.len() * PlanDuration::ALL.len());
    for plan_type in PlanType::ALL {
        for duration in PlanDuration::ALL {
            offers.push(PlanOffer {
                plan_type,
                duration,
                price_paise: price_paise(plan_type, duration),
                features: PlanFeatures::for_plan(plan_type),
            });
        }
    }
    offers
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlansResponse {
    pub success: bool,
    pub plans: Vec<PlanOffer>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_table_matches_rate_card() {
        assert_eq!(price_paise(PlanType::Premium, PlanDuration::OneMonth), 159_900);
        assert_eq!(
            price_paise(PlanType::Premium, PlanDuration::TwelveMonths),
            1_499_900
        );
        assert_eq!(
            price_paise(PlanType::PremiumPlus, PlanDuration::OneMonth),
            299_900
        );
        assert_eq!(
            price_paise(PlanType::PremiumPlus, PlanDuration::TwelveMonths),
            2_499_900
        );
    }

    #[test]
    fn catalog_covers_every_combination() {
        let offers = plan_catalog();
        assert_eq!(offers.len(), 8);
        assert!(
            offers
                .iter()
                .any(|offer| offer.plan_type == PlanType::PremiumPlus
                    && offer.duration == PlanDuration::SixMonths
                    && offer.price_paise == 1_499_900)
        );
    }

    #[test]
    fn premium_plus_unlocks_support_and_highlight() {
        let premium = PlanFeatures::for_plan(PlanType::Premium);
        let plus = PlanFeatures::for_plan(PlanType::PremiumPlus);

        assert!(!premium.priority_support);
        assert!(!premium.profile_highlight);
        assert_eq!(premium.contacts_per_day, 10);

        assert!(plus.priority_support);
        assert!(plus.profile_highlight);
        assert_eq!(plus.messages_per_day, 100);
    }

    #[test]
    fn plan_type_round_trips_through_wire_names() {
        let json = serde_json::to_string(&PlanType::PremiumPlus).unwrap();
        assert_eq!(json, "\"Premium Plus\"");
        let parsed: PlanDuration = serde_json::from_str("\"3 months\"").unwrap();
        assert_eq!(parsed, PlanDuration::ThreeMonths);
    }
}
