//! Identity boundary.
//!
//! The core only needs to know who the authenticated actor is and what
//! subscription tier they are on. Everything else about accounts lives
//! outside this service.

use std::collections::HashMap;

use crate::config::AccountConfig;

/// Subscription tier, determining the monthly quota ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Free,
    Unlimited,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Unlimited => "unlimited",
        }
    }

    /// Unknown tier strings fall back to free, never to unlimited.
    pub fn parse(s: &str) -> Tier {
        match s {
            "unlimited" | "pro" | "paid" => Tier::Unlimited,
            _ => Tier::Free,
        }
    }
}

/// The authenticated actor behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub tier: Tier,
}

/// Resolves a bearer token to an actor. Supplied by the surrounding system;
/// the static provider below is the built-in implementation.
pub trait IdentityProvider: Send + Sync {
    fn authenticate(&self, token: Option<&str>) -> Option<Actor>;
}

/// Token-to-actor lookup from config-declared accounts.
pub struct StaticTokenProvider {
    accounts: HashMap<String, Actor>,
}

impl StaticTokenProvider {
    pub fn new(accounts: &[AccountConfig]) -> Self {
        let accounts = accounts
            .iter()
            .map(|a| {
                (
                    a.token.clone(),
                    Actor {
                        id: a.id.clone(),
                        tier: Tier::parse(&a.tier),
                    },
                )
            })
            .collect();

        Self { accounts }
    }
}

impl IdentityProvider for StaticTokenProvider {
    fn authenticate(&self, token: Option<&str>) -> Option<Actor> {
        token.and_then(|t| self.accounts.get(t).cloned())
    }
}
