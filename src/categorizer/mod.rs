pub mod cache;
pub mod remote;
pub mod service;

pub use cache::CategoryCache;
pub use remote::{AnalyzeRequest, AnalyzeResponse, HttpCategorizer, RemoteCategorizer};
pub use service::{CategorizationService, Classification, ClassificationSource};

use crate::models::Category;

/// Which part of a navigation a trigger is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchScope {
    Domain,
    Url,
    Either,
}

/// Trigger table in category-definition order.
const TRIGGER_RULES: &[(Category, MatchScope, &[&str])] = &[
    (Category::Adult, MatchScope::Either, &["porn", "xxx", "adult", "sex", "nude", "naked"]),
    (Category::Gambling, MatchScope::Domain, &["casino", "poker", "bet", "gambling", "slots"]),
    (Category::Violence, MatchScope::Domain, &["gore", "violent", "violence"]),
    (Category::Drugs, MatchScope::Domain, &["drugs", "cannabis", "marijuana", "cocaine"]),
    (Category::Weapons, MatchScope::Domain, &["guns", "firearm", "ammo", "weapon"]),
    (
        Category::Social,
        MatchScope::Domain,
        &["facebook", "twitter", "instagram", "tiktok", "snapchat", "linkedin"],
    ),
    (
        Category::Entertainment,
        MatchScope::Domain,
        &["youtube", "netflix", "hulu", "disney", "spotify"],
    ),
    (
        Category::Gaming,
        MatchScope::Domain,
        &["steam", "xbox", "playstation", "twitch", "roblox", "minecraft", "game", "gaming", "play"],
    ),
    (Category::News, MatchScope::Domain, &["cnn", "bbc", "reuters", "news", "times", "post"]),
    (Category::Shopping, MatchScope::Domain, &["amazon", "ebay", "shop", "store", "buy"]),
    (
        Category::Education,
        MatchScope::Domain,
        &["edu", "learn", "course", "school", "university", "khan"],
    ),
    (
        Category::Spam,
        MatchScope::Url,
        &["free-download", "click-here", "winner", "congratulations"],
    ),
    (
        Category::Phishing,
        MatchScope::Url,
        &["phish", "verify-account", "account-verify", "login-secure"],
    ),
    (
        Category::Malware,
        MatchScope::Either,
        &["malware", "keygen", "warez", "crack-download"],
    ),
];

/// Local keyword heuristic. Stateless and deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct Categorizer;

impl Categorizer {
    pub fn new() -> Self {
        Self
    }

    /// Tags whose triggers occur in the scoped text, in definition order.
    /// An empty result means uncategorized.
    pub fn classify(&self, domain: &str, url: &str) -> Vec<Category> {
        let domain = domain.to_lowercase();
        let url = url.to_lowercase();

        TRIGGER_RULES
            .iter()
            .filter(|(_, scope, triggers)| {
                triggers.iter().any(|t| Self::scope_matches(*scope, t, &domain, &url))
            })
            .map(|(category, _, _)| *category)
            .collect()
    }

    fn scope_matches(scope: MatchScope, trigger: &str, domain: &str, url: &str) -> bool {
        match scope {
            MatchScope::Domain => domain.contains(trigger),
            MatchScope::Url => url.contains(trigger),
            MatchScope::Either => domain.contains(trigger) || url.contains(trigger),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uncategorized_domain() {
        let categorizer = Categorizer::new();
        assert!(categorizer.classify("example.org", "https://example.org/").is_empty());
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        let categorizer = Categorizer::new();
        let lower = categorizer.classify("bet365-casino.com", "https://bet365-casino.com/");
        let upper = categorizer.classify("BET365-CASINO.COM", "HTTPS://BET365-CASINO.COM/");
        assert_eq!(lower, vec![Category::Gambling]);
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_education_domain() {
        let categorizer = Categorizer::new();
        assert_eq!(
            categorizer.classify("khanacademy.org", "https://khanacademy.org/math"),
            vec![Category::Education]
        );
    }

    #[test]
    fn test_url_scope_ignores_domain() {
        let categorizer = Categorizer::new();
        assert_eq!(
            categorizer.classify("example.com", "https://example.com/click-here/now"),
            vec![Category::Spam]
        );
        // Url-scoped triggers in the domain alone do not count when the url lacks them.
        assert!(categorizer.classify("winner.com", "").is_empty());
    }

    #[test]
    fn test_domain_scope_ignores_path() {
        let categorizer = Categorizer::new();
        assert!(categorizer
            .classify("example.com", "https://example.com/casino")
            .is_empty());
    }

    #[test]
    fn test_either_scope_matches_path() {
        let categorizer = Categorizer::new();
        assert_eq!(
            categorizer.classify("files.example.com", "https://files.example.com/keygen.zip"),
            vec![Category::Malware]
        );
    }

    #[test]
    fn test_multiple_tags_follow_definition_order() {
        let categorizer = Categorizer::new();
        let tags = categorizer.classify("news-casino-shop.com", "https://news-casino-shop.com/");
        assert_eq!(tags, vec![Category::Gambling, Category::News, Category::Shopping]);
    }

    #[test]
    fn test_no_duplicates_when_several_triggers_match() {
        let categorizer = Categorizer::new();
        let tags = categorizer.classify("pokercasino.bet", "https://pokercasino.bet/");
        assert_eq!(tags, vec![Category::Gambling]);
    }
}
