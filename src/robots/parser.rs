//! Robots.txt parser implementation
//!
//! Allow/deny decisions are delegated to the robotstxt crate, which implements
//! longest-match precedence with ties resolved in favour of `Allow`. The group
//! walk below only exists to surface the rule lists, crawl-delay and sitemaps
//! that the matcher does not expose.

use robotstxt::DefaultMatcher;

/// Rules of the robots.txt group that applies to one user agent
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RobotsGroup {
    pub allow: Vec<String>,
    pub disallow: Vec<String>,
    /// Crawl-delay in seconds
    pub crawl_delay: Option<f64>,
}

/// Parsed robots.txt data
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt content (empty string means allow all)
    content: String,
    allow_all: bool,
}

/// One `User-agent` block while walking the file
#[derive(Debug, Default)]
struct RawGroup {
    agents: Vec<String>,
    rules: RobotsGroup,
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Creates a permissive ParsedRobots that allows everything
    ///
    /// Used when robots.txt is missing or could not be fetched.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    /// Checks if a URL is allowed for the given product token
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute URL to check
    /// * `product_token` - Crawler name matched against `User-agent` lines
    pub fn is_allowed(&self, url: &str, product_token: &str) -> bool {
        if self.allow_all || self.content.trim().is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, product_token, url)
    }

    /// Returns the group that applies to `product_token`
    ///
    /// Groups whose product token equals ours (case-insensitively) are
    /// merged; when none exist the `*` groups apply instead. Agents are
    /// matched the same way `is_allowed` matches them.
    pub fn group_for(&self, product_token: &str) -> RobotsGroup {
        if self.allow_all {
            return RobotsGroup::default();
        }

        let groups = self.groups();

        let specific: Vec<&RawGroup> = groups
            .iter()
            .filter(|g| {
                g.agents
                    .iter()
                    .any(|a| !a.is_empty() && a != "*" && a.eq_ignore_ascii_case(product_token))
            })
            .collect();

        let chosen = if specific.is_empty() {
            groups
                .iter()
                .filter(|g| g.agents.iter().any(|a| a == "*"))
                .collect()
        } else {
            specific
        };

        chosen.into_iter().fold(RobotsGroup::default(), |mut acc, g| {
            acc.allow.extend(g.rules.allow.iter().cloned());
            acc.disallow.extend(g.rules.disallow.iter().cloned());
            if acc.crawl_delay.is_none() {
                acc.crawl_delay = g.rules.crawl_delay;
            }
            acc
        })
    }

    /// Crawl-delay in seconds for `product_token`, if declared
    pub fn crawl_delay(&self, product_token: &str) -> Option<f64> {
        self.group_for(product_token).crawl_delay
    }

    /// `Sitemap` URLs; these are global and not tied to any group
    pub fn sitemaps(&self) -> Vec<String> {
        self.directives()
            .filter(|(key, _)| key == "sitemap")
            .map(|(_, value)| value.to_string())
            .filter(|v| !v.is_empty())
            .collect()
    }

    fn directives(&self) -> impl Iterator<Item = (String, &str)> + '_ {
        self.content.lines().filter_map(|line| {
            let line = match line.find('#') {
                Some(idx) => &line[..idx],
                None => line,
            };
            let (key, value) = line.split_once(':')?;
            Some((key.trim().to_lowercase(), value.trim()))
        })
    }

    fn groups(&self) -> Vec<RawGroup> {
        let mut groups: Vec<RawGroup> = Vec::new();
        let mut current = RawGroup::default();
        let mut in_rules = false;

        for (key, value) in self.directives() {
            match key.as_str() {
                "user-agent" => {
                    // A user-agent line after rules starts a new group
                    if in_rules {
                        groups.push(std::mem::take(&mut current));
                        in_rules = false;
                    }
                    current.agents.push(agent_token(value));
                }
                "allow" | "disallow" | "crawl-delay" => {
                    if current.agents.is_empty() {
                        continue;
                    }
                    in_rules = true;
                    match key.as_str() {
                        "allow" if !value.is_empty() => current.rules.allow.push(value.to_string()),
                        "disallow" if !value.is_empty() => {
                            current.rules.disallow.push(value.to_string())
                        }
                        "crawl-delay" => {
                            if let Ok(delay) = value.parse::<f64>() {
                                if delay.is_finite() && delay >= 0.0 {
                                    current.rules.crawl_delay = Some(delay);
                                }
                            }
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }

        if !current.agents.is_empty() {
            groups.push(current);
        }
        groups
    }
}

/// Product token of a `User-agent` value, or `*` for the wildcard
///
/// `FairwayBot/2.1` yields `fairwaybot`: the token stops at the first
/// character outside letters, `-` and `_`.
fn agent_token(value: &str) -> String {
    if value
        .strip_prefix('*')
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
    {
        return "*".to_string();
    }
    value
        .chars()
        .take_while(|c| c.is_ascii_alphabetic() || *c == '-' || *c == '_')
        .collect::<String>()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROBOTS: &str = "\
User-agent: *
Disallow: /private/
Allow: /private/scorecard
Crawl-delay: 5

User-agent: FairwayBot
User-agent: OtherBot
Disallow: /members
Crawl-delay: 1.5

Sitemap: https://example.com/sitemap.xml
";

    #[test]
    fn test_allow_all_allows_everything() {
        let robots = ParsedRobots::allow_all();
        assert!(robots.is_allowed("https://example.com/anything", "FairwayBot"));
        assert!(robots.sitemaps().is_empty());
    }

    #[test]
    fn test_empty_content_allows_everything() {
        let robots = ParsedRobots::from_content("");
        assert!(robots.is_allowed("https://example.com/private/", "FairwayBot"));
    }

    #[test]
    fn test_wildcard_group_applies_to_unknown_agent() {
        let robots = ParsedRobots::from_content(ROBOTS);
        assert!(!robots.is_allowed("https://example.com/private/notes", "SomeBot"));
        assert!(robots.is_allowed("https://example.com/course", "SomeBot"));
    }

    #[test]
    fn test_longest_match_allow_wins() {
        let robots = ParsedRobots::from_content(ROBOTS);
        assert!(robots.is_allowed("https://example.com/private/scorecard", "SomeBot"));
    }

    #[test]
    fn test_specific_group_replaces_wildcard() {
        let robots = ParsedRobots::from_content(ROBOTS);
        assert!(!robots.is_allowed("https://example.com/members/list", "FairwayBot"));
        assert!(robots.is_allowed("https://example.com/private/notes", "FairwayBot"));
    }

    #[test]
    fn test_group_for_specific_agent() {
        let robots = ParsedRobots::from_content(ROBOTS);
        let group = robots.group_for("FairwayBot");
        assert_eq!(group.disallow, vec!["/members".to_string()]);
        assert!(group.allow.is_empty());
        assert_eq!(group.crawl_delay, Some(1.5));
    }

    #[test]
    fn test_group_for_requires_exact_token() {
        let robots = ParsedRobots::from_content(
            "User-agent: Fairway\nCrawl-delay: 9\nDisallow: /short\n\nUser-agent: *\nCrawl-delay: 2\n",
        );

        let group = robots.group_for("FairwayBot");
        assert!(group.disallow.is_empty());
        assert_eq!(group.crawl_delay, Some(2.0));
        assert!(robots.is_allowed("https://example.com/short", "FairwayBot"));
    }

    #[test]
    fn test_group_for_ignores_case_and_version() {
        let robots = ParsedRobots::from_content(
            "User-agent: fairwaybot/2.1\nCrawl-delay: 3\nDisallow: /members\n\nUser-agent: *\nCrawl-delay: 8\n",
        );

        let group = robots.group_for("FairwayBot");
        assert_eq!(group.crawl_delay, Some(3.0));
        assert_eq!(group.disallow, vec!["/members".to_string()]);
        assert!(!robots.is_allowed("https://example.com/members/list", "FairwayBot"));
    }

    #[test]
    fn test_group_for_falls_back_to_wildcard() {
        let robots = ParsedRobots::from_content(ROBOTS);
        let group = robots.group_for("SomeBot");
        assert_eq!(group.disallow, vec!["/private/".to_string()]);
        assert_eq!(group.allow, vec!["/private/scorecard".to_string()]);
        assert_eq!(robots.crawl_delay("SomeBot"), Some(5.0));
    }

    #[test]
    fn test_sitemaps_collected() {
        let robots = ParsedRobots::from_content(ROBOTS);
        assert_eq!(
            robots.sitemaps(),
            vec!["https://example.com/sitemap.xml".to_string()]
        );
    }

    #[test]
    fn test_invalid_crawl_delay_ignored() {
        let robots = ParsedRobots::from_content("User-agent: *\nCrawl-delay: soon\n");
        assert_eq!(robots.crawl_delay("FairwayBot"), None);
    }

    #[test]
    fn test_comments_stripped() {
        let robots =
            ParsedRobots::from_content("User-agent: * # everyone\nDisallow: /tmp # scratch\n");
        assert_eq!(robots.group_for("x").disallow, vec!["/tmp".to_string()]);
    }
}
