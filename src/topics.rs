use crate::domain::Conference;

/// A lowercase substring test against a source basename or conference name.
#[derive(Debug, Clone, Copy)]
pub enum Keyword {
    Contains(&'static str),
    EndsWith(&'static str),
}

impl Keyword {
    fn matches(self, haystack: &str) -> bool {
        match self {
            Keyword::Contains(needle) => haystack.contains(needle),
            Keyword::EndsWith(suffix) => haystack.ends_with(suffix),
        }
    }
}

/// Any keyword matching adds every listed topic.
#[derive(Debug, Clone, Copy)]
pub struct TopicRule {
    pub keywords: &'static [Keyword],
    pub topics: &'static [&'static str],
}

impl TopicRule {
    fn matches(&self, haystack: &str) -> bool {
        self.keywords.iter().any(|k| k.matches(haystack))
    }
}

/// Rules applied to the lowercase basename of a source URL or path.
pub const SOURCE_RULES: &[TopicRule] = &[
    TopicRule {
        keywords: &[Keyword::Contains("javascript"), Keyword::EndsWith("js.json")],
        topics: &["javascript"],
    },
    TopicRule {
        keywords: &[Keyword::Contains("python")],
        topics: &["python"],
    },
    TopicRule {
        keywords: &[Keyword::Contains("ai-ml-data-science")],
        topics: &["ai", "machine learning", "data science"],
    },
    TopicRule {
        keywords: &[Keyword::Contains("devops")],
        topics: &["devops"],
    },
];

/// Rules applied to the lowercase conference name.
pub const NAME_RULES: &[TopicRule] = &[
    TopicRule {
        keywords: &[Keyword::Contains("python")],
        topics: &["python"],
    },
    TopicRule {
        keywords: &[Keyword::Contains("javascript"), Keyword::Contains(" js")],
        topics: &["javascript"],
    },
    TopicRule {
        keywords: &[
            Keyword::Contains("ai"),
            Keyword::Contains("ml"),
            Keyword::Contains("machine learning"),
        ],
        topics: &["ai"],
    },
    TopicRule {
        keywords: &[Keyword::Contains("kube"), Keyword::Contains("kubernetes")],
        topics: &["kubernetes"],
    },
];

fn apply_rules(rules: &[TopicRule], haystack: &str, topics: &mut Vec<String>) {
    for rule in rules.iter().filter(|r| r.matches(haystack)) {
        for topic in rule.topics {
            push_unique(topics, topic);
        }
    }
}

fn push_unique(topics: &mut Vec<String>, topic: &str) {
    if !topics.iter().any(|t| t == topic) {
        topics.push(topic.to_string());
    }
}

/// Topics implied by a source's basename, in table order.
pub fn infer_source_topics(basename: &str) -> Vec<String> {
    let mut topics = Vec::new();
    apply_rules(SOURCE_RULES, &basename.to_lowercase(), &mut topics);
    topics
}

/// Seed an untagged conference with the source topics, then add any
/// topics implied by its name. Existing topics are never removed or
/// reordered.
pub fn augment_topics(conference: &mut Conference, source_topics: &[String]) {
    if conference.topics.is_empty() {
        conference.topics = source_topics.to_vec();
    }
    let name = conference.name.to_lowercase();
    apply_rules(NAME_RULES, &name, &mut conference.topics);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conference(name: &str, topics: &[&str]) -> Conference {
        Conference {
            name: name.to_string(),
            start_date: "2025-01-01".to_string(),
            end_date: "2025-01-01".to_string(),
            city: String::new(),
            country: String::new(),
            url: "https://example.com".to_string(),
            topics: topics.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_infer_source_topics_from_basename() {
        assert_eq!(infer_source_topics("javascript.json"), vec!["javascript"]);
        assert_eq!(infer_source_topics("nodejs.json"), vec!["javascript"]);
        assert_eq!(infer_source_topics("Python.json"), vec!["python"]);
        assert_eq!(
            infer_source_topics("ai-ml-data-science.json"),
            vec!["ai", "machine learning", "data science"]
        );
        assert_eq!(infer_source_topics("devops.json"), vec!["devops"]);
        assert!(infer_source_topics("general.json").is_empty());
    }

    #[test]
    fn test_source_topics_only_seed_untagged_records() {
        let seed = vec!["devops".to_string()];

        let mut untagged = conference("Platform Days", &[]);
        augment_topics(&mut untagged, &seed);
        assert_eq!(untagged.topics, vec!["devops"]);

        let mut tagged = conference("Platform Days", &["cloud"]);
        augment_topics(&mut tagged, &seed);
        assert_eq!(tagged.topics, vec!["cloud"]);
    }

    #[test]
    fn test_name_keywords_are_additive_and_unique() {
        let mut conf = conference("PyData Python Summit", &["data", "python"]);
        augment_topics(&mut conf, &[]);
        assert_eq!(conf.topics, vec!["data", "python"]);

        let mut kube = conference("KubeCon Europe", &["cloud"]);
        augment_topics(&mut kube, &[]);
        assert_eq!(kube.topics, vec!["cloud", "kubernetes"]);
    }

    #[test]
    fn test_name_rules_follow_seeded_topics() {
        let mut conf = conference("Node JS Interactive", &[]);
        augment_topics(&mut conf, &["devops".to_string()]);
        assert_eq!(conf.topics, vec!["devops", "javascript"]);
    }

    #[test]
    fn test_ai_keyword_matches_substrings() {
        let mut conf = conference("Applied ML Days", &[]);
        augment_topics(&mut conf, &[]);
        assert_eq!(conf.topics, vec!["ai"]);
    }
}
