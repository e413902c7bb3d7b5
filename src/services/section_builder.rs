//! 描述段落构建 - 业务能力层
//!
//! 每次只构建一个命名段落，段落是否启用由配置决定。

use std::fmt;
use std::str::FromStr;

use crate::config::DescriptionGeneratorConfig;
use crate::models::attributes::ItemAttributes;

/// 描述段落
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Overview,
    Specifications,
    Condition,
    History,
    ValueProposition,
}

impl SectionKind {
    pub const ALL: [SectionKind; 5] = [
        SectionKind::Overview,
        SectionKind::Specifications,
        SectionKind::Condition,
        SectionKind::History,
        SectionKind::ValueProposition,
    ];

    /// 配置中使用的名称
    pub fn name(self) -> &'static str {
        match self {
            SectionKind::Overview => "overview",
            SectionKind::Specifications => "specifications",
            SectionKind::Condition => "condition",
            SectionKind::History => "history",
            SectionKind::ValueProposition => "value_proposition",
        }
    }

    /// 段落标题（全大写）
    pub fn heading(self) -> &'static str {
        match self {
            SectionKind::Overview => "OVERVIEW",
            SectionKind::Specifications => "SPECIFICATIONS",
            SectionKind::Condition => "CONDITION",
            SectionKind::History => "HISTORICAL CONTEXT",
            SectionKind::ValueProposition => "VALUE PROPOSITION",
        }
    }

    /// 该段落在当前配置下是否会产出内容
    pub fn is_enabled(self, config: &DescriptionGeneratorConfig) -> bool {
        match self {
            SectionKind::Specifications => config.include_specifications,
            SectionKind::History => config.include_history,
            _ => true,
        }
    }
}

impl FromStr for SectionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s.trim())
            .ok_or_else(|| format!("未知段落: {}", s))
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 按名称构建段落；未知名称或未启用的段落返回空字符串
pub fn build_named(name: &str, attrs: &ItemAttributes, config: &DescriptionGeneratorConfig) -> String {
    match name.parse::<SectionKind>() {
        Ok(kind) => build(kind, attrs, config),
        Err(_) => String::new(),
    }
}

/// 构建段落
pub fn build(kind: SectionKind, attrs: &ItemAttributes, config: &DescriptionGeneratorConfig) -> String {
    if !kind.is_enabled(config) {
        return String::new();
    }

    let body = match kind {
        SectionKind::Overview => overview(attrs),
        SectionKind::Specifications => specifications(attrs),
        SectionKind::Condition => condition(attrs),
        SectionKind::History => history(attrs, config.include_story),
        SectionKind::ValueProposition => value_proposition(attrs),
    };

    format!("{}\n\n{}", kind.heading(), body)
}

fn overview(info: &ItemAttributes) -> String {
    let mut text = format!(
        "This listing features a {} {}",
        info.get_or("year", "Unknown"),
        info.get_or("denomination", "Coin")
    );
    let mint_mark = info.get_or("mint_mark", "");
    if !mint_mark.is_empty() {
        text.push_str(&format!(" with {} mint mark", mint_mark));
    }
    text.push_str(". ");
    text.push_str("This piece represents an excellent addition to any collection, ");
    text.push_str("combining historical significance with numismatic value.");
    text
}

const SPECIFICATION_FIELDS: [(&str, &str); 8] = [
    ("Year", "year"),
    ("Denomination", "denomination"),
    ("Mint Mark", "mint_mark"),
    ("Composition", "metal_content"),
    ("Weight", "weight"),
    ("Diameter", "diameter"),
    ("Designer", "designer"),
    ("Mintage", "mintage"),
];

fn specifications(info: &ItemAttributes) -> String {
    SPECIFICATION_FIELDS
        .iter()
        .map(|(label, key)| format!("• {}: {}", label, info.get_or(key, "N/A")))
        .collect::<Vec<_>>()
        .join("\n")
}

fn condition(info: &ItemAttributes) -> String {
    format!(
        "Grade: {}\n\n\
         This coin has been carefully examined and graded according to \
         industry standards. Please refer to the high-resolution images \
         provided to assess the condition yourself. The coin shows \
         characteristics typical of its grade, with expected wear patterns \
         consistent with its age and circulation history.",
        info.get_or("condition", "Used")
    )
}

fn history(info: &ItemAttributes, include_story: bool) -> String {
    let mut text = String::new();

    let historical_context = info.get_or("historical_context", "");
    if !historical_context.is_empty() {
        text.push_str(historical_context);
        text.push_str("\n\n");
    }

    let story = info.get_or("story", "");
    if include_story && !story.is_empty() {
        text.push_str(story);
        text.push(' ');
    }

    text.push_str("Each coin tells a unique story, connecting us to the past and ");
    text.push_str("preserving a tangible piece of history for future generations.");
    text
}

fn value_proposition(info: &ItemAttributes) -> String {
    let mut text = format!(
        "Estimated Value Range: {}\n\n",
        info.get_or("estimated_value", "Market dependent")
    );

    let investment_potential = info.get_or("investment_potential", "");
    if !investment_potential.is_empty() {
        text.push_str(investment_potential);
        text.push(' ');
    }

    text.push_str("This coin offers both numismatic and intrinsic value. ");
    text.push_str("Silver coins have shown consistent demand among collectors and investors. ");
    text.push_str("The combination of historical significance, precious metal content, ");
    text.push_str("and collectible appeal makes this an attractive acquisition opportunity.");
    text.push_str("\n\nDon't miss this chance to add a piece of history to your collection!");
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> ItemAttributes {
        [
            ("year", "1921"),
            ("denomination", "Morgan Dollar"),
            ("mint_mark", "S"),
            ("condition", "Fine"),
            ("historical_context", "Minted 1878-1904 and 1921."),
            ("story", "A pivotal era."),
            ("estimated_value", "$25-35"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_overview_mentions_mint_mark() {
        let text = build(SectionKind::Overview, &info(), &DescriptionGeneratorConfig::default());
        assert!(text.starts_with("OVERVIEW\n\n"));
        assert!(text.contains("This listing features a 1921 Morgan Dollar with S mint mark. "));

        let text = build(
            SectionKind::Overview,
            &ItemAttributes::new(),
            &DescriptionGeneratorConfig::default(),
        );
        assert!(text.contains("This listing features a Unknown Coin. "));
        assert!(!text.contains("mint mark"));
    }

    #[test]
    fn test_specifications_default_to_na() {
        let text = build(
            SectionKind::Specifications,
            &info(),
            &DescriptionGeneratorConfig::default(),
        );
        assert!(text.starts_with("SPECIFICATIONS\n\n"));
        assert_eq!(text.lines().filter(|l| l.starts_with("• ")).count(), 8);
        assert!(text.contains("• Year: 1921"));
        assert!(text.contains("• Composition: N/A"));
        assert!(text.contains("• Mintage: N/A"));
    }

    #[test]
    fn test_disabled_sections_are_empty() {
        let config = DescriptionGeneratorConfig {
            include_specifications: false,
            include_history: false,
            ..Default::default()
        };
        assert!(build(SectionKind::Specifications, &info(), &config).is_empty());
        assert!(build(SectionKind::History, &info(), &config).is_empty());
        assert!(!build(SectionKind::Condition, &info(), &config).is_empty());
    }

    #[test]
    fn test_history_story_toggle() {
        let with_story = build(
            SectionKind::History,
            &info(),
            &DescriptionGeneratorConfig::default(),
        );
        assert!(with_story.starts_with("HISTORICAL CONTEXT\n\nMinted 1878-1904 and 1921.\n\nA pivotal era. Each coin"));

        let config = DescriptionGeneratorConfig {
            include_story: false,
            ..Default::default()
        };
        let without_story = build(SectionKind::History, &info(), &config);
        assert!(!without_story.contains("A pivotal era."));
        assert!(without_story.contains("Minted 1878-1904 and 1921."));
    }

    #[test]
    fn test_value_proposition_and_condition() {
        let config = DescriptionGeneratorConfig::default();
        let value = build(SectionKind::ValueProposition, &info(), &config);
        assert!(value.contains("Estimated Value Range: $25-35"));
        assert!(value.ends_with("add a piece of history to your collection!"));

        let value = build(SectionKind::ValueProposition, &ItemAttributes::new(), &config);
        assert!(value.contains("Estimated Value Range: Market dependent"));

        let condition = build(SectionKind::Condition, &info(), &config);
        assert!(condition.starts_with("CONDITION\n\nGrade: Fine\n\n"));
    }

    #[test]
    fn test_unknown_section_name() {
        let config = DescriptionGeneratorConfig::default();
        assert!(build_named("provenance", &info(), &config).is_empty());
        assert!(build_named("overview", &info(), &config).starts_with("OVERVIEW"));
        assert_eq!("value_proposition".parse::<SectionKind>(), Ok(SectionKind::ValueProposition));
    }
}
