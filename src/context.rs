//! Context assembly for the LLM prompt.
//!
//! Scans the question for fixed keyword sets to decide which sections
//! apply, then concatenates the matching textual summaries: weather
//! (current + 3-day, then the 4–10 day mid-range blocks), the current
//! month's farming calendar (always), and soil/pest advice when their
//! keywords match. Plain substring matching, no stemming.

use chrono::{Datelike, Local, NaiveDateTime};
use std::collections::HashSet;
use std::sync::Arc;

use crate::knowledge::KnowledgeBase;
use crate::weather::client::{Fetched, LandOutlook, WeatherClient};

/// A context section gated by question keywords. The farming calendar
/// is unconditional and has no tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionTag {
    Weather,
    Soil,
    Pest,
}

const WEATHER_KEYWORDS: &[&str] = &[
    "날씨", "기온", "비", "온도", "습도", "바람", "강수", "예보", "주간", "이번주", "다음주",
];

const SOIL_KEYWORDS: &[&str] = &["토양", "흙", "땅", "비료", "ph"];

const PEST_KEYWORDS: &[&str] = &["병", "해충", "벌레", "방제", "약", "병해충", "응애", "깍지"];

/// Which optional sections a question asks for. Pure function of the
/// question text; case-insensitive substring matching.
pub fn section_tags(question: &str) -> HashSet<SectionTag> {
    let q = question.to_lowercase();
    let mut tags = HashSet::new();
    if WEATHER_KEYWORDS.iter().any(|kw| q.contains(kw)) {
        tags.insert(SectionTag::Weather);
    }
    if SOIL_KEYWORDS.iter().any(|kw| q.contains(kw)) {
        tags.insert(SectionTag::Soil);
    }
    if PEST_KEYWORDS.iter().any(|kw| q.contains(kw)) {
        tags.insert(SectionTag::Pest);
    }
    tags
}

pub struct ContextBuilder {
    weather: Arc<WeatherClient>,
    knowledge: Arc<KnowledgeBase>,
}

impl ContextBuilder {
    pub fn new(weather: Arc<WeatherClient>, knowledge: Arc<KnowledgeBase>) -> Self {
        Self { weather, knowledge }
    }

    pub async fn build(&self, question: &str, region: &str) -> String {
        self.build_at(question, region, Local::now().naive_local())
            .await
    }

    /// Assemble the context block for a question. Sections are joined
    /// with blank lines; with no optional section the calendar entry
    /// alone is returned.
    pub async fn build_at(&self, question: &str, region: &str, now: NaiveDateTime) -> String {
        let tags = section_tags(question);
        let month = now.date().month();
        let mut sections: Vec<String> = Vec::new();

        if tags.contains(&SectionTag::Weather) {
            let summary = self.weather.context_summary_at(region, now).await;
            sections.push(format!("=== 현재 날씨 및 3일 예보 ===\n{summary}"));

            if let Some(block) = self.mid_range_block(region, now).await {
                sections.push(block);
            }
        }

        if let Some(entry) = self.knowledge.calendar(month) {
            sections.push(format!(
                "=== 이달의 농사 정보 ===\n주요 작업: {}\n팁: {}",
                entry.tasks.join(", "),
                entry.tip
            ));
        }

        if tags.contains(&SectionTag::Soil) {
            sections.push(format!(
                "=== 토양 관리 ===\n{}",
                self.knowledge.soil_advice(month)
            ));
        }

        if tags.contains(&SectionTag::Pest) {
            let pests = self.knowledge.pest_alert(month);
            sections.push(format!(
                "=== 병해충 정보 ===\n주의 병해충: {}\n예방 조치: {}",
                pests.high_risk.join(", "),
                pests.prevention
            ));
        }

        sections.join("\n\n")
    }

    /// The 4–10 day block: temperature lines first, then the land
    /// forecast lines. Omitted entirely when the temperature forecast
    /// is unavailable; the land lines are omitted independently.
    async fn mid_range_block(&self, region: &str, now: NaiveDateTime) -> Option<String> {
        let mid_temp = self.weather.mid_range_temperature_at(region, now).await;
        let temps = match &mid_temp {
            Fetched::Ready(t) => t,
            Fetched::Unavailable { .. } => return None,
        };

        let mut lines = vec!["=== 중기예보 (4-10일 후) ===".to_string()];
        for (day, range) in temps {
            lines.push(format!(
                "{day}일 후: 최저 {}°C, 최고 {}°C",
                range.min_temp, range.max_temp
            ));
        }

        if let Fetched::Ready(land) = self.weather.mid_range_land_at(region, now).await {
            for outlook in land.values() {
                match outlook {
                    LandOutlook::AmPm {
                        am_weather,
                        pm_weather,
                        am_rain_prob,
                        pm_rain_prob,
                    } => {
                        lines.push(format!("  - 오전: {am_weather} (강수확률 {am_rain_prob}%)"));
                        lines.push(format!("  - 오후: {pm_weather} (강수확률 {pm_rain_prob}%)"));
                    }
                    LandOutlook::AllDay { weather, rain_prob } => {
                        lines.push(format!("  - 날씨: {weather} (강수확률 {rain_prob}%)"));
                    }
                }
            }
        }

        Some(lines.join("\n"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_weather_question() {
        let tags = section_tags("제주 날씨 어때?");
        assert!(tags.contains(&SectionTag::Weather));
        assert!(!tags.contains(&SectionTag::Soil));
        assert!(!tags.contains(&SectionTag::Pest));
    }

    #[test]
    fn test_tags_soil_question_case_insensitive() {
        let tags = section_tags("토양 PH 조정은 어떻게 하나요?");
        assert!(tags.contains(&SectionTag::Soil));
    }

    #[test]
    fn test_tags_pest_question() {
        let tags = section_tags("응애 방제 약 추천해주세요");
        assert!(tags.contains(&SectionTag::Pest));
    }

    #[test]
    fn test_tags_combined_question() {
        let tags = section_tags("이번주 비 오면 병해충 방제 미뤄야 하나요?");
        assert!(tags.contains(&SectionTag::Weather));
        assert!(tags.contains(&SectionTag::Pest));
    }

    #[test]
    fn test_tags_plain_question_matches_nothing() {
        let tags = section_tags("감귤 수확은 언제 하나요?");
        assert!(tags.is_empty());
    }
}
