//! Static farming knowledge tables.
//!
//! Month-keyed lookup tables for citrus farming: a 12-month work
//! calendar, seasonal pest risk, and seasonal soil advice. All tables
//! are process-wide constants built once at startup and injected by
//! reference; there is no computation beyond lookup by month.

/// One month's entry in the farming calendar.
#[derive(Debug, Clone)]
pub struct CalendarEntry {
    pub tasks: &'static [&'static str],
    pub tip: &'static str,
}

/// Seasonal pest alert: what to watch for and how to prevent it.
#[derive(Debug, Clone)]
pub struct PestAlert {
    pub high_risk: &'static [&'static str],
    pub prevention: &'static str,
}

const CALENDAR: [CalendarEntry; 12] = [
    CalendarEntry {
        tasks: &["수확 마무리", "전정 준비", "동해 방지"],
        tip: "동해 방지를 위해 수분 관리가 중요합니다",
    },
    CalendarEntry {
        tasks: &["전정 작업", "토양 개량", "유기질 비료 투입"],
        tip: "2월 중순까지 전정 완료가 필요합니다",
    },
    CalendarEntry {
        tasks: &["봄 거름 주기", "병해충 예방 약제 살포"],
        tip: "새순이 나오기 전 방제를 완료하세요",
    },
    CalendarEntry {
        tasks: &["개화 관리", "수분 관리", "적화"],
        tip: "꽃이 지면서 착과가 시작됩니다",
    },
    CalendarEntry {
        tasks: &["적과 1차", "관수 시작", "웃거름"],
        tip: "과다 착과 시 적과가 필수입니다",
    },
    CalendarEntry {
        tasks: &["적과 2차", "여름 거름", "초생재배 관리"],
        tip: "고온기 물 관리가 중요합니다",
    },
    CalendarEntry {
        tasks: &["태풍 대비", "병해충 집중 방제", "배수로 점검"],
        tip: "태풍 시기, 지주를 점검하세요",
    },
    CalendarEntry {
        tasks: &["가뭄 대비 관수", "여름 순 제거"],
        tip: "고온 스트레스에 주의하세요",
    },
    CalendarEntry {
        tasks: &["가을 거름", "착색 관리 시작", "과실 비대"],
        tip: "착색기 질소 과다를 주의하세요",
    },
    CalendarEntry {
        tasks: &["수확 준비", "당도 체크", "착색 촉진"],
        tip: "극조생종 수확이 시작됩니다",
    },
    CalendarEntry {
        tasks: &["본격 수확", "저장고 관리", "선별 작업"],
        tip: "조생종 수확 적기입니다",
    },
    CalendarEntry {
        tasks: &["수확 지속", "저장 관리", "월동 준비"],
        tip: "보통종 수확이 시작됩니다",
    },
];

const SUMMER_PESTS: PestAlert = PestAlert {
    high_risk: &["응애", "깍지벌레", "귤녹응애"],
    prevention: "고온다습한 여름철, 병해충 발생이 많습니다. \
                 주 1회 과수원 점검과 예방 방제를 권장합니다.",
};

const OFF_SEASON_PESTS: PestAlert = PestAlert {
    high_risk: &["궤양병"],
    prevention: "비교적 병해충 발생이 적은 시기입니다. 정기 점검을 유지하세요.",
};

/// Immutable knowledge base, constructed once and shared by reference.
#[derive(Debug, Default)]
pub struct KnowledgeBase;

impl KnowledgeBase {
    pub fn new() -> Self {
        Self
    }

    /// Farming calendar entry for a calendar month (1–12).
    pub fn calendar(&self, month: u32) -> Option<&'static CalendarEntry> {
        match month {
            1..=12 => Some(&CALENDAR[(month - 1) as usize]),
            _ => None,
        }
    }

    /// Seasonal pest alert. May through August is the high-risk window.
    pub fn pest_alert(&self, month: u32) -> &'static PestAlert {
        if (5..=8).contains(&month) {
            &SUMMER_PESTS
        } else {
            &OFF_SEASON_PESTS
        }
    }

    /// Seasonal soil-management advice.
    pub fn soil_advice(&self, month: u32) -> &'static str {
        match month {
            3..=5 => {
                "봄철에는 석회 비료로 토양 pH를 5.5-6.5로 조정하고, \
                 유기질 비료를 충분히 투입하세요."
            }
            6..=8 => "여름철에는 멀칭으로 토양 수분을 유지하고, 배수가 잘 되도록 관리하세요.",
            9..=11 => {
                "가을철에는 수확 전 칼륨 비료를 추가하여 당도를 높이고, 착색을 개선하세요."
            }
            _ => "겨울철에는 동해 방지를 위해 토양 피복과 수분 관리에 신경 쓰세요.",
        }
    }
}
