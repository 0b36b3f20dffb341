use serde::Serialize;

use crate::db::Project;

/// Fixed-weight scoring over a project record. Higher score means higher
/// risk. This is a heuristic, not a model; the weights are part of the
/// product behavior and covered by tests.
const BASELINE: i32 = 50;
const AUDIT_RELIEF: i32 = -15;
const KYC_RELIEF: i32 = -10;
const PUBLIC_TEAM_RELIEF: i32 = -10;
const WHITEPAPER_RELIEF: i32 = -5;
const WEBSITE_RELIEF: i32 = -5;
const THIN_DESCRIPTION_PENALTY: i32 = 10;
const OUTSIZED_RAISE_PENALTY: i32 = 15;
const NO_RAISE_TARGET_PENALTY: i32 = 5;

const THIN_DESCRIPTION_CHARS: usize = 80;
const OUTSIZED_RAISE_USD: i64 = 50_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskSignal {
    pub label: &'static str,
    pub delta: i32,
    pub note: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskReport {
    pub score: u8,
    pub band: RiskBand,
    pub signals: Vec<RiskSignal>,
}

pub fn assess(project: &Project) -> RiskReport {
    let mut score = BASELINE;
    let mut signals = Vec::new();

    if project.audited {
        score += AUDIT_RELIEF;
        signals.push(RiskSignal {
            label: "audit",
            delta: AUDIT_RELIEF,
            note: "smart contracts audited".to_string(),
        });
    } else {
        signals.push(RiskSignal {
            label: "audit",
            delta: 0,
            note: "no audit on record".to_string(),
        });
    }

    if project.kyc_verified {
        score += KYC_RELIEF;
        signals.push(RiskSignal {
            label: "kyc",
            delta: KYC_RELIEF,
            note: "founder KYC verified".to_string(),
        });
    } else {
        signals.push(RiskSignal {
            label: "kyc",
            delta: 0,
            note: "founder KYC pending".to_string(),
        });
    }

    if project.team_public {
        score += PUBLIC_TEAM_RELIEF;
        signals.push(RiskSignal {
            label: "team",
            delta: PUBLIC_TEAM_RELIEF,
            note: "team identities public".to_string(),
        });
    } else {
        signals.push(RiskSignal {
            label: "team",
            delta: 0,
            note: "anonymous team".to_string(),
        });
    }

    if project.whitepaper_url.is_some() {
        score += WHITEPAPER_RELIEF;
        signals.push(RiskSignal {
            label: "whitepaper",
            delta: WHITEPAPER_RELIEF,
            note: "whitepaper published".to_string(),
        });
    }

    if project.website.is_some() {
        score += WEBSITE_RELIEF;
        signals.push(RiskSignal {
            label: "website",
            delta: WEBSITE_RELIEF,
            note: "public website available".to_string(),
        });
    }

    if project.description.trim().len() < THIN_DESCRIPTION_CHARS {
        score += THIN_DESCRIPTION_PENALTY;
        signals.push(RiskSignal {
            label: "description",
            delta: THIN_DESCRIPTION_PENALTY,
            note: "project description is thin".to_string(),
        });
    }

    if project.target_raise_usd > OUTSIZED_RAISE_USD {
        score += OUTSIZED_RAISE_PENALTY;
        signals.push(RiskSignal {
            label: "raise",
            delta: OUTSIZED_RAISE_PENALTY,
            note: format!(
                "raise target ${} exceeds stage norms",
                project.target_raise_usd
            ),
        });
    } else if project.target_raise_usd == 0 {
        score += NO_RAISE_TARGET_PENALTY;
        signals.push(RiskSignal {
            label: "raise",
            delta: NO_RAISE_TARGET_PENALTY,
            note: "no raise target declared".to_string(),
        });
    }

    let score = score.clamp(0, 100) as u8;
    let band = if score <= 30 {
        RiskBand::Low
    } else if score <= 60 {
        RiskBand::Medium
    } else {
        RiskBand::High
    };

    RiskReport {
        score,
        band,
        signals,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn project() -> Project {
        Project {
            id: 0,
            project_id: "p1".to_string(),
            owner_id: "f1".to_string(),
            name: "Nebula Protocol".to_string(),
            token_symbol: "NEB".to_string(),
            sector: "DeFi".to_string(),
            stage: "seed".to_string(),
            description: "Cross-chain liquidity aggregation with audited vault contracts and \
                          transparent fee routing."
                .to_string(),
            website: Some("https://nebula.example".to_string()),
            whitepaper_url: Some("https://nebula.example/wp.pdf".to_string()),
            audited: true,
            kyc_verified: true,
            team_public: true,
            target_raise_usd: 2_000_000,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn well_documented_project_scores_low() {
        let report = assess(&project());
        assert_eq!(report.score, 5);
        assert_eq!(report.band, RiskBand::Low);
    }

    #[test]
    fn bare_project_scores_high() {
        let bare = Project {
            website: None,
            whitepaper_url: None,
            audited: false,
            kyc_verified: false,
            team_public: false,
            description: "moon".to_string(),
            target_raise_usd: 0,
            ..project()
        };
        let report = assess(&bare);
        assert_eq!(report.score, 65);
        assert_eq!(report.band, RiskBand::High);
    }

    #[test]
    fn outsized_raise_is_penalized() {
        let greedy = Project {
            target_raise_usd: 80_000_000,
            ..project()
        };
        let normal = assess(&project());
        let flagged = assess(&greedy);
        assert!(flagged.score > normal.score);
        assert!(flagged.signals.iter().any(|s| s.label == "raise"));
    }

    #[test]
    fn score_stays_within_bounds() {
        let report = assess(&project());
        assert!(report.score <= 100);
    }
}
