use crate::db::Project;

use super::risk;
use super::AiError;

/// Named report operations available in deal rooms. Each renders a fixed
/// markdown skeleton from project fields; there is no model call here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcCommand {
    Brief,
    RiskAnalysis,
    TermSheet,
    Outreach,
}

impl VcCommand {
    pub fn parse(value: &str) -> Result<Self, AiError> {
        match value {
            "brief" => Ok(VcCommand::Brief),
            "risk-analysis" => Ok(VcCommand::RiskAnalysis),
            "term-sheet" => Ok(VcCommand::TermSheet),
            "outreach" => Ok(VcCommand::Outreach),
            other => Err(AiError::UnknownCommand(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VcCommand::Brief => "brief",
            VcCommand::RiskAnalysis => "risk-analysis",
            VcCommand::TermSheet => "term-sheet",
            VcCommand::Outreach => "outreach",
        }
    }
}

pub fn render(command: VcCommand, project: &Project) -> String {
    match command {
        VcCommand::Brief => render_brief(project),
        VcCommand::RiskAnalysis => render_risk_analysis(project),
        VcCommand::TermSheet => render_term_sheet(project),
        VcCommand::Outreach => render_outreach(project),
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn render_brief(project: &Project) -> String {
    format!(
        "# Investment Brief: {name}\n\n\
         **Token:** {symbol}  \n\
         **Sector:** {sector}  \n\
         **Stage:** {stage}  \n\
         **Target raise:** ${raise}\n\n\
         ## Summary\n\n{description}\n\n\
         ## Diligence checklist\n\n\
         - Audit completed: {audited}\n\
         - Founder KYC: {kyc}\n\
         - Public team: {team}\n\
         - Website: {website}\n",
        name = project.name,
        symbol = project.token_symbol,
        sector = project.sector,
        stage = project.stage,
        raise = project.target_raise_usd,
        description = project.description,
        audited = yes_no(project.audited),
        kyc = yes_no(project.kyc_verified),
        team = yes_no(project.team_public),
        website = project.website.as_deref().unwrap_or("not provided"),
    )
}

fn render_risk_analysis(project: &Project) -> String {
    let report = risk::assess(project);

    let mut out = format!(
        "# Risk Analysis: {name}\n\n\
         **Score:** {score}/100 ({band:?})\n\n\
         ## Signals\n\n",
        name = project.name,
        score = report.score,
        band = report.band,
    );

    for signal in &report.signals {
        out.push_str(&format!(
            "- **{}** ({:+}): {}\n",
            signal.label, signal.delta, signal.note
        ));
    }

    out.push_str(
        "\n*Heuristic screening only. Not investment advice; verify every signal \
         independently before committing capital.*\n",
    );
    out
}

fn render_term_sheet(project: &Project) -> String {
    format!(
        "# Term Sheet Draft: {name}\n\n\
         | Term | Value |\n\
         |------|-------|\n\
         | Instrument | SAFT |\n\
         | Token | {symbol} |\n\
         | Target raise | ${raise} |\n\
         | Stage | {stage} |\n\
         | Vesting | 12 month cliff, 24 month linear |\n\
         | Governance | to be negotiated |\n\n\
         Draft generated from the project profile. All terms are placeholders \
         until countersigned.\n",
        name = project.name,
        symbol = project.token_symbol,
        raise = project.target_raise_usd,
        stage = project.stage,
    )
}

fn render_outreach(project: &Project) -> String {
    format!(
        "Subject: {name} — {sector} opportunity at {stage} stage\n\n\
         Hi,\n\n\
         Sharing {name} ({symbol}), a {sector} project currently raising \
         ${raise}. {description}\n\n\
         Happy to set up a call if this fits your mandate.\n",
        name = project.name,
        symbol = project.token_symbol,
        sector = project.sector,
        stage = project.stage,
        raise = project.target_raise_usd,
        description = project.description,
    )
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
            description: "Cross-chain liquidity aggregation.".to_string(),
            website: None,
            whitepaper_url: None,
            audited: false,
            kyc_verified: true,
            team_public: true,
            target_raise_usd: 2_000_000,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn parse_accepts_known_commands_only() {
        assert_eq!(VcCommand::parse("brief").unwrap(), VcCommand::Brief);
        assert_eq!(
            VcCommand::parse("risk-analysis").unwrap(),
            VcCommand::RiskAnalysis
        );
        assert!(matches!(
            VcCommand::parse("moonshot"),
            Err(AiError::UnknownCommand(_))
        ));
    }

    #[test]
    fn brief_interpolates_project_fields() {
        let markdown = render(VcCommand::Brief, &project());
        assert!(markdown.contains("Nebula Protocol"));
        assert!(markdown.contains("NEB"));
        assert!(markdown.contains("Audit completed: no"));
        assert!(markdown.contains("not provided"));
    }

    #[test]
    fn risk_analysis_embeds_score_and_signals() {
        let markdown = render(VcCommand::RiskAnalysis, &project());
        assert!(markdown.contains("/100"));
        assert!(markdown.contains("- **audit**"));
    }

    #[test]
    fn term_sheet_renders_a_table() {
        let markdown = render(VcCommand::TermSheet, &project());
        assert!(markdown.contains("| Instrument | SAFT |"));
        assert!(markdown.contains("$2000000"));
    }
}
