use client_core::views::{DecisionDetailView, DecisionListView};
use shared::{
    domain::{Decision, DecisionStatus, Impact, Scenario, User},
    protocol::HealthResponse,
};

const CONTEXT_FIELDS: [(&str, &str); 4] = [
    ("current_situation", "Current situation"),
    ("goals", "Goals"),
    ("constraints", "Constraints"),
    ("timeline", "Timeline"),
];

pub fn user_line(user: &User) -> String {
    if user.display_name() == user.email {
        format!("{} (id {})", user.email, user.id)
    } else {
        format!("{} <{}> (id {})", user.display_name(), user.email, user.id)
    }
}

pub fn health_line(health: &HealthResponse) -> String {
    let mut line = format!("status: {}", health.status);
    if let Some(app) = &health.app {
        line.push_str(&format!("  app: {app}"));
    }
    if let Some(database) = &health.database {
        line.push_str(&format!("  database: {database}"));
    }
    line
}

pub fn decision_list(view: &DecisionListView) -> String {
    if view.is_empty() {
        return "No decisions yet. Create one with `lifeecho create <title>`.".to_string();
    }

    let mut lines = vec![format!(
        "{} decisions ({} completed, {} draft)",
        view.decisions().len(),
        view.count_with_status(DecisionStatus::Completed),
        view.count_with_status(DecisionStatus::Draft),
    )];
    for decision in view.decisions() {
        lines.push(format!(
            "{}  {:<10} {:<10} {}  {}",
            decision.id,
            decision.category.as_str(),
            decision.status.as_str(),
            decision.created_at.format("%Y-%m-%d"),
            decision.title
        ));
    }
    lines.join("\n")
}

pub fn decision_header(decision: &Decision) -> Vec<String> {
    let mut lines = vec![
        decision.title.clone(),
        format!(
            "{} | {} | created {}",
            decision.category,
            decision.status,
            decision.created_at.format("%Y-%m-%d %H:%M")
        ),
    ];
    if let Some(description) = decision
        .description
        .as_deref()
        .filter(|text| !text.trim().is_empty())
    {
        lines.push(String::new());
        lines.push(description.to_string());
    }
    for (key, label) in CONTEXT_FIELDS {
        if let Some(value) = decision.context_text(key) {
            lines.push(format!("{label}: {value}"));
        }
    }
    lines
}

pub fn decision_detail(view: &DecisionDetailView) -> String {
    let Some(decision) = view.decision() else {
        return "Decision not found".to_string();
    };

    let mut lines = decision_header(decision);
    lines.push(String::new());

    if view.scenarios().is_empty() {
        lines.push("No scenarios yet. Run `lifeecho simulate <id>` to generate them.".into());
        return lines.join("\n");
    }

    let tabs: Vec<String> = view
        .scenarios()
        .iter()
        .enumerate()
        .map(|(index, scenario)| {
            let marker = if index == view.selected_index() { '*' } else { ' ' };
            format!("{marker}[{index}] {}", scenario.title)
        })
        .collect();
    lines.push(format!("Scenarios: {}", tabs.join("  ")));

    if let Some(scenario) = view.current_scenario() {
        lines.push(String::new());
        lines.extend(scenario_body(scenario, &view.financial_series()));
    }
    lines.join("\n")
}

fn scenario_body(scenario: &Scenario, financial: &[(String, f64)]) -> Vec<String> {
    let mut lines = vec![scenario.title.clone()];
    if let Some(percent) = scenario.probability_percent() {
        lines.push(format!("Probability: {percent}%"));
    }
    if let Some(description) = &scenario.description {
        lines.push(description.clone());
    }

    let timeline = scenario.timeline();
    if !timeline.is_empty() {
        lines.push(String::new());
        lines.push("Timeline".into());
        for entry in timeline {
            let sign = match entry.impact {
                Impact::Positive => '+',
                Impact::Negative => '-',
                Impact::Neutral | Impact::Unknown => '=',
            };
            lines.push(format!("  {sign} {}: {}", entry.period, entry.event));
        }
    }

    if !financial.is_empty() {
        lines.push(String::new());
        lines.push("Financial projection".into());
        for (label, amount) in financial {
            lines.push(format!("  {label:<8} ${amount:>12.0}"));
        }
    }

    if let Some(outcomes) = scenario.outcomes() {
        if let Some(satisfaction) = outcomes.satisfaction {
            lines.push(format!("Satisfaction: {satisfaction:.1}/10"));
        }
        if let Some(hours) = outcomes.time_investment_hours {
            lines.push(format!("Time investment: {hours:.0} hours"));
        }
    }

    let risks = scenario.risk_entries();
    if !risks.is_empty() {
        lines.push(String::new());
        lines.push("Risks".into());
        for risk in risks {
            match risk.mitigation {
                Some(mitigation) => lines.push(format!(
                    "  [{}] {} (mitigation: {mitigation})",
                    risk.severity, risk.factor
                )),
                None => lines.push(format!("  [{}] {}", risk.severity, risk.factor)),
            }
        }
    }

    if let Some(recommendations) = &scenario.recommendations {
        lines.push(String::new());
        lines.push(format!("Recommendations: {recommendations}"));
    }
    lines
}
