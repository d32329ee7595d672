// Terminal rendering for answers, providers and session stats
use colored::*;

use crate::providers::ProviderInfo;
use crate::session::SessionStats;
use crate::types::QueryResult;

const EVIDENCE_PREVIEW_CHARS: usize = 160;

/// Answer block, followed by evidence when the result carries it
pub fn answer(result: &QueryResult, show_scores: bool) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} {}\n",
        "Answer".bold().green(),
        format!("({} / {})", result.provider, result.model).dimmed()
    ));
    out.push_str(result.answer.trim());
    out.push('\n');

    if let Some(evidence) = &result.evidence {
        out.push_str(&format!("\n{}\n", "Evidence".bold().cyan()));
        if evidence.is_empty() {
            out.push_str(&format!("  {}\n", "(none)".dimmed()));
        }
        for (i, doc) in evidence.iter().enumerate() {
            out.push_str(&format!(
                "  [{}] {} {}\n",
                i + 1,
                doc.label().bold(),
                format!("({})", doc.source_kind()).dimmed()
            ));
            out.push_str(&format!("      {}\n", preview(&doc.text)));
        }
    }

    if show_scores && !result.similarity_scores.is_empty() {
        let scores: Vec<String> = result
            .similarity_scores
            .iter()
            .map(|s| format!("{:.3}", s))
            .collect();
        out.push_str(&format!("\n{} {}\n", "Scores:".dimmed(), scores.join(", ")));
    }
    out
}

/// One line per provider
pub fn providers(infos: &[ProviderInfo], default: crate::providers::ProviderKind) -> String {
    let mut out = format!(
        "{:<10} {:<28} {}\n",
        "PROVIDER".bold(),
        "MODEL".bold(),
        "CREDENTIAL".bold()
    );
    for info in infos {
        let credential = if info.has_credential {
            "available".green()
        } else {
            format!("missing (see {})", info.provider.key_url()).yellow()
        };
        let marker = if info.provider == default { "*" } else { " " };
        out.push_str(&format!(
            "{}{:<9} {:<28} {}\n",
            marker,
            info.provider.as_str(),
            info.model,
            credential
        ));
    }
    out
}

pub fn stats(stats: &SessionStats) -> String {
    let mut out = format!("{} {}\n", "Profile".bold(), stats.profile_id);
    out.push_str(&format!("  session:   {}\n", stats.session_id));
    match &stats.index {
        Some(index) => {
            out.push_str(&format!(
                "  documents: {} ({})\n",
                index.documents, index.embedder
            ));
            for (kind, count) in &index.by_source {
                out.push_str(&format!("    {:<18} {}\n", kind.as_str(), count));
            }
        }
        None => out.push_str("  documents: not indexed\n"),
    }
    out.push_str(&format!("  turns:     {}\n", stats.conversation_turns));
    out.push_str(&format!(
        "  provider:  {}\n",
        stats
            .active_provider
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string())
    ));
    out
}

fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= EVIDENCE_PREVIEW_CHARS {
        flat
    } else {
        let cut: String = flat.chars().take(EVIDENCE_PREVIEW_CHARS).collect();
        format!("{}...", cut)
    }
}
