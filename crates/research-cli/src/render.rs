use analysis_orchestrator::{NarrationPrompt, ResearchReport, SectionOutcome};
use std::fmt::Write;

/// Plain-text rendering of a research report
pub fn render_report(report: &ResearchReport) -> String {
    let mut out = String::new();
    let f = &report.fundamentals;

    let _ = writeln!(out, "{} ({})", f.display_name(), report.ticker);
    if let (Some(sector), Some(industry)) = (&f.sector, &f.industry) {
        let _ = writeln!(out, "{sector} / {industry}");
    }
    let _ = writeln!(out, "Generated {}", report.generated_at.format("%Y-%m-%d %H:%M UTC"));
    let _ = writeln!(out);

    let _ = writeln!(out, "== Key metrics ==");
    let _ = writeln!(out, "  Price:        {}", money(f.current_price));
    let _ = writeln!(out, "  Market cap:   {}", large(f.market_cap));
    let _ = writeln!(out, "  Trailing P/E: {}", number(f.trailing_pe));
    let _ = writeln!(out, "  Forward P/E:  {}", number(f.forward_pe));
    let _ = writeln!(out, "  EV/EBITDA:    {}", number(f.ev_to_ebitda));
    let _ = writeln!(out, "  Beta:         {}", number(f.beta));
    let _ = writeln!(
        out,
        "  52w range:    {} - {}",
        money(f.fifty_two_week_low),
        money(f.fifty_two_week_high)
    );
    let _ = writeln!(out);

    let _ = writeln!(
        out,
        "== Reverse DCF (discount {:.1}%, terminal growth {:.1}%) ==",
        report.assumptions.discount_rate * 100.0,
        report.assumptions.terminal_growth_rate * 100.0
    );
    match &report.valuation {
        SectionOutcome::Ready(v) => {
            let _ = writeln!(out, "  Implied growth:    {:.2}% per year", v.implied_growth_pct);
            if !v.implied.convergence.is_converged() {
                let _ = writeln!(
                    out,
                    "  (low confidence: no convergence after {} iterations)",
                    v.implied.iterations
                );
            }
        }
        SectionOutcome::Unavailable { reason, .. } => {
            let _ = writeln!(out, "  Unavailable: {reason}");
        }
    }
    match &report.historical_growth {
        SectionOutcome::Ready(h) => {
            let _ = writeln!(out, "  Historical CAGR:   {:.2}% over {} periods", h.cagr_pct, h.periods);
        }
        SectionOutcome::Unavailable { reason, .. } => {
            let _ = writeln!(out, "  Historical CAGR unavailable: {reason}");
        }
    }
    let _ = writeln!(out, "  Verdict:           {}", report.verdict.to_label());
    let _ = writeln!(out);

    let _ = writeln!(out, "== Technicals ==");
    match &report.technicals {
        SectionOutcome::Ready(t) => {
            let s = &t.snapshot;
            let _ = writeln!(out, "  As of {}: close {:.2}", s.date, s.price);
            let _ = writeln!(out, "  SMA fast: {}", number(s.sma_fast));
            let _ = writeln!(out, "  SMA slow: {}", number(s.sma_slow));
            let _ = writeln!(out, "  RSI:      {}", number(s.rsi));
            let _ = writeln!(out, "  Trend {:?}, momentum {:?}", s.trend, s.momentum);
        }
        SectionOutcome::Unavailable { reason, .. } => {
            let _ = writeln!(out, "  Unavailable: {reason}");
        }
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "== Peers ==");
    match &report.peers {
        SectionOutcome::Ready(p) => {
            let _ = writeln!(out, "  {:<8} {:>10} {:>10} {:>10}", "Ticker", "Growth %", "EV/EBITDA", "Margin %");
            for record in p.comparison.records() {
                let growth = if record.completeness.revenue_growth_reported {
                    format!("{:.1}", record.revenue_growth_pct)
                } else {
                    "N/A".to_string()
                };
                let margin = if record.completeness.net_margin_reported {
                    format!("{:.1}", record.net_margin * 100.0)
                } else {
                    "N/A".to_string()
                };
                let _ = writeln!(
                    out,
                    "  {:<8} {:>10} {:>10} {:>10}",
                    record.ticker,
                    growth,
                    number(record.ev_to_ebitda),
                    margin
                );
            }
            if p.alternatives.is_empty() {
                let _ = writeln!(out, "  No peer beats {} on two or more metrics.", report.ticker);
            }
            for candidate in &p.alternatives {
                let _ = writeln!(out, "  Alternative {}: {}", candidate.ticker, candidate.reasons.join("; "));
            }
        }
        SectionOutcome::Unavailable { reason, .. } => {
            let _ = writeln!(out, "  Unavailable: {reason}");
        }
    }

    out
}

pub fn render_prompts(prompts: &[NarrationPrompt]) -> String {
    let mut out = String::new();
    for prompt in prompts {
        let _ = writeln!(out, "--- {} ---", prompt.task.to_label());
        let _ = writeln!(out, "[system] {}", prompt.system);
        let _ = writeln!(out, "{}", prompt.user);
        let _ = writeln!(out);
    }
    out
}

fn number(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:.2}"))
}

fn money(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("${v:.2}"))
}

fn large(value: Option<f64>) -> String {
    match value {
        Some(v) if v.abs() >= 1e12 => format!("${:.2}T", v / 1e12),
        Some(v) if v.abs() >= 1e9 => format!("${:.2}B", v / 1e9),
        Some(v) if v.abs() >= 1e6 => format!("${:.2}M", v / 1e6),
        other => money(other),
    }
}
