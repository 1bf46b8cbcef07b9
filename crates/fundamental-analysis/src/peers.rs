use analysis_core::{
    AnalysisError, CompanyFundamentals, DataCompleteness, PeerConfig, PeerMetricRecord, PeerRole,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Builds the uniform growth / multiple / margin table for a target and its peers
#[derive(Debug, Clone, Default)]
pub struct PeerMetricNormalizer {
    config: PeerConfig,
}

impl PeerMetricNormalizer {
    pub fn new(config: PeerConfig) -> Self {
        Self { config }
    }

    /// The target record always comes first, even with no peers. Peers are
    /// unique by ticker (case-insensitive) and never repeat the target.
    pub fn normalize(
        &self,
        target: &CompanyFundamentals,
        peers: &[CompanyFundamentals],
    ) -> Result<PeerComparison, AnalysisError> {
        let target_ticker = normalize_ticker(&target.symbol);
        if target_ticker.is_empty() {
            return Err(AnalysisError::MissingData("target ticker".to_string()));
        }

        let mut seen = HashSet::new();
        seen.insert(target_ticker.clone());

        let mut records = Vec::with_capacity(peers.len() + 1);
        records.push(self.record(target_ticker, target, PeerRole::Target));

        for peer in peers {
            let ticker = normalize_ticker(&peer.symbol);
            if ticker.is_empty() || !seen.insert(ticker.clone()) {
                continue;
            }
            records.push(self.record(ticker, peer, PeerRole::Peer));
        }

        Ok(PeerComparison { records })
    }

    fn record(&self, ticker: String, fundamentals: &CompanyFundamentals, role: PeerRole) -> PeerMetricRecord {
        let revenue_growth = finite(fundamentals.revenue_growth);
        let ev_to_ebitda = finite(fundamentals.ev_to_ebitda);
        let net_margin = finite(fundamentals.profit_margins);

        let margin = net_margin.unwrap_or(0.0);
        let magnitude = if margin == 0.0 {
            self.config.magnitude_floor
        } else {
            margin.abs()
        };

        PeerMetricRecord {
            ticker,
            // missing growth reads as 0%; completeness keeps the difference
            revenue_growth_pct: revenue_growth.map(|g| g * 100.0).unwrap_or(0.0),
            ev_to_ebitda,
            net_margin: margin,
            magnitude,
            role,
            completeness: DataCompleteness {
                revenue_growth_reported: revenue_growth.is_some(),
                ev_to_ebitda_reported: ev_to_ebitda.is_some(),
                net_margin_reported: net_margin.is_some(),
            },
        }
    }
}

fn normalize_ticker(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// A peer that beats the target on at least two of growth, valuation and margin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeCandidate {
    pub ticker: String,
    pub score: u32,
    pub reasons: Vec<String>,
}

/// Target plus peers, target first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeerComparison {
    records: Vec<PeerMetricRecord>,
}

impl PeerComparison {
    pub fn records(&self) -> &[PeerMetricRecord] {
        &self.records
    }

    pub fn target(&self) -> &PeerMetricRecord {
        // normalize() always places the target at index 0
        &self.records[0]
    }

    pub fn peers(&self) -> &[PeerMetricRecord] {
        &self.records[1..]
    }

    pub fn has_peers(&self) -> bool {
        self.records.len() > 1
    }

    /// Peers that look strictly better than the target, strongest first.
    ///
    /// Only reported metrics are compared and margins are compared signed,
    /// never by chart magnitude.
    pub fn better_alternatives(&self) -> Vec<AlternativeCandidate> {
        let target = self.target();
        let mut candidates: Vec<(AlternativeCandidate, f64)> = self
            .peers()
            .iter()
            .filter_map(|peer| {
                let reasons = advantages(target, peer);
                if reasons.len() < 2 {
                    return None;
                }
                Some((
                    AlternativeCandidate {
                        ticker: peer.ticker.clone(),
                        score: reasons.len() as u32,
                        reasons,
                    },
                    peer.net_margin,
                ))
            })
            .collect();

        candidates.sort_by(|(a, a_margin), (b, b_margin)| {
            b.score.cmp(&a.score).then_with(|| {
                b_margin
                    .partial_cmp(a_margin)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
        });

        candidates.into_iter().map(|(c, _)| c).collect()
    }
}

fn advantages(target: &PeerMetricRecord, peer: &PeerMetricRecord) -> Vec<String> {
    let mut reasons = Vec::new();

    if target.completeness.revenue_growth_reported
        && peer.completeness.revenue_growth_reported
        && peer.revenue_growth_pct > target.revenue_growth_pct
    {
        reasons.push(format!(
            "Higher revenue growth ({:.1}% vs {:.1}%)",
            peer.revenue_growth_pct, target.revenue_growth_pct
        ));
    }

    if let (Some(target_ev), Some(peer_ev)) = (target.ev_to_ebitda, peer.ev_to_ebitda) {
        if target_ev > 0.0 && peer_ev > 0.0 && peer_ev < target_ev {
            reasons.push(format!("Cheaper EV/EBITDA ({peer_ev:.1}x vs {target_ev:.1}x)"));
        }
    }

    if target.completeness.net_margin_reported
        && peer.completeness.net_margin_reported
        && peer.net_margin > target.net_margin
    {
        reasons.push(format!(
            "Stronger net margin ({:.1}% vs {:.1}%)",
            peer.net_margin * 100.0,
            target.net_margin * 100.0
        ));
    }

    reasons
}
