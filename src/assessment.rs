//! Longitudinal scoring over a snapshot of recorded results.

use crate::config::AssessmentConfig;
use crate::games::GameKind;
use crate::result::GameResult;
use crate::time_series::{chronological_values, TimeSeriesPoint};
use crate::util::{mean, slope, weighted_mean};
use serde::Serialize;
use std::fmt;

/// Cognitive capability a result contributes evidence toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    #[strum(serialize = "memory")]
    Memory,
    #[strum(serialize = "focus")]
    Focus,
}

/// Weights with which a game contributes to each domain.
pub fn domain_weights(kind: GameKind) -> &'static [(Domain, f64)] {
    match kind {
        GameKind::MemoryMatch => &[(Domain::Memory, 1.0)],
        GameKind::ReactionTime => &[(Domain::Focus, 1.0)],
        GameKind::SequenceRecall => &[(Domain::Memory, 0.6), (Domain::Focus, 0.4)],
    }
}

fn contributes_to(kind: GameKind, domain: Domain) -> bool {
    domain_weights(kind).iter().any(|(d, _)| *d == domain)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PerformanceLevel {
    Excellent,
    Good,
    Fair,
    NeedsImprovement,
}

impl PerformanceLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            PerformanceLevel::Excellent
        } else if score >= 0.6 {
            PerformanceLevel::Good
        } else if score >= 0.4 {
            PerformanceLevel::Fair
        } else {
            PerformanceLevel::NeedsImprovement
        }
    }
}

impl fmt::Display for PerformanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PerformanceLevel::Excellent => "Excellent",
            PerformanceLevel::Good => "Good",
            PerformanceLevel::Fair => "Fair",
            PerformanceLevel::NeedsImprovement => "Needs Improvement",
        };
        f.write_str(label)
    }
}

/// Domain averages on a 0-1 scale. `None` means no result contributed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentSummary {
    pub avg_cognitive_score: Option<f64>,
    pub avg_memory_score: Option<f64>,
    pub avg_focus_score: Option<f64>,
    pub total_assessments: usize,
    pub performance_level: Option<PerformanceLevel>,
    pub recommendations: Vec<String>,
}

/// Which series a trend is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[strum(serialize = "cognitive")]
    Cognitive,
    #[strum(serialize = "memory")]
    Memory,
    #[strum(serialize = "focus")]
    Focus,
}

impl Metric {
    fn includes(&self, kind: GameKind) -> bool {
        match self {
            Metric::Cognitive => true,
            Metric::Memory => contributes_to(kind, Domain::Memory),
            Metric::Focus => contributes_to(kind, Domain::Focus),
        }
    }

    fn title(&self) -> &'static str {
        match self {
            Metric::Cognitive => "Cognitive",
            Metric::Memory => "Memory",
            Metric::Focus => "Focus",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    #[strum(serialize = "improving")]
    Improving,
    #[strum(serialize = "declining")]
    Declining,
    #[strum(serialize = "stable")]
    Stable,
    #[strum(serialize = "insufficient_data")]
    InsufficientData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendReport {
    pub metric: Metric,
    pub trend: Trend,
    pub message: String,
    pub points: usize,
    pub earlier_mean: Option<f64>,
    pub later_mean: Option<f64>,
    /// `later_mean - earlier_mean` on the 0-100 score scale.
    pub delta: Option<f64>,
    /// Least-squares slope in score points per result.
    pub slope: Option<f64>,
}

pub fn summarize(results: &[GameResult]) -> AssessmentSummary {
    let overall: Vec<f64> = results.iter().map(GameResult::normalized_score).collect();

    let domain_avg = |domain: Domain| {
        let weighted: Vec<(f64, f64)> = results
            .iter()
            .flat_map(|r| {
                domain_weights(r.game_type())
                    .iter()
                    .filter(move |(d, _)| *d == domain)
                    .map(move |(_, w)| (r.normalized_score(), *w))
            })
            .collect();
        weighted_mean(&weighted)
    };

    let avg_cognitive_score = mean(&overall);
    let avg_memory_score = domain_avg(Domain::Memory);
    let avg_focus_score = domain_avg(Domain::Focus);

    AssessmentSummary {
        avg_cognitive_score,
        avg_memory_score,
        avg_focus_score,
        total_assessments: results.len(),
        performance_level: avg_cognitive_score.map(PerformanceLevel::from_score),
        recommendations: recommendations(avg_cognitive_score, avg_memory_score, avg_focus_score),
    }
}

fn recommendations(cognitive: Option<f64>, memory: Option<f64>, focus: Option<f64>) -> Vec<String> {
    let Some(cognitive) = cognitive else {
        return vec!["Play a game to get your first assessment.".to_string()];
    };

    let mut recs = Vec::new();
    if memory.is_some_and(|m| m < 0.6) {
        recs.push("Practice memory exercises daily to improve recall.".to_string());
    }
    if focus.is_some_and(|f| f < 0.6) {
        recs.push("Try meditation to enhance focus and attention.".to_string());
    }
    if cognitive < 0.5 {
        recs.push("Consider consulting a healthcare provider for cognitive assessment.".to_string());
    }
    if recs.is_empty() {
        recs.push("Maintain current cognitive activities for optimal brain health.".to_string());
    }
    recs
}

pub fn detect_trend(results: &[GameResult], metric: Metric, config: &AssessmentConfig) -> TrendReport {
    let points: Vec<TimeSeriesPoint> = results
        .iter()
        .filter(|r| metric.includes(r.game_type()))
        .map(|r| TimeSeriesPoint::at(r.completed_at(), r.score() as f64))
        .collect();
    let series = chronological_values(&points);
    let n = series.len();

    if n < config.min_trend_points.max(2) {
        return TrendReport {
            metric,
            trend: Trend::InsufficientData,
            message: format!(
                "More data needed for trend analysis ({} of {} results).",
                n,
                config.min_trend_points.max(2)
            ),
            points: n,
            earlier_mean: None,
            later_mean: None,
            delta: None,
            slope: None,
        };
    }

    let half = n / 2;
    let earlier_mean = mean(&series[..half]);
    let later_mean = mean(&series[n - half..]);
    let delta = earlier_mean.zip(later_mean).map(|(e, l)| l - e);

    let trend = match delta {
        Some(d) if d > config.trend_threshold => Trend::Improving,
        Some(d) if d < -config.trend_threshold => Trend::Declining,
        _ => Trend::Stable,
    };

    let magnitude = delta.map_or(0.0, f64::abs);
    let message = match trend {
        Trend::Improving => format!(
            "{} performance is improving: up {:.1} points over your recent results. Keep up the good work!",
            metric.title(),
            magnitude
        ),
        Trend::Declining => format!(
            "{} performance shows a declining trend: down {:.1} points over your recent results. Consider consulting a healthcare provider.",
            metric.title(),
            magnitude
        ),
        _ => format!(
            "{} performance is stable (change of {:.1} points).",
            metric.title(),
            delta.unwrap_or(0.0)
        ),
    };

    TrendReport {
        metric,
        trend,
        message,
        points: n,
        earlier_mean,
        later_mean,
        delta,
        slope: slope(&series),
    }
}

/// Aggregator over one immutable snapshot of history.
#[derive(Debug, Clone)]
pub struct Assessment {
    snapshot: Vec<GameResult>,
    config: AssessmentConfig,
}

impl Assessment {
    pub fn new(snapshot: Vec<GameResult>, config: AssessmentConfig) -> Self {
        Self { snapshot, config }
    }

    pub fn results(&self) -> &[GameResult] {
        &self.snapshot
    }

    pub fn summary(&self) -> AssessmentSummary {
        summarize(&self.snapshot)
    }

    pub fn trend(&self, metric: Metric) -> TrendReport {
        detect_trend(&self.snapshot, metric, &self.config)
    }
}
