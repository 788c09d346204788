//! Running counters for recommendation and group-formation quality.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoveryMetrics {
    pub recommendations_served: u64,
    pub mutual_likes: u64,
    pub engaged: u64,
    pub latencies_ms: Vec<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormationMetrics {
    pub groups_formed: u64,
    pub participants_placed: u64,
    pub satisfaction_ratings: Vec<f64>,
    pub latencies_ms: Vec<f64>,
}

/// Aggregated view for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub total_recommendations: u64,
    /// Percentage of recommendations that ended in a mutual like.
    pub mutual_like_rate: f64,
    pub avg_recommendation_latency_ms: f64,
    pub total_groups: u64,
    pub avg_satisfaction: f64,
    pub avg_formation_latency_ms: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlgorithmMonitor {
    pub discovery: DiscoveryMetrics,
    pub formation: FormationMetrics,
}

impl AlgorithmMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_recommendation(&mut self, latency_ms: f64, engaged: bool, mutual_like: bool) {
        let m = &mut self.discovery;
        m.recommendations_served += 1;
        m.latencies_ms.push(latency_ms);
        if engaged {
            m.engaged += 1;
        }
        if mutual_like {
            m.mutual_likes += 1;
        }
    }

    /// Record one formed group. Ratings outside 0..=5 are ignored.
    pub fn record_group_formation(
        &mut self,
        latency_ms: f64,
        group_size: usize,
        satisfaction: Option<f64>,
    ) {
        let m = &mut self.formation;
        m.groups_formed += 1;
        m.participants_placed += group_size as u64;
        m.latencies_ms.push(latency_ms);
        if let Some(rating) = satisfaction.filter(|r| (0.0..=5.0).contains(r)) {
            m.satisfaction_ratings.push(rating);
        }
    }

    pub fn summary(&self) -> PerformanceSummary {
        let d = &self.discovery;
        let f = &self.formation;
        PerformanceSummary {
            total_recommendations: d.recommendations_served,
            mutual_like_rate: d.mutual_likes as f64 / d.recommendations_served.max(1) as f64
                * 100.0,
            avg_recommendation_latency_ms: mean(&d.latencies_ms),
            total_groups: f.groups_formed,
            avg_satisfaction: mean(&f.satisfaction_ratings),
            avg_formation_latency_ms: mean(&f.latencies_ms),
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len().max(1) as f64
}
