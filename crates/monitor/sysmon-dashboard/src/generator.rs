//! Synthetic data generation
//!
//! On every generator tick each entity kind is requested independently with
//! its own probability, and only while the data stream is active.

use crate::transport::GenerateKind;
use rand::Rng;

/// Per-tick request probabilities
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOdds {
    pub metric: f64,
    pub task: f64,
    pub alert: f64,
}

impl Default for GenerationOdds {
    fn default() -> Self {
        Self {
            metric: 0.3,
            task: 0.2,
            alert: 0.1,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SyntheticGenerator {
    odds: GenerationOdds,
}

impl SyntheticGenerator {
    pub fn new(odds: GenerationOdds) -> Self {
        Self { odds }
    }

    /// Decide which generate requests to issue this tick
    pub fn plan<R: Rng + ?Sized>(&self, rng: &mut R, streaming: bool) -> Vec<GenerateKind> {
        let mut kinds = Vec::new();
        if !streaming {
            return kinds;
        }

        for (kind, p) in [
            (GenerateKind::Metric, self.odds.metric),
            (GenerateKind::Task, self.odds.task),
            (GenerateKind::Alert, self.odds.alert),
        ] {
            if rng.gen_bool(p.clamp(0.0, 1.0)) {
                kinds.push(kind);
            }
        }
        kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_paused_stream_requests_nothing() {
        let generator = SyntheticGenerator::new(GenerationOdds { metric: 1.0, task: 1.0, alert: 1.0 });
        let mut rng = StdRng::seed_from_u64(7);
        assert!(generator.plan(&mut rng, false).is_empty());
    }

    #[test]
    fn test_certain_odds_request_everything() {
        let generator = SyntheticGenerator::new(GenerationOdds { metric: 1.0, task: 1.0, alert: 1.0 });
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(
            generator.plan(&mut rng, true),
            vec![GenerateKind::Metric, GenerateKind::Task, GenerateKind::Alert]
        );
    }

    #[test]
    fn test_decisions_are_independent() {
        let generator = SyntheticGenerator::new(GenerationOdds { metric: 0.0, task: 1.0, alert: 0.0 });
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..20 {
            assert_eq!(generator.plan(&mut rng, true), vec![GenerateKind::Task]);
        }
    }

    #[test]
    fn test_default_odds_frequencies() {
        let generator = SyntheticGenerator::default();
        let mut rng = StdRng::seed_from_u64(42);
        let mut counts = [0usize; 3];
        let ticks = 10_000;

        for _ in 0..ticks {
            for kind in generator.plan(&mut rng, true) {
                match kind {
                    GenerateKind::Metric => counts[0] += 1,
                    GenerateKind::Task => counts[1] += 1,
                    GenerateKind::Alert => counts[2] += 1,
                }
            }
        }

        let freq = |c: usize| c as f64 / ticks as f64;
        assert!((freq(counts[0]) - 0.3).abs() < 0.03);
        assert!((freq(counts[1]) - 0.2).abs() < 0.03);
        assert!((freq(counts[2]) - 0.1).abs() < 0.03);
    }
}
