//! Unit tests for wq-core primitives.

#[cfg(test)]
mod ids {
    use crate::{LinkId, NodeId, SolutionId};

    #[test]
    fn index_matches_inner_value() {
        assert_eq!(NodeId(42).index(), 42);
        assert_eq!(LinkId(0).index(), 0);
    }

    #[test]
    fn display_uses_short_prefix() {
        assert_eq!(NodeId(3).to_string(), "N3");
        assert_eq!(LinkId(7).to_string(), "L7");
        assert_eq!(SolutionId(12).to_string(), "S12");
    }
}

#[cfg(test)]
mod composition {
    use approx::assert_relative_eq;

    use crate::{Composition, SolutionId};

    const A: SolutionId = SolutionId(1);
    const B: SolutionId = SolutionId(2);

    #[test]
    fn pure_is_normalized() {
        let c = Composition::pure(A);
        assert!(c.is_normalized());
        assert_eq!(c.get(A), 1.0);
        assert_eq!(c.get(B), 0.0);
    }

    #[test]
    fn weighted_accumulation_then_normalize() {
        let mut acc = Composition::new();
        acc.add_weighted(&Composition::pure(A), 3.0);
        acc.add_weighted(&Composition::pure(B), 1.0);
        assert_relative_eq!(acc.total(), 4.0);

        let c = acc.normalized();
        assert!(c.is_normalized());
        assert_relative_eq!(c.get(A), 0.75);
        assert_relative_eq!(c.get(B), 0.25);
    }

    #[test]
    fn normalize_empty_or_zero_is_empty() {
        assert!(Composition::new().normalized().is_empty());
        let zero: Composition = [(A, 0.0)].into_iter().collect();
        assert!(zero.normalized().is_empty());
    }

    #[test]
    fn normalize_prunes_negligible_entries() {
        let c: Composition = [(A, 1.0), (B, 1e-15)].into_iter().collect();
        let n = c.normalized();
        assert_eq!(n.len(), 1);
        assert_eq!(n.get(A), 1.0);
    }

    #[test]
    fn from_iter_sums_duplicates() {
        let c: Composition = [(A, 0.25), (A, 0.25), (B, 0.5)].into_iter().collect();
        assert_eq!(c.len(), 2);
        assert_relative_eq!(c.get(A), 0.5);
    }

    #[test]
    fn approx_eq_treats_missing_as_zero() {
        let a: Composition = [(A, 1.0), (B, 1e-9)].into_iter().collect();
        assert!(a.approx_eq(&Composition::pure(A), 1e-6));
        assert!(!a.approx_eq(&Composition::pure(B), 1e-6));
    }
}

#[cfg(test)]
mod inputs {
    use crate::{InputSolutions, NodeId, SolutionId, SourceKey, WqError};

    #[test]
    fn missing_background_is_config_error() {
        let inputs = InputSolutions::new().with_source(NodeId(0), SolutionId(1));
        assert!(matches!(inputs.background(), Err(WqError::MissingBackground)));
    }

    #[test]
    fn missing_source_names_node() {
        let inputs = InputSolutions::new().with_background(SolutionId(0));
        match inputs.source(NodeId(5)) {
            Err(WqError::MissingSource(n)) => assert_eq!(n, NodeId(5)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn solutions_lists_every_handle() {
        let mut inputs = InputSolutions::new()
            .with_background(SolutionId(0))
            .with_source(NodeId(1), SolutionId(7));
        inputs.insert(SourceKey::Node(NodeId(2)), SolutionId(8));
        let mut ids: Vec<_> = inputs.solutions().collect();
        ids.sort();
        assert_eq!(ids, [SolutionId(0), SolutionId(7), SolutionId(8)]);
    }
}

#[cfg(test)]
mod time {
    use crate::{QualityClock, QualityConfig, Step};

    #[test]
    fn clock_advances_with_variable_timesteps() {
        let mut clock = QualityClock::new();
        clock.advance(60.0);
        clock.advance(3_600.0);
        assert_eq!(clock.current_step, Step(2));
        assert_eq!(clock.elapsed_secs, 3_660.0);
        assert_eq!(clock.elapsed_minutes(), 61.0);
    }

    #[test]
    fn clock_display() {
        let mut clock = QualityClock::new();
        clock.advance(90_000.0); // 1 day 1 hour
        assert_eq!(clock.to_string(), "S1 (day 1 01:00)");
    }

    #[test]
    fn config_rejects_non_positive_timestep() {
        let mut cfg = QualityConfig::default();
        assert!(cfg.validate().is_ok());
        cfg.timestep_secs = 0.0;
        assert!(cfg.validate().is_err());
        cfg.timestep_secs = f64::NAN;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn output_steps() {
        let cfg = QualityConfig { output_interval_steps: 3, ..QualityConfig::default() };
        assert!(cfg.is_output_step(Step(0)));
        assert!(!cfg.is_output_step(Step(2)));
        assert!(cfg.is_output_step(Step(6)));
        let off = QualityConfig { output_interval_steps: 0, ..QualityConfig::default() };
        assert!(!off.is_output_step(Step(0)));
    }
}
