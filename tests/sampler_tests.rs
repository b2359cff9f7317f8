// tests/sampler_tests.rs

use dynq::sampler::shot_seed;
use dynq::{
    sample, Circuit, CircuitBuilder, Condition, DynamicSampler, EngineError, Expr, FailurePolicy,
    SamplerConfig, StateVectorSimulator,
};
use proptest::prelude::*;

// Measure |+>, then keep re-measuring while the last outcome was 1.
fn repeat_until_zero() -> Circuit {
    CircuitBuilder::new()
        .block("H 0; M 0")
        .while_loop(Condition::LastMeasurement(0), Circuit::from_block("H 0; M 0"), 0)
        .build()
}

// Helper asserting the repeat-until-zero shape: ones, then a single final zero.
fn check_repeat_until_zero(shot: &[bool]) {
    assert!(!shot.is_empty(), "shot must contain at least one measurement");
    assert_eq!(shot.last(), Some(&false), "shot {:?} must end in 0", shot);
    assert!(shot[..shot.len() - 1].iter().all(|&bit| bit), "shot {:?} has an early 0", shot);
}

#[test]
fn test_repeat_until_zero_is_reproducible() -> Result<(), EngineError> {
    let circuit = repeat_until_zero();
    let first = sample(&circuit, 3, Some(123))?;
    let second = sample(&circuit, 3, Some(123))?;
    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
    first.iter().for_each(|shot| check_repeat_until_zero(shot));

    // Changing only the shot count leaves shot 0 unchanged.
    let single = sample(&circuit, 1, Some(123))?;
    assert_eq!(single[0], first[0]);
    Ok(())
}

#[test]
fn test_shot_seed_derivation() -> Result<(), EngineError> {
    let circuit = repeat_until_zero();
    let base = 40;
    let batch = sample(&circuit, 8, Some(base))?;
    for (i, shot) in batch.iter().enumerate() {
        let alone = sample(&circuit, 1, Some(shot_seed(base, i)))?;
        assert_eq!(&alone[0], shot, "shot {} differs when run alone", i);
    }
    Ok(())
}

#[test]
fn test_sample_shot_matches_batch() -> Result<(), EngineError> {
    let circuit = repeat_until_zero();
    let sampler: DynamicSampler = DynamicSampler::new(&circuit, SamplerConfig::default().with_seed(77));
    let batch = sampler.sample(5)?;
    for (i, shot) in batch.iter().enumerate() {
        assert_eq!(&sampler.sample_shot(i)?, shot);
    }
    Ok(())
}

#[test]
fn test_parallel_matches_sequential() -> Result<(), EngineError> {
    let circuit = repeat_until_zero();
    let config = SamplerConfig::default().with_seed(5);
    let sequential = DynamicSampler::<StateVectorSimulator>::new(&circuit, config.clone()).sample(64)?;
    let parallel = DynamicSampler::<StateVectorSimulator>::new(&circuit, config.with_parallel(true)).sample(64)?;
    assert_eq!(sequential, parallel);
    Ok(())
}

#[test]
fn test_different_seeds_vary() -> Result<(), EngineError> {
    let circuit = Circuit::from_block("H 0 1 2 3 4 5 6 7\nM 0 1 2 3 4 5 6 7");
    let a = sample(&circuit, 16, Some(1))?;
    let b = sample(&circuit, 16, Some(1_000_000))?;
    assert_ne!(a, b, "128 fair coin flips should not repeat across seeds");
    Ok(())
}

#[test]
fn test_unseeded_sampling_runs() -> Result<(), EngineError> {
    let circuit = repeat_until_zero();
    let shots = sample(&circuit, 10, None)?;
    assert_eq!(shots.len(), 10);
    shots.iter().for_each(|shot| check_repeat_until_zero(shot));
    Ok(())
}

#[test]
fn test_feed_forward_makes_bell_pair_agree() -> Result<(), EngineError> {
    // Correct qubit 1 to |0> whenever qubit 0 read 1; both reads then follow m0 ^ m0 = 0.
    let circuit = CircuitBuilder::new()
        .block("H 0\nCX 0 1\nM 0")
        .conditional(Condition::LastMeasurement(0), Circuit::from_block("X 1"))
        .block("M 1")
        .build();
    for shot in sample(&circuit, 40, Some(8))? {
        assert_eq!(shot.len(), 2);
        assert!(!shot[1]);
    }
    Ok(())
}

#[test]
fn test_do_while_with_parity_condition() -> Result<(), EngineError> {
    // Prepare a Bell pair until both qubits read 1; reset between attempts.
    let attempt = Circuit::from_block("H 0\nCX 0 1\nMR 0 1");
    let circuit = CircuitBuilder::new()
        .do_while(Expr::rec(-1).and(Expr::rec(-2)).negate(), attempt, 0)
        .build();
    for shot in sample(&circuit, 20, Some(11))? {
        assert_eq!(shot.len() % 2, 0);
        for pair in shot.chunks(2) {
            assert_eq!(pair[0], pair[1], "Bell pair outcomes must agree");
        }
        assert_eq!(&shot[shot.len() - 2..], &[true, true]);
    }
    Ok(())
}

#[test]
fn test_classical_records() -> Result<(), EngineError> {
    let circuit = CircuitBuilder::new()
        .block("H 0\nCX 0 1\nM 0 1")
        .let_var("agree", Expr::rec(0).xor(Expr::rec(1)).negate())
        .emit("agree", Expr::var("agree"))
        .build();
    let sampler: DynamicSampler = DynamicSampler::new(&circuit, SamplerConfig::default().with_seed(3));
    let records = sampler.sample_with_classical(12)?;
    let samples = sampler.sample(12)?;
    for (record, measurements) in records.iter().zip(&samples) {
        assert_eq!(&record.measurements, measurements);
        assert_eq!(record.outputs, vec![true]);
        assert_eq!(record.vars.get("agree"), Some(&true));
    }
    Ok(())
}

#[test]
fn test_loop_limit_fails_whole_sample() {
    let circuit = CircuitBuilder::new()
        .while_loop(Expr::Const(true), Circuit::from_block("X 0"), 4)
        .build();
    let err = sample(&circuit, 3, Some(0)).unwrap_err();
    assert_eq!(err.to_string(), "While-loop exceeded max_iter=4");
}

#[test]
fn test_continue_on_error_keeps_good_shots() -> Result<(), EngineError> {
    // Shots fail only when the first measurement is 1 and the loop never ends.
    let circuit = CircuitBuilder::new()
        .block("H 0\nM 0")
        .while_loop(Condition::LastMeasurement(0), Circuit::from_block("X 0\nX 0\nM 0"), 2)
        .build();
    let config = SamplerConfig::default()
        .with_seed(21)
        .with_failure_policy(FailurePolicy::ContinueOnError)
        .with_parallel(true);
    let outcomes = DynamicSampler::<StateVectorSimulator>::new(&circuit, config).sample_outcomes(32)?;
    assert_eq!(outcomes.len(), 32);
    for outcome in outcomes {
        match outcome {
            Ok(shot) => assert_eq!(shot, vec![false]),
            Err(err) => assert!(matches!(err, EngineError::LoopLimitExceeded { limit: 2, .. })),
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn prop_sampling_is_deterministic(seed in any::<u64>(), shots in 0usize..8) {
        let circuit = repeat_until_zero();
        let first = sample(&circuit, shots, Some(seed)).unwrap();
        let second = sample(&circuit, shots, Some(seed)).unwrap();
        prop_assert_eq!(first.len(), shots);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_prefix_is_stable(seed in any::<u64>(), shots in 1usize..8) {
        let circuit = repeat_until_zero();
        let long = sample(&circuit, shots, Some(seed)).unwrap();
        let short = sample(&circuit, shots - 1, Some(seed)).unwrap();
        prop_assert_eq!(&long[..shots - 1], &short[..]);
    }

    #[test]
    fn prop_rus_shape_holds(seed in any::<u64>()) {
        for shot in sample(&repeat_until_zero(), 4, Some(seed)).unwrap() {
            check_repeat_until_zero(&shot);
        }
    }
}
