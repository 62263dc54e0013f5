//! Advancing many independent cycles per tick.
//!
//! Each [`ProductionCycle`] owns all of its mutable state, so a batch can be
//! advanced in any order. With the `parallel` feature the batch is split
//! across the rayon pool; results are identical to the sequential path.

use crate::cycle::{Completion, ProductionCycle, TickOutcome};
use crate::fixed::Seconds;
use crate::port::{ContractViolation, InputSource, OutputSink};

/// Tally of one batch advance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub inert: usize,
    pub paused: usize,
    pub degenerate: usize,
    pub accumulating: usize,
    pub produced: usize,
    pub starved: usize,
    pub blocked: usize,
}

impl BatchReport {
    fn record(&mut self, outcome: &TickOutcome) {
        match outcome {
            TickOutcome::Inert => self.inert += 1,
            TickOutcome::Paused => self.paused += 1,
            TickOutcome::Degenerate => self.degenerate += 1,
            TickOutcome::Accumulating => self.accumulating += 1,
            TickOutcome::Completed(completions) => {
                for completion in completions {
                    match completion {
                        Completion::Produced => self.produced += 1,
                        Completion::Starved => self.starved += 1,
                        Completion::Blocked => self.blocked += 1,
                    }
                }
            }
        }
    }
}

/// A collaborator broke its contract while a batch was advancing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cycle {index}: {source}")]
pub struct BatchError {
    /// Position of the failing cycle in the batch.
    pub index: usize,
    #[source]
    pub source: ContractViolation,
}

/// Advance every cycle by `delta`. All cycles are advanced even if one
/// fails; the lowest failing index is reported.
pub fn advance_all<I, O>(
    cycles: &mut [ProductionCycle<I, O>],
    delta: Seconds,
) -> Result<BatchReport, BatchError>
where
    I: InputSource + Send,
    O: OutputSink + Send,
{
    let outcomes = advance_each(cycles, delta);

    let mut report = BatchReport::default();
    for (index, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(outcome) => report.record(&outcome),
            Err(source) => {
                tracing::error!(index, error = %source, "production cycle contract violation");
                return Err(BatchError { index, source });
            }
        }
    }
    Ok(report)
}

#[cfg(not(feature = "parallel"))]
fn advance_each<I, O>(
    cycles: &mut [ProductionCycle<I, O>],
    delta: Seconds,
) -> Vec<Result<TickOutcome, ContractViolation>>
where
    I: InputSource + Send,
    O: OutputSink + Send,
{
    cycles.iter_mut().map(|c| c.advance(delta)).collect()
}

#[cfg(feature = "parallel")]
fn advance_each<I, O>(
    cycles: &mut [ProductionCycle<I, O>],
    delta: Seconds,
) -> Vec<Result<TickOutcome, ContractViolation>>
where
    I: InputSource + Send,
    O: OutputSink + Send,
{
    use rayon::prelude::*;
    cycles.par_iter_mut().map(|c| c.advance(delta)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycle::CycleConfig;
    use crate::fixed::Fixed64;
    use crate::test_utils::*;

    #[test]
    fn batch_tallies_every_outcome() {
        let mut cycles = vec![
            make_cycle(make_generator(plank(), 10.0), None, Some(make_bin(plank(), 10))),
            make_cycle(make_sawmill(10.0, 2), Some(make_stockpile(&[])), Some(make_bin(plank(), 10))),
            make_cycle(make_generator(plank(), 20.0), None, Some(make_bin(plank(), 10))),
            make_idle_cycle(),
        ];
        cycles.push(make_cycle(make_generator(plank(), 10.0), None, Some(make_bin(plank(), 10))));
        cycles[4].on_sink_full();

        let report = advance_all(&mut cycles, Fixed64::from_num(10)).unwrap();
        assert_eq!(
            report,
            BatchReport {
                inert: 1,
                paused: 1,
                degenerate: 0,
                accumulating: 1,
                produced: 1,
                starved: 1,
                blocked: 0,
            }
        );
    }

    #[test]
    fn batch_reports_degenerate_and_blocked() {
        let mut full_bin = make_bin(plank(), 1);
        full_bin.add_resource(1).unwrap();
        let mut cycles = vec![
            make_cycle(make_generator(plank(), 10.0), None, Some(full_bin)),
            make_cycle(make_generator(plank(), 10.0), None, Some(make_bin(plank(), 10))),
        ];
        cycles[1].set_efficiency(Fixed64::ZERO);

        let report = advance_all(&mut cycles, Fixed64::from_num(10)).unwrap();
        assert_eq!(report.blocked, 1);
        assert_eq!(report.degenerate, 1);
    }

    #[test]
    fn batch_advances_all_cycles_equally() {
        let mut cycles: Vec<_> = (0..32)
            .map(|_| {
                ProductionCycle::attach(
                    Some(make_generator(plank(), 5.0)),
                    None,
                    Some(make_bin(plank(), 100)),
                    CycleConfig::default(),
                )
            })
            .collect::<Vec<crate::cycle::ProductionCycle>>();

        for _ in 0..10 {
            advance_all(&mut cycles, Fixed64::from_num(1)).unwrap();
        }
        assert!(cycles.iter().all(|c| c.output().unwrap().stored() == 2));
    }
}
