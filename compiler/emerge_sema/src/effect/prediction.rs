//! Static prediction of whether an effect (a throw, a return) happens.

/// Whether evaluating some code performs an effect.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum SideEffectPrediction {
    Never,
    Possibly,
    Guaranteed,
}

impl SideEffectPrediction {
    /// The prediction for `self` followed by `next`.
    ///
    /// Once guaranteed, later code cannot undo it; a possible effect followed
    /// by a guaranteed one is guaranteed.
    #[must_use]
    pub fn combine_sequential(self, next: SideEffectPrediction) -> SideEffectPrediction {
        use SideEffectPrediction::{Guaranteed, Never, Possibly};
        match (self, next) {
            (Guaranteed, _) | (_, Guaranteed) => Guaranteed,
            (Never, Never) => Never,
            _ => Possibly,
        }
    }

    /// Sequential combination of every prediction, `Never` when empty.
    pub fn reduce_sequential(predictions: impl IntoIterator<Item = SideEffectPrediction>) -> SideEffectPrediction {
        let mut combined = SideEffectPrediction::Never;
        for prediction in predictions {
            combined = combined.combine_sequential(prediction);
            if combined == SideEffectPrediction::Guaranteed {
                break;
            }
        }
        combined
    }

    /// The prediction when exactly one of `self` and `other` runs.
    #[must_use]
    pub fn combine_branch(self, other: SideEffectPrediction) -> SideEffectPrediction {
        use SideEffectPrediction::{Guaranteed, Never, Possibly};
        match (self, other) {
            (Never, Never) => Never,
            (Guaranteed, Guaranteed) => Guaranteed,
            _ => Possibly,
        }
    }
}
