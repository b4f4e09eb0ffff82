//! External decision model handle.
//!
//! The router treats an external model as an opaque action source. A model
//! that is not loaded, or that answers [`ActionType::None`], is skipped and
//! the router falls through to the next decision mode.

use microsociety_types::{ActionType, State};

/// An opaque source of actions, such as a trained policy.
pub trait ExternalModel {
    /// Whether the model can currently answer predictions.
    fn is_loaded(&self) -> bool;

    /// Predict an action for `state`.
    ///
    /// Returning [`ActionType::None`] means "no opinion"; it is never an
    /// error.
    fn predict_action(&self, state: &State) -> ActionType;
}

/// A model that is never loaded.
///
/// Used when no external model is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoModel;

impl ExternalModel for NoModel {
    fn is_loaded(&self) -> bool {
        false
    }

    fn predict_action(&self, _state: &State) -> ActionType {
        ActionType::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_model_never_answers() {
        let model = NoModel;
        assert!(!model.is_loaded());
        assert_eq!(model.predict_action(&State::default()), ActionType::None);
    }
}
