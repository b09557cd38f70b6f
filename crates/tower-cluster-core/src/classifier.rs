//! Response classification.

use crate::criteria::SharedCriterion;
use crate::model::Response;
use crate::result::ResponseVerdict;

/// Turns a response into a verdict using an ordered chain of criteria.
pub trait ResponseClassifier: Send + Sync {
    fn decide(&self, response: &Response, criteria: &[SharedCriterion]) -> ResponseVerdict;
}

/// First-opinion-wins classifier.
///
/// Criteria are consulted in order and the first one returning
/// [`Accept`](ResponseVerdict::Accept) or [`Reject`](ResponseVerdict::Reject)
/// decides. When every criterion abstains the response is accepted, so a
/// client configured without criteria stops after its first attempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultResponseClassifier;

impl ResponseClassifier for DefaultResponseClassifier {
    fn decide(&self, response: &Response, criteria: &[SharedCriterion]) -> ResponseVerdict {
        criteria
            .iter()
            .map(|criterion| criterion.decide(response))
            .find(|verdict| *verdict != ResponseVerdict::DontKnow)
            .unwrap_or(ResponseVerdict::Accept)
    }
}
