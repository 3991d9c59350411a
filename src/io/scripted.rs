// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Oracle answering from a fixed table, for replays and tests.

use crate::engine::oracle::{BoxOracle, OracleRequest, Refinement};
use crate::util::geometry::{CellKey, Rect};
use futures::future::{FutureExt, LocalBoxFuture};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;

/// A canned answer for one set of bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptedAnswer {
    /// `[x, y, w, h]` of the refined box.
    Moved([i32; 4]),
    Keep,
    Fail(String),
}

/// Oracle keyed by the requested bounds. Unlisted bounds are not refined.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    answers: BTreeMap<CellKey, ScriptedAnswer>,
    requests: RefCell<Vec<OracleRequest>>,
}

impl ScriptedOracle {
    pub fn new(answers: BTreeMap<CellKey, ScriptedAnswer>) -> Self {
        Self {
            answers,
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn with_answer(mut self, bounds: &str, answer: ScriptedAnswer) -> Self {
        self.answers.insert(CellKey::from(bounds), answer);
        self
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<OracleRequest> {
        self.requests.borrow().clone()
    }
}

impl BoxOracle for ScriptedOracle {
    fn locate<'a>(&'a self, request: &'a OracleRequest) -> LocalBoxFuture<'a, Refinement> {
        self.requests.borrow_mut().push(request.clone());
        let refinement = match self.answers.get(&request.bounds) {
            Some(ScriptedAnswer::Moved([x, y, w, h])) => Refinement::Refined(Rect::new(*x, *y, *w, *h)),
            Some(ScriptedAnswer::Fail(reason)) => Refinement::Failed(reason.clone()),
            Some(ScriptedAnswer::Keep) | None => Refinement::Unrefined,
        };
        async move { refinement }.boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn test_answers_from_yaml_table() {
        let yaml = "\"10,10,20,20\": !moved [12, 11, 20, 20]\n\"0,0,5,5\": keep\n\"1,1,5,5\": !fail timeout\n";
        let answers: BTreeMap<CellKey, ScriptedAnswer> = serde_yaml::from_str(yaml).unwrap();
        let oracle = ScriptedOracle::new(answers);

        let ask = |bounds: &str| {
            let request = OracleRequest {
                prev_filename: "a".into(),
                curr_filename: "b".into(),
                bounds: CellKey::from(bounds),
                buffer_size: 15,
            };
            block_on(oracle.locate(&request))
        };
        assert_eq!(ask("10,10,20,20"), Refinement::Refined(Rect::new(12, 11, 20, 20)));
        assert_eq!(ask("0,0,5,5"), Refinement::Unrefined);
        assert_eq!(ask("1,1,5,5"), Refinement::Failed("timeout".into()));
        assert_eq!(ask("9,9,9,9"), Refinement::Unrefined);
        assert_eq!(oracle.requests().len(), 4);
    }
}
