// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sitepipe contributors

//! Pipeline definitions and plan expansion
//!
//! A pipeline step names either a task or another pipeline. Expansion
//! inlines included pipelines into a flat task list, after checking the
//! inclusion graph for cycles.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::errors::BuildError;

/// Pipeline definition from sitepipe.yaml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineSpec {
    /// Task or pipeline names, in execution order
    pub steps: Vec<String>,

    /// Start the dev server and watcher once the steps succeed
    #[serde(default)]
    pub serve: bool,

    #[serde(default)]
    pub description: Option<String>,
}

impl PipelineSpec {
    /// Create a pipeline from step names
    pub fn new<I, S>(steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            steps: steps.into_iter().map(Into::into).collect(),
            serve: false,
            description: None,
        }
    }

    /// Mark this pipeline as a development (serving) pipeline
    pub fn serving(mut self) -> Self {
        self.serve = true;
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// A pipeline flattened to the task names the runner executes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    /// Name the plan was requested by
    pub name: String,
    /// Task names in execution order
    pub steps: Vec<String>,
    /// Whether any included pipeline asks for the dev server
    pub serve: bool,
}

impl ExecutionPlan {
    /// Expand the named pipeline
    pub fn expand(
        pipelines: &BTreeMap<String, PipelineSpec>,
        name: &str,
    ) -> Result<Self, BuildError> {
        if !pipelines.contains_key(name) {
            return Err(BuildError::UnknownPipeline {
                name: name.to_string(),
                available: pipelines.keys().cloned().collect::<Vec<_>>().join(", "),
            });
        }

        InclusionGraph::build(pipelines).check_acyclic_from(name)?;

        let mut plan = Self {
            name: name.to_string(),
            steps: Vec::new(),
            serve: false,
        };
        plan.inline(pipelines, name);
        Ok(plan)
    }

    /// Plan that runs tasks and pipelines given on the command line, in order
    pub fn from_names(
        pipelines: &BTreeMap<String, PipelineSpec>,
        names: &[String],
    ) -> Result<Self, BuildError> {
        let mut plan = Self {
            name: names.join(" "),
            steps: Vec::new(),
            serve: false,
        };

        for name in names {
            if pipelines.contains_key(name) {
                let expanded = Self::expand(pipelines, name)?;
                plan.steps.extend(expanded.steps);
                plan.serve |= expanded.serve;
            } else {
                // Resolved against the registry by the runner
                plan.steps.push(name.clone());
            }
        }

        Ok(plan)
    }

    fn inline(&mut self, pipelines: &BTreeMap<String, PipelineSpec>, name: &str) {
        let Some(spec) = pipelines.get(name) else {
            return;
        };

        self.serve |= spec.serve;

        for step in &spec.steps {
            if pipelines.contains_key(step) {
                self.inline(pipelines, step);
            } else {
                self.steps.push(step.clone());
            }
        }
    }
}

/// Graph of pipeline-includes-pipeline edges
struct InclusionGraph {
    graph: DiGraph<String, ()>,
    name_to_index: HashMap<String, NodeIndex>,
}

impl InclusionGraph {
    fn build(pipelines: &BTreeMap<String, PipelineSpec>) -> Self {
        let mut graph = DiGraph::new();
        let mut name_to_index = HashMap::new();

        for name in pipelines.keys() {
            let node = graph.add_node(name.clone());
            name_to_index.insert(name.clone(), node);
        }

        for (name, spec) in pipelines {
            let from = name_to_index[name];
            for step in &spec.steps {
                if let Some(&to) = name_to_index.get(step) {
                    graph.update_edge(from, to, ());
                }
            }
        }

        Self {
            graph,
            name_to_index,
        }
    }

    /// Fail if any cycle is reachable from `start`
    fn check_acyclic_from(&self, start: &str) -> Result<(), BuildError> {
        let Some(&start) = self.name_to_index.get(start) else {
            return Ok(());
        };

        let mut reachable = HashSet::new();
        let mut dfs = Dfs::new(&self.graph, start);
        while let Some(node) = dfs.next(&self.graph) {
            reachable.insert(node);
        }

        for component in tarjan_scc(&self.graph) {
            let cyclic = component.len() > 1 || self.graph.contains_edge(component[0], component[0]);
            if cyclic && component.iter().any(|n| reachable.contains(n)) {
                let mut pipelines: Vec<String> =
                    component.iter().map(|n| self.graph[*n].clone()).collect();
                pipelines.sort();
                pipelines.push(pipelines[0].clone());
                return Err(BuildError::CircularPipeline { pipelines });
            }
        }

        Ok(())
    }
}
