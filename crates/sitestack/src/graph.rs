//! Reference graph of a synthesized template.
//!
//! CloudFormation derives creation order from `Ref`, `Fn::GetAtt`, `Fn::Sub`
//! and `DependsOn`. This module derives the same graph so a template can be
//! checked for dangling references and cycles before it is handed over.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::error::SynthError;
use crate::template::intrinsic::{is_pseudo_parameter, sub_placeholders};
use crate::template::Template;

/// Dependency edges between the resources of one template.
#[derive(Debug, Clone)]
pub struct ResourceGraph {
    /// Logical ids in declaration order.
    ids: Vec<String>,
    /// Logical id -> ids it references, in first-seen order, without duplicates.
    dependencies: HashMap<String, Vec<String>>,
    /// (output id, referenced id) pairs.
    output_refs: Vec<(String, String)>,
}

impl ResourceGraph {
    pub fn from_template(template: &Template) -> Self {
        let mut ids = Vec::new();
        let mut dependencies = HashMap::new();

        for (id, decl) in template.resources() {
            let mut refs = Vec::new();
            collect_references(&decl.properties, &mut refs);
            refs.extend(decl.depends_on.iter().cloned());

            let mut seen = HashSet::new();
            refs.retain(|r| seen.insert(r.clone()));

            ids.push(id.to_string());
            dependencies.insert(id.to_string(), refs);
        }

        let mut output_refs = Vec::new();
        for (id, output) in template.outputs() {
            let mut refs = Vec::new();
            collect_references(&output.value, &mut refs);
            if let Some(export) = &output.export {
                collect_references(&export.name, &mut refs);
            }
            output_refs.extend(refs.into_iter().map(|r| (id.to_string(), r)));
        }

        Self {
            ids,
            dependencies,
            output_refs,
        }
    }

    /// Ids the given resource references directly.
    pub fn dependencies_of(&self, logical_id: &str) -> &[String] {
        self.dependencies
            .get(logical_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether `logical_id` references `target` directly.
    pub fn depends_on(&self, logical_id: &str, target: &str) -> bool {
        self.dependencies_of(logical_id).iter().any(|d| d == target)
    }

    /// Ids that directly reference the given resource.
    pub fn dependents_of(&self, logical_id: &str) -> Vec<&str> {
        self.ids
            .iter()
            .filter(|id| self.depends_on(id, logical_id))
            .map(String::as_str)
            .collect()
    }

    /// Checks that every reference resolves and that the graph is acyclic.
    pub fn validate(&self) -> Result<(), SynthError> {
        let declared: HashSet<&str> = self.ids.iter().map(String::as_str).collect();

        for id in &self.ids {
            for target in self.dependencies_of(id) {
                if !declared.contains(target.as_str()) {
                    return Err(SynthError::DanglingReference {
                        from: id.clone(),
                        target: target.clone(),
                    });
                }
            }
        }

        for (output, target) in &self.output_refs {
            if !declared.contains(target.as_str()) {
                return Err(SynthError::DanglingReference {
                    from: output.clone(),
                    target: target.clone(),
                });
            }
        }

        self.topological_order().map(|_| ())
    }

    /// The order in which the provisioning engine can create the resources.
    ///
    /// Among resources whose dependencies are satisfied, the one declared
    /// first comes first, so the order is deterministic. References to
    /// undeclared ids are ignored here; [`validate`](Self::validate) reports them.
    pub fn topological_order(&self) -> Result<Vec<String>, SynthError> {
        let declared: HashSet<&str> = self.ids.iter().map(String::as_str).collect();
        let mut placed: HashSet<&str> = HashSet::new();
        let mut order = Vec::with_capacity(self.ids.len());

        while order.len() < self.ids.len() {
            let next = self.ids.iter().find(|id| {
                !placed.contains(id.as_str())
                    && self
                        .dependencies_of(id)
                        .iter()
                        .filter(|d| declared.contains(d.as_str()))
                        .all(|d| placed.contains(d.as_str()))
            });

            match next {
                Some(id) => {
                    placed.insert(id.as_str());
                    order.push(id.clone());
                }
                None => return Err(SynthError::CyclicReference(self.find_cycle(&placed))),
            }
        }

        Ok(order)
    }

    /// Walks unplaced resources until one repeats. Every unplaced resource
    /// has at least one unplaced dependency, so the walk always closes.
    fn find_cycle(&self, placed: &HashSet<&str>) -> Vec<String> {
        let declared: HashSet<&str> = self.ids.iter().map(String::as_str).collect();
        let Some(start) = self.ids.iter().find(|id| !placed.contains(id.as_str())) else {
            return Vec::new();
        };

        let mut path: Vec<String> = vec![start.clone()];
        let mut current = start.clone();
        loop {
            let next = self.dependencies_of(&current).iter().find(|d| {
                declared.contains(d.as_str()) && !placed.contains(d.as_str())
            });
            let Some(next) = next else {
                return path;
            };
            if let Some(pos) = path.iter().position(|p| p == next) {
                let mut cycle = path.split_off(pos);
                cycle.push(next.clone());
                return cycle;
            }
            path.push(next.clone());
            current = next.clone();
        }
    }
}

/// Collects logical ids referenced anywhere inside a property value.
fn collect_references(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if map.len() == 1 {
                if let Some(target) = map.get("Ref").and_then(Value::as_str) {
                    if !is_pseudo_parameter(target) {
                        out.push(target.to_string());
                    }
                    return;
                }
                if let Some(get_att) = map.get("Fn::GetAtt") {
                    let target = match get_att {
                        Value::Array(parts) => parts.first().and_then(Value::as_str),
                        Value::String(dotted) => dotted.split('.').next(),
                        _ => None,
                    };
                    if let Some(target) = target {
                        out.push(target.to_string());
                    }
                    return;
                }
                if let Some(sub) = map.get("Fn::Sub") {
                    collect_sub_references(sub, out);
                    return;
                }
            }
            for nested in map.values() {
                collect_references(nested, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_references(item, out);
            }
        }
        _ => {}
    }
}

fn collect_sub_references(sub: &Value, out: &mut Vec<String>) {
    let (template, variables) = match sub {
        Value::String(s) => (s.as_str(), None),
        Value::Array(parts) => match (parts.first(), parts.get(1)) {
            (Some(Value::String(s)), vars) => (s.as_str(), vars.and_then(Value::as_object)),
            _ => return,
        },
        _ => return,
    };

    for name in sub_placeholders(template) {
        let local = variables.is_some_and(|vars| vars.contains_key(&name));
        if !local && !is_pseudo_parameter(&name) {
            out.push(name);
        }
    }

    if let Some(vars) = variables {
        for value in vars.values() {
            collect_references(value, out);
        }
    }
}
