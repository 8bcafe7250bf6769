//! Two-phase global high-frequency dictionary builder.

use crate::config::DictionaryConfig;
use crate::error::Result;
use crate::metadata;
use crate::path::Layout;
use crate::sample;
use crate::variable::VariableKey;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
pub struct Dictionary {
    items: HashSet<String>,
}

impl Dictionary {
    pub fn contains(&self, item: &str) -> bool {
        self.items.contains(item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Pass 1: for every group, for every variable, decide whether the variable's frequent items
/// clear the per-group threshold; an item promoted in enough groups becomes part of the
/// final dictionary.
pub fn build(layout: &Layout, total_chunks: &[usize], config: &DictionaryConfig) -> Result<Dictionary> {
    let num_groups = total_chunks.len();
    let mut group_counts: HashMap<String, usize> = HashMap::new();

    for (group, &chunks) in total_chunks.iter().enumerate() {
        let meta = metadata::load(layout, group, chunks)?;
        let mut variables: Vec<VariableKey> = meta.variable_to_type.keys().copied().collect();
        variables.sort();

        let per_variable: Vec<HashSet<String>> = variables
            .par_iter()
            .map(|&key| frequent_within_group(layout, group, chunks, key, config))
            .collect::<Result<Vec<_>>>()?;

        for frequent in per_variable {
            for item in frequent {
                *group_counts.entry(item).or_insert(0) += 1;
            }
        }
    }

    let items = group_counts
        .into_iter()
        .filter(|(_, groups)| (*groups as f64) / (num_groups.max(1) as f64) > config.group_ratio_threshold)
        .map(|(item, _)| item)
        .collect();

    Ok(Dictionary { items })
}

/// Items that clear `chunk_ratio_threshold` within one variable's sample (and, if configured,
/// the disabled raw-count threshold).
fn frequent_within_group(
    layout: &Layout,
    group: usize,
    total_chunks: usize,
    key: VariableKey,
    config: &DictionaryConfig,
) -> Result<HashSet<String>> {
    let sampled = sample::sample_variable(layout, group, total_chunks, key, config.sample_chunks)?;

    let counters: Vec<HashMap<&str, usize>> = (0..sampled.len())
        .map(|i| {
            let mut counter: HashMap<&str, usize> = HashMap::new();
            if let Some(lines) = sampled.get(&i) {
                for line in lines {
                    *counter.entry(line.as_str()).or_insert(0) += 1;
                }
            }
            counter
        })
        .collect();

    let mut universe: HashSet<&str> = HashSet::new();
    for lines in sampled.values() {
        universe.extend(lines.iter().map(String::as_str));
    }

    let mut frequent = HashSet::new();
    for item in universe {
        let num_chunks = counters.iter().filter(|c| c.contains_key(item)).count();
        let num_times: usize = counters.iter().map(|c| c.get(item).copied().unwrap_or(0)).sum();

        // The numerator is fixed to the *configured* sample width, not the number of chunks
        // actually sampled: a variable present in fewer than `sample_chunks` chunks is
        // penalized rather than judged against a smaller denominator.
        let ratio = (num_chunks as f64) / (config.sample_chunks as f64);
        let passes_count = config.num_threshold.map(|t| num_times > t).unwrap_or(true);
        if ratio > config.chunk_ratio_threshold && passes_count {
            frequent.insert(item.to_owned());
        }
    }
    Ok(frequent)
}
