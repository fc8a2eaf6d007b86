//! Build-time merging of sibling processors.
//!
//! Match steps sharing a follow-on processor are merged into one step over
//! the `or` of their matchers; match steps sharing a matcher are merged into
//! one step running all of their follow-ons. The rewrite is a single pass.

use super::Processor;
use crate::error::RuleError;
use crate::matcher::{or, Matcher};
use std::collections::HashMap;

/// Combine processors that all run on the same input
pub fn each(processors: Vec<Processor>) -> Result<Processor, RuleError> {
    let mut flat = Vec::new();
    for processor in processors {
        flatten(processor, &mut flat);
    }

    let mut current = Vec::new();
    let mut matched = Vec::new();
    let mut rest = Vec::new();
    for processor in flat {
        match processor {
            Processor::MatchCurrentNode(matcher, then) => current.push((matcher, *then)),
            Processor::MatchMatchedNode(matcher, then) => matched.push((matcher, *then)),
            other => rest.push(other),
        }
    }

    let mut compacted = compact_matchers(current, Processor::MatchCurrentNode)?;
    compacted.extend(compact_matchers(matched, Processor::MatchMatchedNode)?);
    compacted.extend(rest);

    match compacted.len() {
        0 => Err(RuleError::EmptyPipeline),
        1 => compacted.pop().ok_or(RuleError::EmptyPipeline),
        _ => Ok(Processor::Each(compacted)),
    }
}

/// Inline nested `Each` lists and split match steps over their branches
fn flatten(processor: Processor, out: &mut Vec<Processor>) {
    match processor {
        Processor::Each(list) => list.into_iter().for_each(|p| flatten(p, out)),
        Processor::MatchCurrentNode(matcher, then) => {
            split_match(matcher, *then, Processor::MatchCurrentNode, out)
        }
        Processor::MatchMatchedNode(matcher, then) => {
            split_match(matcher, *then, Processor::MatchMatchedNode, out)
        }
        other => out.push(other),
    }
}

fn split_match(
    matcher: Matcher,
    then: Processor,
    build: fn(Matcher, Box<Processor>) -> Processor,
    out: &mut Vec<Processor>,
) {
    let mut branches = Vec::new();
    flatten(then, &mut branches);
    if branches.len() == 1 {
        if let Some(then) = branches.pop() {
            out.push(build(matcher, Box::new(then)));
        }
        return;
    }
    for branch in branches {
        out.push(build(matcher.clone(), Box::new(branch)));
    }
}

fn compact_matchers(
    steps: Vec<(Matcher, Processor)>,
    build: fn(Matcher, Box<Processor>) -> Processor,
) -> Result<Vec<Processor>, RuleError> {
    // same follow-on: or the matchers
    let mut by_then: Vec<(Processor, Vec<Matcher>)> = Vec::new();
    let mut index: HashMap<Processor, usize> = HashMap::new();
    for (matcher, then) in steps {
        match index.get(&then) {
            Some(&i) => by_then[i].1.push(matcher),
            None => {
                index.insert(then.clone(), by_then.len());
                by_then.push((then, vec![matcher]));
            }
        }
    }

    // same matcher: run every follow-on
    let mut by_matcher: Vec<(Matcher, Vec<Processor>)> = Vec::new();
    let mut index: HashMap<Matcher, usize> = HashMap::new();
    for (then, matchers) in by_then {
        let Some(matcher) = or(matchers.into_iter().map(Some)) else {
            continue;
        };
        match index.get(&matcher) {
            Some(&i) => by_matcher[i].1.push(then),
            None => {
                index.insert(matcher.clone(), by_matcher.len());
                by_matcher.push((matcher, vec![then]));
            }
        }
    }

    by_matcher
        .into_iter()
        .map(|(matcher, mut thens)| {
            let then = if thens.len() == 1 {
                thens.pop().ok_or(RuleError::EmptyPipeline)?
            } else {
                each(thens)?
            };
            Ok(build(matcher, Box::new(then)))
        })
        .collect()
}
