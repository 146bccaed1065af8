use std::collections::{HashMap, HashSet};

use rand::{Rng, seq::SliceRandom};

use crate::{
    error::{Error, Result},
    pipeline::sources::SourceAggregator,
    types::{ModuleAction, ModuleSource, Track},
};

/// Folds `actions` over `tracks` strictly in declared order.
///
/// Each action consumes the output of the previous one. `catalog` resolves the
/// source ids a filter names; an id missing from it is a validation error.
pub async fn apply_actions<R: Rng + Send>(
    actions: &[ModuleAction],
    tracks: Vec<Track>,
    catalog: &HashMap<&str, &ModuleSource>,
    aggregator: &SourceAggregator<'_>,
    rng: &mut R,
) -> Result<Vec<Track>> {
    let mut current = tracks;
    for action in actions {
        current = match action {
            ModuleAction::Shuffle => shuffle(current, rng),
            ModuleAction::Filter {
                excluded_source_ids,
            } => {
                let excluded_sources = excluded_source_ids
                    .iter()
                    .map(|id| {
                        catalog
                            .get(id.as_str())
                            .map(|source| (*source).clone())
                            .ok_or_else(|| {
                                Error::Validation(format!("filter refers to unknown source {}", id))
                            })
                    })
                    .collect::<Result<Vec<ModuleSource>>>()?;

                let excluded = aggregator.aggregate(&excluded_sources).await;
                exclude(current, &excluded.tracks)
            }
        };
    }
    Ok(current)
}

/// Uniform random permutation (Fisher-Yates).
pub fn shuffle<R: Rng + ?Sized>(mut tracks: Vec<Track>, rng: &mut R) -> Vec<Track> {
    tracks.shuffle(rng);
    tracks
}

/// Drops every track whose id occurs in `excluded`, keeping the order of the rest.
pub fn exclude(tracks: Vec<Track>, excluded: &[Track]) -> Vec<Track> {
    let excluded_ids: HashSet<&str> = excluded.iter().map(|t| t.id.as_str()).collect();
    tracks
        .into_iter()
        .filter(|t| !excluded_ids.contains(t.id.as_str()))
        .collect()
}
