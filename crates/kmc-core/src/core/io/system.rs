use super::LoadError;
use super::pairs::{load_pairs, resolve_pairs};
use super::parameters::PhysicsParameters;
use super::sites::{build_topology, load_sites};
use crate::core::models::topology::Topology;
use crate::core::neighbors::NeighborTable;
use crate::core::rates::RateEngine;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemPaths {
    pub physics: PathBuf,
    pub sites: PathBuf,
    pub short_range_pairs: PathBuf,
    /// Without a long-range list singlets have no transfer channel.
    pub long_range_pairs: Option<PathBuf>,
}

/// Everything a run needs that is shared read-only between runs.
#[derive(Debug, Clone)]
pub struct LoadedSystem {
    pub topology: Topology,
    pub rates: RateEngine,
    pub neighbors: NeighborTable,
}

pub fn load_system(paths: &SystemPaths) -> Result<LoadedSystem, LoadError> {
    let physics = PhysicsParameters::load(&paths.physics)?;
    let site_records = load_sites(&paths.sites)?;
    let topology = build_topology(&site_records, &physics)?;
    let rates = RateEngine::for_topology(physics.rates, &topology)?;

    let short_records = load_pairs(&paths.short_range_pairs)?;
    let short = resolve_pairs(&short_records, &topology, &paths.short_range_pairs)?;
    let long = match &paths.long_range_pairs {
        Some(path) => resolve_pairs(&load_pairs(path)?, &topology, path)?,
        None => Vec::new(),
    };
    debug!(
        short_range = short.len(),
        long_range = long.len(),
        "Evaluating neighbor rates."
    );

    let neighbors = NeighborTable::builder(&topology, &rates)
        .short_range_pairs(short)?
        .long_range_pairs(long)?
        .build();

    info!(
        sites = topology.site_count(),
        species = topology.species().len(),
        short_range_edges = neighbors.short_range_len(),
        long_range_edges = neighbors.long_range_len(),
        model = ?rates.transport_model(),
        "System loaded."
    );

    Ok(LoadedSystem {
        topology,
        rates,
        neighbors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::parameters::tests::PHYSICS_TOML;
    use crate::core::neighbors::RateChannel;
    use tempfile::tempdir;

    #[test]
    fn load_system_builds_table_from_files() {
        let dir = tempdir().unwrap();
        let physics = dir.path().join("physics.toml");
        let sites = dir.path().join("sites.csv");
        let short = dir.path().join("short.csv");
        let long = dir.path().join("long.csv");
        std::fs::write(&physics, PHYSICS_TOML).unwrap();
        std::fs::write(
            &sites,
            "x,y,z,electron,hole,singlet,triplet,species\n\
             0,0,0,-3.0,-5.5,2.0,1.5,donor\n\
             1,0,0,-3.0,-5.5,2.0,1.5,donor\n\
             9,0,0,-3.0,-5.5,2.0,1.5,donor\n",
        )
        .unwrap();
        std::fs::write(&short, "i,j\n0,1\n0,2\n").unwrap();
        std::fs::write(&long, "i,j\n1,2\n").unwrap();

        let system = load_system(&SystemPaths {
            physics,
            sites,
            short_range_pairs: short,
            long_range_pairs: Some(long),
        })
        .unwrap();

        assert_eq!(system.topology.site_count(), 3);
        assert_eq!(system.neighbors.short_range_len(), 4);
        assert_eq!(system.neighbors.long_range_len(), 2);
        let across_boundary = system.neighbors.short_range_record(0, 2).unwrap();
        assert!((across_boundary.dr.x + 1.0).abs() < 1e-12);
        let transfer = system.neighbors.long_range_neighbors_of(2)[0];
        assert_eq!(transfer.target, 1);
        assert!(transfer.rate(RateChannel::SingletTransfer) > 0.0);
    }

    #[test]
    fn load_system_fails_for_missing_pair_file() {
        let dir = tempdir().unwrap();
        let physics = dir.path().join("physics.toml");
        let sites = dir.path().join("sites.csv");
        std::fs::write(&physics, PHYSICS_TOML).unwrap();
        std::fs::write(
            &sites,
            "x,y,z,electron,hole,singlet,triplet,species\n0,0,0,0,0,0,0,donor\n",
        )
        .unwrap();
        let result = load_system(&SystemPaths {
            physics,
            sites,
            short_range_pairs: dir.path().join("missing.csv"),
            long_range_pairs: None,
        });
        assert!(matches!(result, Err(LoadError::Io { .. })));
    }
}
