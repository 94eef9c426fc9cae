use super::models::ids::SiteId;
use super::models::particle::ParticleType;
use super::models::topology::Topology;
use super::rates::{RateEngine, RateError, TransportModel};
use nalgebra::Vector3;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum NeighborTableError {
    #[error("Pair ({first}, {second}) refers to a site outside the lattice of {site_count} sites")]
    SiteOutOfRange {
        first: SiteId,
        second: SiteId,
        site_count: usize,
    },

    #[error("Pair ({0}, {0}) connects a site to itself")]
    SelfPair(SiteId),

    #[error("Pair ({first}, {second}) is listed more than once in the {range} list")]
    DuplicatePair {
        first: SiteId,
        second: SiteId,
        range: NeighborRange,
    },

    #[error("Pair ({first}, {second}) has no {channel} coupling, required by the Marcus model")]
    MissingCoupling {
        first: SiteId,
        second: SiteId,
        channel: ParticleType,
    },

    #[error(
        "Pair ({first}, {second}) has no {channel} reorganization energy for its molecular species"
    )]
    MissingReorganization {
        first: SiteId,
        second: SiteId,
        channel: ParticleType,
    },

    #[error("Rate for pair ({first} -> {second}) is invalid: {source}")]
    Rate {
        first: SiteId,
        second: SiteId,
        #[source]
        source: RateError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NeighborRange {
    Short,
    Long,
}

impl std::fmt::Display for NeighborRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NeighborRange::Short => f.write_str("short-range"),
            NeighborRange::Long => f.write_str("long-range"),
        }
    }
}

/// Every rate stored on a directed neighbour edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RateChannel {
    ElectronHop = 0,
    HoleHop,
    TripletHop,
    /// Long-range singlet transfer (Förster or Marcus).
    SingletTransfer,
    /// An electron jumping onto a hole.
    ElectronGeneration,
    /// A hole jumping onto an electron.
    HoleGeneration,
    CtFormationViaElectron,
    CtFormationViaHole,
    CtDissociationViaElectron,
    CtDissociationViaHole,
}

impl RateChannel {
    pub const COUNT: usize = 10;

    pub const ALL: [RateChannel; Self::COUNT] = [
        RateChannel::ElectronHop,
        RateChannel::HoleHop,
        RateChannel::TripletHop,
        RateChannel::SingletTransfer,
        RateChannel::ElectronGeneration,
        RateChannel::HoleGeneration,
        RateChannel::CtFormationViaElectron,
        RateChannel::CtFormationViaHole,
        RateChannel::CtDissociationViaElectron,
        RateChannel::CtDissociationViaHole,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            RateChannel::ElectronHop => "electron_hop",
            RateChannel::HoleHop => "hole_hop",
            RateChannel::TripletHop => "triplet_hop",
            RateChannel::SingletTransfer => "singlet_transfer",
            RateChannel::ElectronGeneration => "electron_generation",
            RateChannel::HoleGeneration => "hole_generation",
            RateChannel::CtFormationViaElectron => "ct_formation_electron",
            RateChannel::CtFormationViaHole => "ct_formation_hole",
            RateChannel::CtDissociationViaElectron => "ct_dissociation_electron",
            RateChannel::CtDissociationViaHole => "ct_dissociation_hole",
        }
    }

    /// Plain-hop channel of a mobile single-site particle.
    pub const fn hop_of(kind: ParticleType) -> Option<RateChannel> {
        match kind {
            ParticleType::Electron => Some(RateChannel::ElectronHop),
            ParticleType::Hole => Some(RateChannel::HoleHop),
            ParticleType::Triplet => Some(RateChannel::TripletHop),
            ParticleType::Singlet => Some(RateChannel::SingletTransfer),
            ParticleType::ChargeTransfer => None,
        }
    }

    /// Generation channel of a free carrier meeting its opposite partner.
    pub const fn generation_of(carrier: ParticleType) -> Option<RateChannel> {
        match carrier {
            ParticleType::Electron => Some(RateChannel::ElectronGeneration),
            ParticleType::Hole => Some(RateChannel::HoleGeneration),
            _ => None,
        }
    }
}

/// Squared coupling integrals of a pair (eV²), as read from the pair list.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PairCouplings {
    pub electron: Option<f64>,
    pub hole: Option<f64>,
    pub singlet: Option<f64>,
}

impl PairCouplings {
    fn for_type(&self, kind: ParticleType) -> Option<f64> {
        match kind {
            ParticleType::Electron => self.electron,
            ParticleType::Hole => self.hole,
            ParticleType::Singlet => self.singlet,
            _ => None,
        }
    }
}

/// One undirected pair from an external pair list. `dr` points from `first` to `second`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairInput {
    pub first: SiteId,
    pub second: SiteId,
    pub dr: Vector3<f64>,
    pub couplings: PairCouplings,
}

/// A directed edge `source -> target` with its displacement and all pre-evaluated rates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborRecord {
    pub target: SiteId,
    pub dr: Vector3<f64>,
    pub distance: f64,
    rates: [f64; RateChannel::COUNT],
}

impl NeighborRecord {
    #[inline]
    pub fn rate(&self, channel: RateChannel) -> f64 {
        self.rates[channel as usize]
    }

    #[inline]
    pub fn rates(&self) -> &[f64; RateChannel::COUNT] {
        &self.rates
    }
}

/// Records of all sites for one range, stored back to back; site `i` owns
/// `records[offsets[i]..offsets[i + 1]]`.
#[derive(Debug, Clone, PartialEq, Default)]
struct Adjacency {
    offsets: Vec<usize>,
    records: Vec<NeighborRecord>,
}

impl Adjacency {
    fn from_buckets(buckets: Vec<Vec<NeighborRecord>>) -> Self {
        let mut offsets = Vec::with_capacity(buckets.len() + 1);
        let mut records = Vec::with_capacity(buckets.iter().map(Vec::len).sum());
        offsets.push(0);
        for bucket in buckets {
            records.extend(bucket);
            offsets.push(records.len());
        }
        Self { offsets, records }
    }

    #[inline]
    fn of(&self, site: SiteId) -> &[NeighborRecord] {
        match (self.offsets.get(site), self.offsets.get(site + 1)) {
            (Some(&start), Some(&end)) => &self.records[start..end],
            _ => &[],
        }
    }
}

/// Immutable per-site adjacency with pre-evaluated rates, shared read-only by every run on
/// the same lattice.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborTable {
    site_count: usize,
    short_range: Adjacency,
    long_range: Adjacency,
}

impl NeighborTable {
    pub fn builder<'a>(topology: &'a Topology, rates: &'a RateEngine) -> NeighborTableBuilder<'a> {
        NeighborTableBuilder::new(topology, rates)
    }

    #[inline]
    pub fn site_count(&self) -> usize {
        self.site_count
    }

    #[inline]
    pub fn short_range_neighbors_of(&self, site: SiteId) -> &[NeighborRecord] {
        self.short_range.of(site)
    }

    #[inline]
    pub fn long_range_neighbors_of(&self, site: SiteId) -> &[NeighborRecord] {
        self.long_range.of(site)
    }

    pub fn short_range_record(&self, from: SiteId, to: SiteId) -> Option<&NeighborRecord> {
        self.short_range_neighbors_of(from)
            .iter()
            .find(|r| r.target == to)
    }

    pub fn short_range_len(&self) -> usize {
        self.short_range.records.len()
    }

    pub fn long_range_len(&self) -> usize {
        self.long_range.records.len()
    }
}

/// Collects pair lists and evaluates every rate once.
pub struct NeighborTableBuilder<'a> {
    topology: &'a Topology,
    rates: &'a RateEngine,
    short_range: Vec<Vec<NeighborRecord>>,
    long_range: Vec<Vec<NeighborRecord>>,
    seen: HashSet<(NeighborRange, SiteId, SiteId)>,
}

impl<'a> NeighborTableBuilder<'a> {
    pub fn new(topology: &'a Topology, rates: &'a RateEngine) -> Self {
        let n = topology.site_count();
        Self {
            topology,
            rates,
            short_range: vec![Vec::new(); n],
            long_range: vec![Vec::new(); n],
            seen: HashSet::new(),
        }
    }

    pub fn short_range_pairs<I>(mut self, pairs: I) -> Result<Self, NeighborTableError>
    where
        I: IntoIterator<Item = PairInput>,
    {
        for pair in pairs {
            self.add_pair(NeighborRange::Short, &pair)?;
        }
        Ok(self)
    }

    pub fn long_range_pairs<I>(mut self, pairs: I) -> Result<Self, NeighborTableError>
    where
        I: IntoIterator<Item = PairInput>,
    {
        for pair in pairs {
            self.add_pair(NeighborRange::Long, &pair)?;
        }
        Ok(self)
    }

    pub fn build(self) -> NeighborTable {
        NeighborTable {
            site_count: self.topology.site_count(),
            short_range: Adjacency::from_buckets(self.short_range),
            long_range: Adjacency::from_buckets(self.long_range),
        }
    }

    fn add_pair(&mut self, range: NeighborRange, pair: &PairInput) -> Result<(), NeighborTableError> {
        let (i, j) = (pair.first, pair.second);
        let site_count = self.topology.site_count();
        if i >= site_count || j >= site_count {
            return Err(NeighborTableError::SiteOutOfRange {
                first: i,
                second: j,
                site_count,
            });
        }
        if i == j {
            return Err(NeighborTableError::SelfPair(i));
        }
        let key = (range, i.min(j), i.max(j));
        if !self.seen.insert(key) {
            return Err(NeighborTableError::DuplicatePair {
                first: i,
                second: j,
                range,
            });
        }

        let forward = self.record(range, i, j, pair.dr, &pair.couplings)?;
        let backward = self.record(range, j, i, -pair.dr, &pair.couplings)?;
        let buckets = match range {
            NeighborRange::Short => &mut self.short_range,
            NeighborRange::Long => &mut self.long_range,
        };
        buckets[i].push(forward);
        buckets[j].push(backward);
        Ok(())
    }

    fn record(
        &self,
        range: NeighborRange,
        from: SiteId,
        to: SiteId,
        dr: Vector3<f64>,
        couplings: &PairCouplings,
    ) -> Result<NeighborRecord, NeighborTableError> {
        let wrap = |source| NeighborTableError::Rate {
            first: from,
            second: to,
            source,
        };
        let distance = dr.norm();
        if !distance.is_finite() || distance <= 0.0 {
            return Err(wrap(RateError::NonPositiveDistance(distance)));
        }

        let a = &self.topology.sites()[from].energies;
        let b = &self.topology.sites()[to].energies;
        let mut rates = [0.0; RateChannel::COUNT];
        let mut set = |channel: RateChannel, rate: Result<f64, RateError>| {
            rate.map(|r| rates[channel as usize] = r).map_err(wrap)
        };

        match range {
            NeighborRange::Short => {
                for carrier in [ParticleType::Electron, ParticleType::Hole] {
                    let (hop, generation, formation, dissociation) = match carrier {
                        ParticleType::Electron => (
                            RateChannel::ElectronHop,
                            RateChannel::ElectronGeneration,
                            RateChannel::CtFormationViaElectron,
                            RateChannel::CtDissociationViaElectron,
                        ),
                        _ => (
                            RateChannel::HoleHop,
                            RateChannel::HoleGeneration,
                            RateChannel::CtFormationViaHole,
                            RateChannel::CtDissociationViaHole,
                        ),
                    };
                    let hop_rate = match self.rates.transport_model() {
                        TransportModel::MillerAbrahams => self.rates.hop(a, b, &dr, carrier),
                        TransportModel::Marcus => {
                            self.marcus_rate(from, to, dr.x, couplings, carrier)?
                        }
                    };
                    set(hop, hop_rate)?;
                    set(generation, self.rates.exciton_generation(a, b, &dr, carrier))?;
                    set(formation, self.rates.ct_formation(a, b, &dr, carrier))?;
                    set(dissociation, self.rates.ct_dissociation(a, b, &dr, carrier))?;
                }
                set(
                    RateChannel::TripletHop,
                    self.rates.hop(a, b, &dr, ParticleType::Triplet),
                )?;
            }
            NeighborRange::Long => {
                let transfer = match self.rates.transport_model() {
                    TransportModel::MillerAbrahams => self.rates.forster(a, b, &dr),
                    TransportModel::Marcus => {
                        self.marcus_rate(from, to, dr.x, couplings, ParticleType::Singlet)?
                    }
                };
                set(RateChannel::SingletTransfer, transfer)?;
            }
        }

        Ok(NeighborRecord {
            target: to,
            dr,
            distance,
            rates,
        })
    }

    /// Outer error: missing inputs. Inner result: the evaluated law.
    fn marcus_rate(
        &self,
        from: SiteId,
        to: SiteId,
        dx: f64,
        couplings: &PairCouplings,
        kind: ParticleType,
    ) -> Result<Result<f64, RateError>, NeighborTableError> {
        let jeff2 = couplings
            .for_type(kind)
            .ok_or(NeighborTableError::MissingCoupling {
                first: from,
                second: to,
                channel: kind,
            })?;
        let lambda = self.topology.reorganization(from, to, kind).ok_or(
            NeighborTableError::MissingReorganization {
                first: from,
                second: to,
                channel: kind,
            },
        )?;
        let delta_e = self
            .topology
            .delta_energy(from, to, kind)
            .ok_or(NeighborTableError::Rate {
                first: from,
                second: to,
                source: RateError::UnsupportedType(kind),
            })?;
        Ok(self.rates.marcus(jeff2, lambda, delta_e, dx, kind))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::geometry::PeriodicBox;
    use crate::core::models::ids::SpeciesId;
    use crate::core::models::topology::tests::{energies, reorganization};
    use crate::core::models::topology::{MolecularSpecies, SiteProperties};
    use crate::core::rates::params::tests::sample_parameters;
    use crate::core::rates::RateParameters;
    use nalgebra::Point3;

    const TOLERANCE: f64 = 1e-9;
    const KT: f64 = 0.025;

    /// Sites on a line along x, 1 nm apart, with the given electron energies.
    pub(crate) fn chain_topology(electron_energies: &[f64], species: &[u16]) -> Topology {
        let sites = electron_energies
            .iter()
            .zip(species)
            .enumerate()
            .map(|(i, (&e, &sp))| SiteProperties {
                position: Point3::new(i as f64, 0.0, 0.0),
                energies: energies(e, 0.0, 2.0, 1.5),
                species: SpeciesId(sp),
            })
            .collect();
        let species = vec![
            MolecularSpecies {
                name: "donor".to_string(),
                reorganization: Some(reorganization(0.1, 0.1)),
            },
            MolecularSpecies {
                name: "acceptor".to_string(),
                reorganization: Some(reorganization(0.1, 0.1)),
            },
        ];
        let pbc = PeriodicBox::new(100.0, 100.0, 100.0).unwrap();
        Topology::new(sites, species, pbc, KT, 0.0).unwrap()
    }

    pub(crate) fn pair(first: SiteId, second: SiteId) -> PairInput {
        PairInput {
            first,
            second,
            dr: Vector3::new(second as f64 - first as f64, 0.0, 0.0),
            couplings: PairCouplings::default(),
        }
    }

    pub(crate) fn build_table(
        topology: &Topology,
        params: RateParameters,
        short: Vec<PairInput>,
        long: Vec<PairInput>,
    ) -> Result<NeighborTable, NeighborTableError> {
        let rates = RateEngine::for_topology(params, topology).unwrap();
        Ok(NeighborTable::builder(topology, &rates)
            .short_range_pairs(short)?
            .long_range_pairs(long)?
            .build())
    }

    #[test]
    fn stores_both_directions_with_negated_displacement() {
        let topology = chain_topology(&[0.2, 0.0], &[0, 0]);
        let table = build_table(&topology, sample_parameters(), vec![pair(0, 1)], vec![]).unwrap();

        let forward = table.short_range_record(0, 1).unwrap();
        let backward = table.short_range_record(1, 0).unwrap();
        assert_eq!(forward.dr, -backward.dr);
        assert!((forward.distance - 1.0).abs() < TOLERANCE);
        assert!(forward.rate(RateChannel::ElectronHop) > backward.rate(RateChannel::ElectronHop));
        assert_eq!(table.short_range_len(), 2);
        assert_eq!(table.long_range_len(), 0);
    }

    #[test]
    fn sites_without_pairs_have_empty_neighbor_slices() {
        let topology = chain_topology(&[0.0, 0.0, 0.0], &[0, 0, 0]);
        let table = build_table(&topology, sample_parameters(), vec![pair(0, 1)], vec![]).unwrap();
        assert!(table.short_range_neighbors_of(2).is_empty());
        assert!(table.long_range_neighbors_of(0).is_empty());
        assert!(table.short_range_neighbors_of(99).is_empty());
    }

    #[test]
    fn per_site_records_are_contiguous_in_insertion_order() {
        let topology = chain_topology(&[0.0, 0.0, 0.0], &[0, 0, 0]);
        let table = build_table(
            &topology,
            sample_parameters(),
            vec![pair(0, 1), pair(1, 2)],
            vec![pair(0, 2)],
        )
        .unwrap();
        let targets: Vec<_> = table
            .short_range_neighbors_of(1)
            .iter()
            .map(|r| r.target)
            .collect();
        assert_eq!(targets, vec![0, 2]);
        assert_eq!(table.long_range_neighbors_of(2)[0].target, 0);
        assert!(table.long_range_neighbors_of(2)[0].rate(RateChannel::SingletTransfer) > 0.0);
        assert_eq!(
            table.short_range_neighbors_of(1)[0].rate(RateChannel::SingletTransfer),
            0.0
        );
    }

    #[test]
    fn rejects_zero_distance_pairs() {
        let topology = chain_topology(&[0.0, 0.0], &[0, 0]);
        let mut p = pair(0, 1);
        p.dr = Vector3::zeros();
        let err = build_table(&topology, sample_parameters(), vec![p], vec![]).unwrap_err();
        assert!(matches!(
            err,
            NeighborTableError::Rate {
                source: RateError::NonPositiveDistance(_),
                ..
            }
        ));
    }

    #[test]
    fn rejects_out_of_range_self_and_duplicate_pairs() {
        let topology = chain_topology(&[0.0, 0.0], &[0, 0]);
        let params = sample_parameters();
        assert!(matches!(
            build_table(&topology, params, vec![pair(0, 5)], vec![]),
            Err(NeighborTableError::SiteOutOfRange { .. })
        ));
        assert_eq!(
            build_table(&topology, params, vec![pair(1, 1)], vec![]),
            Err(NeighborTableError::SelfPair(1))
        );
        assert!(matches!(
            build_table(&topology, params, vec![pair(0, 1), pair(1, 0)], vec![]),
            Err(NeighborTableError::DuplicatePair { .. })
        ));
        assert!(build_table(&topology, params, vec![pair(0, 1)], vec![pair(1, 0)]).is_ok());
    }

    #[test]
    fn marcus_model_requires_couplings() {
        let topology = chain_topology(&[0.0, 0.0], &[0, 1]);
        let mut params = sample_parameters();
        params.transport_model = TransportModel::Marcus;
        assert!(matches!(
            build_table(&topology, params, vec![pair(0, 1)], vec![]),
            Err(NeighborTableError::MissingCoupling {
                channel: ParticleType::Electron,
                ..
            })
        ));

        let mut coupled = pair(0, 1);
        coupled.couplings = PairCouplings {
            electron: Some(1e-4),
            hole: Some(1e-4),
            singlet: Some(1e-5),
        };
        let table = build_table(&topology, params, vec![coupled], vec![coupled]).unwrap();
        let record = table.short_range_record(0, 1).unwrap();
        assert!(record.rate(RateChannel::ElectronHop) > 0.0);
        assert!(record.rate(RateChannel::HoleHop) > 0.0);
        assert!(table.long_range_neighbors_of(0)[0].rate(RateChannel::SingletTransfer) > 0.0);
    }

    #[test]
    fn marcus_model_requires_species_reorganization() {
        let mut topology_sites = chain_topology(&[0.0, 0.0], &[0, 0]).sites().to_vec();
        topology_sites[1].species = SpeciesId(0);
        let species = vec![MolecularSpecies {
            name: "bare".to_string(),
            reorganization: None,
        }];
        let pbc = PeriodicBox::new(100.0, 100.0, 100.0).unwrap();
        let topology = Topology::new(topology_sites, species, pbc, KT, 0.0).unwrap();

        let mut params = sample_parameters();
        params.transport_model = TransportModel::Marcus;
        let mut coupled = pair(0, 1);
        coupled.couplings.electron = Some(1e-4);
        assert!(matches!(
            build_table(&topology, params, vec![coupled], vec![]),
            Err(NeighborTableError::MissingReorganization { .. })
        ));
    }
}
