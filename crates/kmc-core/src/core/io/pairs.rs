use super::{LoadError, path_string};
use crate::core::models::topology::Topology;
use crate::core::neighbors::{PairCouplings, PairInput};
use nalgebra::Vector3;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

/// One row of a pair list.
///
/// The displacement columns `dx,dy,dz` are optional as a group; when absent the
/// minimum-image vector between the two site positions is used. Squared couplings
/// `j2_e,j2_h,j2_s` are only read by the Marcus model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PairRecord {
    pub i: usize,
    pub j: usize,
    #[serde(default)]
    pub dx: Option<f64>,
    #[serde(default)]
    pub dy: Option<f64>,
    #[serde(default)]
    pub dz: Option<f64>,
    #[serde(default)]
    pub j2_e: Option<f64>,
    #[serde(default)]
    pub j2_h: Option<f64>,
    #[serde(default)]
    pub j2_s: Option<f64>,
}

pub fn read_pairs<R: Read>(reader: R, path: &Path) -> Result<Vec<PairRecord>, LoadError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    reader
        .deserialize::<PairRecord>()
        .map(|result| {
            result.map_err(|e| LoadError::Csv {
                path: path_string(path),
                source: e,
            })
        })
        .collect()
}

pub fn load_pairs(path: &Path) -> Result<Vec<PairRecord>, LoadError> {
    let file = std::fs::File::open(path).map_err(|e| LoadError::Io {
        path: path_string(path),
        source: e,
    })?;
    read_pairs(std::io::BufReader::new(file), path)
}

/// Turns pair rows into [`PairInput`]s, filling in missing displacements from the topology.
pub fn resolve_pairs(
    records: &[PairRecord],
    topology: &Topology,
    path: &Path,
) -> Result<Vec<PairInput>, LoadError> {
    records
        .iter()
        .enumerate()
        .map(|(row, record)| {
            let invalid = |message: String| LoadError::InvalidRecord {
                path: path_string(path),
                record: row + 1,
                message,
            };
            let dr = match (record.dx, record.dy, record.dz) {
                (Some(x), Some(y), Some(z)) => Vector3::new(x, y, z),
                (None, None, None) => {
                    let (a, b) = match (topology.site(record.i), topology.site(record.j)) {
                        (Some(a), Some(b)) => (a, b),
                        _ => {
                            return Err(invalid(format!(
                                "pair ({}, {}) refers to a site outside the lattice of {} sites",
                                record.i,
                                record.j,
                                topology.site_count()
                            )));
                        }
                    };
                    topology
                        .periodic_box()
                        .minimum_image(&a.position, &b.position)
                }
                _ => {
                    return Err(invalid(
                        "displacement needs all of dx, dy and dz or none of them".to_string(),
                    ));
                }
            };
            Ok(PairInput {
                first: record.i,
                second: record.j,
                dr,
                couplings: PairCouplings {
                    electron: record.j2_e,
                    hole: record.j2_h,
                    singlet: record.j2_s,
                },
            })
        })
        .collect()
}
