use optokmc::core::models::particle::ParticleType;
use optokmc::core::models::topology::Topology;
use optokmc::engine::particles::ParticleArena;
use optokmc::engine::recorder::{PopulationSnapshot, Recorder};
use optokmc::engine::simulation::RunSummary;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub fn particle_paths_file(dir: &Path, run_id: u64) -> PathBuf {
    dir.join(format!("{run_id}_particlePaths.txt"))
}

pub fn state_file(dir: &Path, run_id: u64) -> PathBuf {
    dir.join(format!("{run_id}_state.txt"))
}

pub fn numbers_file(dir: &Path, run_id: u64) -> PathBuf {
    dir.join(format!("{run_id}_numbers.txt"))
}

pub fn occupation_file(dir: &Path, run_id: u64) -> PathBuf {
    dir.join(format!("{run_id}_occupation.csv"))
}

/// Writes one line per snapshot to three plain-text files per run.
///
/// - `<run>_particlePaths.txt`: time, then the site of every particle in creation order
/// - `<run>_state.txt`: time, then `type site` for each live particle, with the electron
///   site appended for CT states
/// - `<run>_numbers.txt`: time, then live counts per type overall and per species
pub struct FileRecorder {
    paths: BufWriter<File>,
    state: BufWriter<File>,
    numbers: BufWriter<File>,
}

impl FileRecorder {
    pub fn create(dir: &Path, run_id: u64, topology: &Topology) -> io::Result<Self> {
        let mut numbers = BufWriter::new(File::create(numbers_file(dir, run_id))?);
        write_numbers_header(&mut numbers, topology)?;
        numbers.flush()?;
        debug!(run_id, dir = %dir.display(), "Created trajectory files.");
        Ok(Self {
            paths: BufWriter::new(File::create(particle_paths_file(dir, run_id))?),
            state: BufWriter::new(File::create(state_file(dir, run_id))?),
            numbers,
        })
    }
}

fn write_numbers_header(out: &mut impl Write, topology: &Topology) -> io::Result<()> {
    write!(out, "#{:>11}", "time")?;
    for kind in ParticleType::ALL {
        write!(out, " {:>5}", kind.as_str())?;
    }
    for species in topology.species() {
        for kind in ParticleType::ALL {
            write!(out, " {}:{}", species.name, kind.as_str())?;
        }
    }
    writeln!(out)
}

impl Recorder for FileRecorder {
    fn record_positions(&mut self, particles: &ParticleArena, time: f64) -> io::Result<()> {
        write!(self.paths, "{time:12.5e}")?;
        for site in particles.sites_by_serial() {
            write!(self.paths, " {site:4}")?;
        }
        writeln!(self.paths)?;
        self.paths.flush()
    }

    fn record_state(&mut self, particles: &ParticleArena, time: f64) -> io::Result<()> {
        write!(self.state, "{time:12.5e}")?;
        for (_, particle) in particles.iter_alive() {
            write!(self.state, "  {} {}", particle.kind().channel(), particle.site())?;
            if let Some(electron) = particle.partner_site() {
                write!(self.state, " {electron}")?;
            }
        }
        writeln!(self.state)?;
        self.state.flush()
    }

    fn record_population_counts(
        &mut self,
        particles: &ParticleArena,
        topology: &Topology,
        time: f64,
    ) -> io::Result<()> {
        let snapshot = PopulationSnapshot::collect(particles, topology);
        write!(self.numbers, "{time:12.5e}")?;
        for count in snapshot.total.iter().chain(snapshot.by_species.iter().flatten()) {
            write!(self.numbers, " {count:5}")?;
        }
        writeln!(self.numbers)?;
        self.numbers.flush()
    }
}

#[derive(Serialize)]
struct OccupationRow {
    site: usize,
    electron_time: f64,
    hole_time: f64,
    triplet_time: f64,
    singlet_time: f64,
    ct_time: f64,
    electron_fraction: f64,
    hole_fraction: f64,
    triplet_fraction: f64,
    singlet_fraction: f64,
    ct_fraction: f64,
}

/// Writes the per-site occupation statistics of a finished run as CSV.
pub fn write_site_occupation(dir: &Path, summary: &RunSummary) -> Result<PathBuf, csv::Error> {
    let path = occupation_file(dir, summary.run_id);
    let mut writer = csv::Writer::from_path(&path)?;
    for occupation in &summary.site_occupation {
        let [electron_time, hole_time, triplet_time, singlet_time, ct_time] = occupation.time;
        let [
            electron_fraction,
            hole_fraction,
            triplet_fraction,
            singlet_fraction,
            ct_fraction,
        ] = occupation.fraction;
        writer.serialize(OccupationRow {
            site: occupation.site,
            electron_time,
            hole_time,
            triplet_time,
            singlet_time,
            ct_time,
            electron_fraction,
            hole_fraction,
            triplet_fraction,
            singlet_fraction,
            ct_fraction,
        })?;
    }
    writer.flush()?;
    Ok(path)
}
